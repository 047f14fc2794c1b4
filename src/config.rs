//! Run configuration.
//!
//! A [`Config`] is built once at startup (defaults, then an optional YAML
//! file, then command-line overrides) and is read-only afterwards. Every
//! section uses `#[serde(default)]`, so a file only needs the keys it changes:
//!
//! ```yaml
//! title: 今日热榜
//! theme: dark
//! sources:
//!   pixiv: true
//! pixiv:
//!   mode: weekly
//!   download_images: true
//! ```

use crate::models::SourceKind;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const DEFAULT_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the HTML document is written.
    pub output_file: PathBuf,
    /// Document title and page heading.
    pub title: String,
    /// Theme name; unknown names fall back to `default` at render time.
    pub theme: String,
    pub sources: SourceToggles,
    pub github: GithubConfig,
    pub bilibili: BilibiliConfig,
    pub weibo: WeiboConfig,
    pub zhihu: ZhihuConfig,
    pub pixiv: PixivConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("daily_news.html"),
            title: "每日热门内容聚合".to_string(),
            theme: "default".to_string(),
            sources: SourceToggles::default(),
            github: GithubConfig::default(),
            bilibili: BilibiliConfig::default(),
            weibo: WeiboConfig::default(),
            zhihu: ZhihuConfig::default(),
            pixiv: PixivConfig::default(),
        }
    }
}

impl Config {
    /// Load a YAML configuration file. Missing keys keep their defaults.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&raw)?;
        info!(theme = %config.theme, output = %config.output_file.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        self.sources.is_enabled(kind)
    }

    pub fn limit(&self, kind: SourceKind) -> usize {
        match kind {
            SourceKind::Github => self.github.limit,
            SourceKind::Bilibili => self.bilibili.limit,
            SourceKind::Weibo => self.weibo.limit,
            SourceKind::Zhihu => self.zhihu.limit,
            SourceKind::Pixiv => self.pixiv.limit,
        }
    }

    /// Sources that will be fetched, in run order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = SourceKind> + '_ {
        SourceKind::ALL.into_iter().filter(|k| self.is_enabled(*k))
    }
}

/// Per-source on/off switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceToggles {
    pub github: bool,
    pub bilibili: bool,
    pub weibo: bool,
    pub zhihu: bool,
    pub pixiv: bool,
}

impl Default for SourceToggles {
    fn default() -> Self {
        Self {
            github: true,
            bilibili: true,
            weibo: true,
            zhihu: true,
            pixiv: false,
        }
    }
}

impl SourceToggles {
    pub fn is_enabled(&self, kind: SourceKind) -> bool {
        match kind {
            SourceKind::Github => self.github,
            SourceKind::Bilibili => self.bilibili,
            SourceKind::Weibo => self.weibo,
            SourceKind::Zhihu => self.zhihu,
            SourceKind::Pixiv => self.pixiv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub limit: usize,
    /// Restrict the trending page to repositories written in Chinese.
    pub chinese_only: bool,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            chinese_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilibiliConfig {
    pub limit: usize,
    /// `"all"` for the site-wide popular list, otherwise a region id.
    pub region: String,
}

impl Default for BilibiliConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            region: "all".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeiboConfig {
    pub limit: usize,
    /// Key of the list under `data` in the hot-search payload.
    pub category: String,
}

impl Default for WeiboConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            category: "realtime".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZhihuConfig {
    pub limit: usize,
    /// Accepted for config compatibility and logged; the hot list has a
    /// single feed, so it selects nothing.
    pub category: String,
}

impl Default for ZhihuConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            category: "hot".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixivConfig {
    pub limit: usize,
    /// Ranking mode passed through to the site (`daily`, `weekly`, `monthly`, ...).
    pub mode: String,
    /// Download each artwork into the local image cache.
    pub download_images: bool,
    /// Root of the image cache; one sub-directory per day.
    pub image_dir: PathBuf,
}

impl Default for PixivConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            mode: "monthly".to_string(),
            download_images: true,
            image_dir: PathBuf::from("images"),
        }
    }
}
