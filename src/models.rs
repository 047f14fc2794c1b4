//! Normalized records produced by the fetchers and consumed by the renderer.
//!
//! - [`SourceKind`]: the five upstream platforms, in the order they are run
//! - [`GithubProject`], [`BilibiliVideo`], [`WeiboHot`], [`ZhihuQuestion`],
//!   [`PixivArtwork`]: one display-ready record per upstream item
//! - [`SourceData`]: one source's record list, tagged by kind
//! - [`Digest`]: everything collected in one run
//!
//! Records are plain values. Fields that were missing upstream already hold
//! a readable sentinel, so the renderer never has to deal with absence except
//! for the optional video publish date.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The upstream platforms. Declaration order is run and render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Github,
    Bilibili,
    Weibo,
    Zhihu,
    Pixiv,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Github,
        SourceKind::Bilibili,
        SourceKind::Weibo,
        SourceKind::Zhihu,
        SourceKind::Pixiv,
    ];

    /// Configuration key and CSS class prefix.
    pub fn key(self) -> &'static str {
        match self {
            SourceKind::Github => "github",
            SourceKind::Bilibili => "bilibili",
            SourceKind::Weibo => "weibo",
            SourceKind::Zhihu => "zhihu",
            SourceKind::Pixiv => "pixiv",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A repository from the trending page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubProject {
    /// `owner/repo`, whitespace removed.
    pub name: String,
    pub url: String,
    pub description: String,
    /// Declared language, `"Unknown"` when the row has none.
    pub language: String,
    pub stars: u64,
    pub forks: u64,
}

/// A video from the popularity or per-region ranking list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilibiliVideo {
    pub title: String,
    pub url: String,
    pub cover: String,
    pub up_name: String,
    pub up_url: String,
    /// Already formatted, e.g. `"12:34"`.
    pub duration: String,
    /// Already formatted, e.g. `"123.4万"`.
    pub views: String,
    pub danmaku: String,
    /// Local calendar date of publication, `YYYY-MM-DD`.
    pub published_date: Option<String>,
}

/// One hot-search topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeiboHot {
    pub title: String,
    pub url: String,
    /// 1-based position in the list as returned.
    pub rank: usize,
    pub hot_score: String,
    /// Short upstream tag such as `爆`, `热` or `新`; empty when untagged.
    pub label: String,
}

/// One question from the hot list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZhihuQuestion {
    pub title: String,
    pub url: String,
    pub hot_score: String,
    pub answer_count: u64,
    pub follower_count: u64,
}

/// One ranked illustration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixivArtwork {
    pub title: String,
    pub url: String,
    /// Local cache path, proxy URL, or the placeholder path.
    pub image_url: String,
    pub author: String,
    pub author_url: String,
    pub width: u64,
    pub height: u64,
    pub bookmarks: u64,
}

/// The records fetched for one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "items", rename_all = "lowercase")]
pub enum SourceData {
    Github(Vec<GithubProject>),
    Bilibili(Vec<BilibiliVideo>),
    Weibo(Vec<WeiboHot>),
    Zhihu(Vec<ZhihuQuestion>),
    Pixiv(Vec<PixivArtwork>),
}

impl SourceData {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceData::Github(_) => SourceKind::Github,
            SourceData::Bilibili(_) => SourceKind::Bilibili,
            SourceData::Weibo(_) => SourceKind::Weibo,
            SourceData::Zhihu(_) => SourceKind::Zhihu,
            SourceData::Pixiv(_) => SourceKind::Pixiv,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SourceData::Github(v) => v.len(),
            SourceData::Bilibili(v) => v.len(),
            SourceData::Weibo(v) => v.len(),
            SourceData::Zhihu(v) => v.len(),
            SourceData::Pixiv(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything collected in one run, keyed by source.
pub type Digest = BTreeMap<SourceKind, SourceData>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_order_matches_all() {
        let mut sorted = SourceKind::ALL;
        sorted.sort();
        assert_eq!(sorted, SourceKind::ALL);
    }

    #[test]
    fn test_source_kind_display() {
        assert_eq!(SourceKind::Github.to_string(), "github");
        assert_eq!(SourceKind::Pixiv.to_string(), "pixiv");
    }

    #[test]
    fn test_source_data_kind_and_len() {
        let data = SourceData::Weibo(vec![WeiboHot {
            title: "话题".to_string(),
            url: "https://s.weibo.com/weibo?q=%23x%23".to_string(),
            rank: 1,
            hot_score: "120.0万".to_string(),
            label: "热".to_string(),
        }]);
        assert_eq!(data.kind(), SourceKind::Weibo);
        assert_eq!(data.len(), 1);
        assert!(!data.is_empty());
        assert!(SourceData::Zhihu(vec![]).is_empty());
    }

    #[test]
    fn test_source_data_serialization() {
        let data = SourceData::Github(vec![GithubProject {
            name: "rust-lang/rust".to_string(),
            url: "https://github.com/rust-lang/rust".to_string(),
            description: "Empowering everyone".to_string(),
            language: "Rust".to_string(),
            stars: 100_000,
            forks: 12_000,
        }]);
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains(r#""source":"github""#));
        assert!(json.contains("rust-lang/rust"));
    }

    #[test]
    fn test_source_kind_deserializes_lowercase() {
        let kind: SourceKind = serde_yaml::from_str("bilibili").unwrap();
        assert_eq!(kind, SourceKind::Bilibili);
    }
}
