//! HTML digest rendering.
//!
//! Produces one self-contained page: the theme's CSS variables and the
//! shared stylesheet inline, a header with the title and date, then one
//! section per enabled source in [`SourceKind`] order.
//!
//! A source that is enabled but came back empty still gets its section, with
//! a "failed to load" line in place of the cards. Disabled sources produce
//! nothing, even if the digest happens to hold data for them.
//!
//! All record text goes through `html_escape` before it is interpolated.

use crate::config::Config;
use crate::formatters::format_number;
use crate::models::{
    BilibiliVideo, Digest, GithubProject, PixivArtwork, SourceData, SourceKind, WeiboHot,
    ZhihuQuestion,
};
use crate::themes::{Theme, get_theme};
use crate::utils::today;
use chrono::NaiveDate;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use itertools::Itertools;
use tracing::{debug, instrument};

const STYLESHEET: &str = include_str!("style.css");

/// Box ratio used when an artwork reports no dimensions (16:9).
const DEFAULT_IMAGE_RATIO: f64 = 56.25;

/// Render the digest dated today.
pub fn generate(digest: &Digest, config: &Config) -> String {
    generate_at(digest, config, today())
}

/// Render the digest with an explicit header date.
#[instrument(level = "info", skip_all, fields(theme = %config.theme, %date))]
pub fn generate_at(digest: &Digest, config: &Config, date: NaiveDate) -> String {
    let theme = get_theme(&config.theme);
    let title = text(&config.title);
    let sections = config
        .enabled_sources()
        .map(|kind| render_section(kind, digest.get(&kind), config))
        .join("\n");
    debug!(bytes = sections.len(), "Rendered sections");

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title} - {theme_name}</title>
<style>
{root}
{STYLESHEET}</style>
</head>
<body>
<div class="container">
<header>
<h1>{title}</h1>
<div class="date">{date}</div>
</header>
<main>
{sections}
</main>
<footer>
<p>Generated by daily_hot | Theme: {theme_name}</p>
</footer>
</div>
</body>
</html>
"#,
        theme_name = text(theme.name),
        root = root_block(theme),
        date = date.format("%Y年%m月%d日"),
    )
}

fn root_block(theme: &Theme) -> String {
    let vars = theme
        .vars
        .iter()
        .map(|(name, value)| format!("    --{name}: {value};"))
        .join("\n");
    format!(":root {{\n{vars}\n}}")
}

fn section_heading(kind: SourceKind, config: &Config) -> String {
    match kind {
        SourceKind::Github if config.github.chinese_only => {
            r#"<span class="emoji">💻</span> GitHub 热门项目 (中文)"#.to_string()
        }
        SourceKind::Github => r#"<span class="emoji">💻</span> GitHub 热门项目"#.to_string(),
        SourceKind::Bilibili => r#"<span class="emoji">📺</span> 哔哩哔哩 热门视频"#.to_string(),
        SourceKind::Weibo => r#"<span class="emoji">🔥</span> 微博热搜榜"#.to_string(),
        SourceKind::Zhihu => r#"<span class="emoji">💡</span> 知乎热榜"#.to_string(),
        SourceKind::Pixiv => r#"<span class="emoji">🎨</span> Pixiv 排行榜"#.to_string(),
    }
}

/// Short source name used in the "failed to load" line.
fn display_name(kind: SourceKind) -> &'static str {
    match kind {
        SourceKind::Github => "GitHub",
        SourceKind::Bilibili => "B站",
        SourceKind::Weibo => "微博",
        SourceKind::Zhihu => "知乎",
        SourceKind::Pixiv => "Pixiv",
    }
}

fn render_section(kind: SourceKind, data: Option<&SourceData>, config: &Config) -> String {
    let body = match data.filter(|d| !d.is_empty()) {
        Some(data) => format!("<div class=\"items\">\n{}\n</div>", render_cards(data)),
        None => format!(
            "<p class=\"load-failed\">未能加载{}数据。</p>",
            display_name(kind)
        ),
    };
    format!(
        "<section class=\"section {key}-section\" id=\"{key}\">\n<h2>{heading}</h2>\n{body}\n</section>",
        key = kind.key(),
        heading = section_heading(kind, config),
    )
}

fn render_cards(data: &SourceData) -> String {
    match data {
        SourceData::Github(items) => items.iter().map(github_card).join("\n"),
        SourceData::Bilibili(items) => items.iter().map(bilibili_card).join("\n"),
        SourceData::Weibo(items) => items.iter().map(weibo_card).join("\n"),
        SourceData::Zhihu(items) => items.iter().map(zhihu_card).join("\n"),
        SourceData::Pixiv(items) => items.iter().map(pixiv_card).join("\n"),
    }
}

fn count(n: u64) -> String {
    format_number(i64::try_from(n).unwrap_or(i64::MAX))
}

fn github_card(p: &GithubProject) -> String {
    format!(
        r#"<article class="item github-item">
<h3><a href="{url}" target="_blank" rel="noopener noreferrer">{name}</a></h3>
<p>{description}</p>
<div class="meta">
<span class="language">{language}</span>
<div class="stats"><span>⭐ {stars}</span><span>🍴 {forks}</span></div>
</div>
</article>"#,
        url = attr(&p.url),
        name = text(&p.name),
        description = text(&p.description),
        language = text(&p.language),
        stars = count(p.stars),
        forks = count(p.forks),
    )
}

fn bilibili_card(v: &BilibiliVideo) -> String {
    let published = v
        .published_date
        .as_deref()
        .map(|d| format!("<span>📅 {}</span>", text(d)))
        .unwrap_or_default();
    format!(
        r#"<article class="item bilibili-item">
<a href="{url}" target="_blank" rel="noopener noreferrer" class="bilibili-cover-link"><img src="{cover}" class="bilibili-cover" alt="封面" loading="lazy"></a>
<div class="bilibili-info">
<h3><a href="{url}" target="_blank" rel="noopener noreferrer">{title}</a></h3>
<div class="up-name">👨‍🎨 <a href="{up_url}" target="_blank" rel="noopener noreferrer">{up_name}</a></div>
<div class="bilibili-stats"><span>▶️ {views}</span><span>💬 {danmaku}</span><span>⏱️ {duration}</span>{published}</div>
</div>
</article>"#,
        url = attr(&v.url),
        cover = attr(&v.cover),
        title = text(&v.title),
        up_url = attr(&v.up_url),
        up_name = text(&v.up_name),
        views = text(&v.views),
        danmaku = text(&v.danmaku),
        duration = text(&v.duration),
    )
}

/// Badge class for a hot-search label; unknown labels get no badge.
fn weibo_label_class(label: &str) -> Option<&'static str> {
    match label {
        "爆" => Some("boom"),
        "热" => Some("hot"),
        "新" => Some("new"),
        "沸" => Some("boil"),
        "荐" => Some("recommend"),
        _ => None,
    }
}

fn weibo_card(h: &WeiboHot) -> String {
    let badge = weibo_label_class(&h.label)
        .map(|class| format!(r#"<span class="weibo-label {class}">{}</span>"#, text(&h.label)))
        .unwrap_or_default();
    format!(
        r#"<article class="item weibo-item">
<h3><span class="weibo-rank">{rank}</span><a href="{url}" target="_blank" rel="noopener noreferrer" title="{title_attr}">{title}</a></h3>
<div class="weibo-meta">
<div>{badge}</div>
<div class="weibo-hot">{hot}</div>
</div>
</article>"#,
        rank = h.rank,
        url = attr(&h.url),
        title_attr = attr(&h.title),
        title = text(&h.title),
        hot = text(&h.hot_score),
    )
}

fn zhihu_card(q: &ZhihuQuestion) -> String {
    format!(
        r#"<article class="item zhihu-item">
<h3><a href="{url}" target="_blank" rel="noopener noreferrer" title="{title_attr}">{title}</a></h3>
<div class="zhihu-meta">
<div class="zhihu-stats"><span>💬 {answers} 回答</span><span>👀 {followers} 关注</span></div>
<div class="zhihu-hot">{hot}</div>
</div>
</article>"#,
        url = attr(&q.url),
        title_attr = attr(&q.title),
        title = text(&q.title),
        answers = count(q.answer_count),
        followers = count(q.follower_count),
        hot = text(&q.hot_score),
    )
}

/// Height as a percentage of width, for the image box's `padding-top`.
fn image_ratio(width: u64, height: u64) -> f64 {
    if width == 0 || height == 0 {
        DEFAULT_IMAGE_RATIO
    } else {
        height as f64 / width as f64 * 100.0
    }
}

fn pixiv_card(a: &PixivArtwork) -> String {
    let author = if a.author_url.is_empty() {
        text(&a.author).into_owned()
    } else {
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
            attr(&a.author_url),
            text(&a.author)
        )
    };
    format!(
        r#"<article class="item pixiv-item">
<a href="{url}" target="_blank" rel="noopener noreferrer" class="pixiv-image-link">
<div class="pixiv-image-container" style="padding-top: {ratio:.2}%"><img src="{image}" class="pixiv-image" alt="{title_attr}" loading="lazy"></div>
</a>
<h3 class="pixiv-title"><a href="{url}" target="_blank" rel="noopener noreferrer">{title}</a></h3>
<div class="pixiv-author">🎨 {author}</div>
<div class="pixiv-stats"><span>❤️ {bookmarks}</span><span>{width}×{height}</span></div>
</article>"#,
        url = attr(&a.url),
        ratio = image_ratio(a.width, a.height),
        image = attr(&a.image_url),
        title_attr = attr(&a.title),
        title = text(&a.title),
        bookmarks = count(a.bookmarks),
        width = a.width,
        height = a.height,
    )
}
