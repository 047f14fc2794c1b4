//! GitHub Trending scraper.
//!
//! Scrapes the daily trending page, optionally restricted to repositories
//! whose spoken language is Chinese. Each `article.Box-row` is one repository.
//!
//! # Star and fork counts
//!
//! The page gives the two counters no distinguishing markup we rely on: both
//! are `a.Link--muted` anchors, stars first and forks second. The counts are
//! read by that position. If GitHub reorders or adds a muted link ahead of
//! them, the numbers will be wrong without any parse error.

use super::{Fetcher, get_text};
use crate::config::GithubConfig;
use crate::error::FetchError;
use crate::models::{GithubProject, SourceKind};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

pub const BASE_URL: &str = "https://github.com";

const NO_DESCRIPTION: &str = "No description";
const UNKNOWN_LANGUAGE: &str = "Unknown";

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("article.Box-row").expect("row selector"));
static NAME: Lazy<Selector> = Lazy::new(|| Selector::parse("h2 a").expect("name selector"));
static DESCRIPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));
static LANGUAGE: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span[itemprop='programmingLanguage']").expect("language selector")
});
static MUTED_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.Link--muted").expect("muted link selector"));

#[derive(Debug)]
pub struct GithubFetcher {
    client: Client,
    config: GithubConfig,
    base_url: String,
}

impl GithubFetcher {
    pub fn new(client: Client, config: GithubConfig, base_url: impl Into<String>) -> Self {
        Self {
            client,
            config,
            base_url: base_url.into(),
        }
    }

    fn trending_url(&self) -> String {
        let mut url = format!("{}/trending?since=daily", self.base_url.trim_end_matches('/'));
        if self.config.chinese_only {
            url.push_str("&spoken_language_code=zh");
        }
        url
    }
}

impl Fetcher for GithubFetcher {
    type Record = GithubProject;

    fn kind(&self) -> SourceKind {
        SourceKind::Github
    }

    fn limit(&self) -> usize {
        self.config.limit
    }

    #[instrument(level = "info", skip_all, fields(chinese_only = self.config.chinese_only))]
    async fn try_fetch(&self) -> Result<Vec<GithubProject>, FetchError> {
        let base = Url::parse(&self.base_url)?;
        let html = get_text(&self.client, &self.trending_url(), &[]).await?;
        Ok(parse_trending(&html, &base, self.config.limit))
    }
}

/// Parse a trending page into at most `limit` projects.
pub fn parse_trending(html: &str, base: &Url, limit: usize) -> Vec<GithubProject> {
    let document = Html::parse_document(html);
    let mut projects = Vec::new();
    for row in document.select(&ROW) {
        if projects.len() >= limit {
            break;
        }
        match parse_row(row, base) {
            Some(project) => {
                debug!(name = %project.name, stars = project.stars, "Parsed trending row");
                projects.push(project);
            }
            None => warn!("Skipping trending row without a repository link"),
        }
    }
    projects
}

fn parse_row(row: ElementRef<'_>, base: &Url) -> Option<GithubProject> {
    let link = row.select(&NAME).next()?;
    let name: String = link.text().flat_map(str::chars).filter(|c| !c.is_whitespace()).collect();
    let url = base.join(link.value().attr("href")?).ok()?.to_string();
    if name.is_empty() {
        return None;
    }

    let description = first_text(row, &DESCRIPTION).unwrap_or_else(|| NO_DESCRIPTION.to_string());
    let language = first_text(row, &LANGUAGE).unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

    // Positional: first muted link is stars, second is forks.
    let mut counters = row.select(&MUTED_LINK).map(|el| parse_count(&text_of(el)));
    let stars = counters.next().flatten().unwrap_or(0);
    let forks = counters.next().flatten().unwrap_or(0);

    Some(GithubProject {
        name,
        url,
        description,
        language,
        stars,
        forks,
    })
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(row: ElementRef<'_>, selector: &Selector) -> Option<String> {
    row.select(selector)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// `"12,345"` -> `12345`.
fn parse_count(text: &str) -> Option<u64> {
    text.trim().replace(',', "").parse().ok()
}
