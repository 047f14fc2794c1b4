//! Zhihu hot-list fetcher.
//!
//! The hot-list API is tried first. When it fails or returns no questions
//! (it is frequently gated behind login), the public billboard page is
//! scraped instead: its `js-initialData` script carries the same list with
//! a different shape, and question ids only appear inside each entry's
//! `cardId` (`"Question-123456"`). The billboard carries no answer or
//! follower counts, so those are 0 on that path.

use super::{Fetcher, first_str, first_u64, get_json, get_text};
use crate::config::ZhihuConfig;
use crate::error::FetchError;
use crate::models::{SourceKind, ZhihuQuestion};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

pub const BASE_URL: &str = "https://www.zhihu.com";

const NO_TITLE: &str = "无标题";
const NO_SCORE: &str = "N/A";
const HEAT_LABEL: &str = "热度";

static INITIAL_DATA: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script#js-initialData").expect("initial data selector"));
static CARD_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"Question-(\d+)").expect("card id regex"));

#[derive(Debug)]
pub struct ZhihuFetcher {
    client: Client,
    config: ZhihuConfig,
    base_url: String,
}

impl ZhihuFetcher {
    pub fn new(client: Client, config: ZhihuConfig, base_url: impl Into<String>) -> Self {
        Self {
            client,
            config,
            base_url: base_url.into(),
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    async fn from_api(&self) -> Result<Vec<ZhihuQuestion>, FetchError> {
        let url = format!("{}/api/v3/feed/topstory/hot-lists/total?limit=50", self.base());
        let payload = get_json(&self.client, &url, &[]).await?;
        Ok(parse_hot_list(&payload, self.config.limit))
    }

    async fn from_billboard(&self) -> Result<Vec<ZhihuQuestion>, FetchError> {
        let url = format!("{}/billboard", self.base());
        let html = get_text(&self.client, &url, &[]).await?;
        parse_billboard(&html, self.config.limit)
    }
}

impl Fetcher for ZhihuFetcher {
    type Record = ZhihuQuestion;

    fn kind(&self) -> SourceKind {
        SourceKind::Zhihu
    }

    fn limit(&self) -> usize {
        self.config.limit
    }

    #[instrument(level = "info", skip_all, fields(category = %self.config.category))]
    async fn try_fetch(&self) -> Result<Vec<ZhihuQuestion>, FetchError> {
        match self.from_api().await {
            Ok(questions) if !questions.is_empty() => return Ok(questions),
            Ok(_) => info!("Hot-list API returned no questions; trying billboard page"),
            Err(e) => warn!(error = %e, "Hot-list API failed; trying billboard page"),
        }
        self.from_billboard().await
    }
}

/// Map the hot-list API payload. A missing `data` array yields no questions.
pub fn parse_hot_list(payload: &Value, limit: usize) -> Vec<ZhihuQuestion> {
    let Some(items) = payload.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|item| item.is_object())
        .take(limit)
        .map(|item| {
            let target = item.get("target").unwrap_or(&Value::Null);
            ZhihuQuestion {
                title: first_str(target, &["/title"]).unwrap_or_else(|| NO_TITLE.to_string()),
                url: first_str(target, &["/id"])
                    .map(|id| question_url(&id))
                    .unwrap_or_else(|| "#".to_string()),
                hot_score: strip_heat_label(
                    item.get("detail_text").and_then(Value::as_str).unwrap_or_default(),
                ),
                answer_count: first_u64(target, &["/answer_count"]).unwrap_or(0),
                follower_count: first_u64(target, &["/follower_count"]).unwrap_or(0),
            }
        })
        .collect()
}

/// Extract the hot list from the billboard page's embedded initial state.
pub fn parse_billboard(html: &str, limit: usize) -> Result<Vec<ZhihuQuestion>, FetchError> {
    let document = Html::parse_document(html);
    let script = document
        .select(&INITIAL_DATA)
        .next()
        .ok_or_else(|| FetchError::schema("billboard page has no js-initialData script"))?;
    let state: Value = serde_json::from_str(&script.text().collect::<String>())?;
    let hot_list = state
        .pointer("/initialState/topstory/hotList")
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::schema("initialState.topstory.hotList missing"))?;

    let questions: Vec<ZhihuQuestion> = hot_list
        .iter()
        .filter_map(|entry| {
            let card_id = entry.get("cardId").and_then(Value::as_str).unwrap_or_default();
            let Some(id) = CARD_ID.captures(card_id).and_then(|c| c.get(1)) else {
                debug!(card_id, "Skipping billboard entry without a question id");
                return None;
            };
            Some(ZhihuQuestion {
                title: first_str(entry, &["/target/titleArea/text"])
                    .unwrap_or_else(|| NO_TITLE.to_string()),
                url: question_url(id.as_str()),
                hot_score: strip_heat_label(
                    entry
                        .pointer("/target/metricsArea/text")
                        .and_then(Value::as_str)
                        .unwrap_or_default(),
                ),
                answer_count: 0,
                follower_count: 0,
            })
        })
        .take(limit)
        .collect();
    debug!(available = hot_list.len(), kept = questions.len(), "Mapped billboard entries");
    Ok(questions)
}

fn question_url(id: &str) -> String {
    format!("https://www.zhihu.com/question/{id}")
}

/// `"1234 万热度"` -> `"1234 万"`; empty becomes `"N/A"`.
fn strip_heat_label(text: &str) -> String {
    let stripped = text.trim().trim_end_matches(HEAT_LABEL).trim();
    if stripped.is_empty() {
        NO_SCORE.to_string()
    } else {
        stripped.to_string()
    }
}
