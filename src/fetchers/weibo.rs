//! Weibo hot-search fetcher.

use super::{Fetcher, first_present, first_str, get_json};
use crate::config::WeiboConfig;
use crate::error::FetchError;
use crate::formatters::{format_number_str, format_number_value};
use crate::models::{SourceKind, WeiboHot};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

pub const BASE_URL: &str = "https://weibo.com";

const NO_TITLE: &str = "无标题";
const NO_SCORE: &str = "N/A";

#[derive(Debug)]
pub struct WeiboFetcher {
    client: Client,
    config: WeiboConfig,
    base_url: String,
}

impl WeiboFetcher {
    pub fn new(client: Client, config: WeiboConfig, base_url: impl Into<String>) -> Self {
        Self {
            client,
            config,
            base_url: base_url.into(),
        }
    }
}

impl Fetcher for WeiboFetcher {
    type Record = WeiboHot;

    fn kind(&self) -> SourceKind {
        SourceKind::Weibo
    }

    fn limit(&self) -> usize {
        self.config.limit
    }

    #[instrument(level = "info", skip_all, fields(category = %self.config.category))]
    async fn try_fetch(&self) -> Result<Vec<WeiboHot>, FetchError> {
        let url = format!("{}/ajax/side/hotSearch", self.base_url.trim_end_matches('/'));
        let payload = get_json(&self.client, &url, &[]).await?;
        parse_hot_search(&payload, &self.config.category, self.config.limit)
    }
}

/// Map a hot-search payload into at most `limit` topics, ranked from 1.
pub fn parse_hot_search(
    payload: &Value,
    category: &str,
    limit: usize,
) -> Result<Vec<WeiboHot>, FetchError> {
    let entries = payload
        .get("data")
        .and_then(|data| data.get(category))
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::schema(format!("data.{category} is not an array")))?;

    let hots: Vec<WeiboHot> = entries
        .iter()
        .filter(|e| e.is_object())
        .take(limit)
        .enumerate()
        .map(|(idx, entry)| hot_from_entry(entry, idx + 1))
        .collect();
    debug!(available = entries.len(), kept = hots.len(), "Mapped hot-search entries");
    Ok(hots)
}

fn hot_from_entry(entry: &Value, rank: usize) -> WeiboHot {
    let title = first_str(entry, &["/word", "/note"]).unwrap_or_else(|| NO_TITLE.to_string());
    let url = first_str(entry, &["/scheme"]).unwrap_or_else(|| search_url(&title));
    WeiboHot {
        url,
        rank,
        hot_score: hot_score(entry),
        label: first_str(entry, &["/label_name"]).unwrap_or_default(),
        title,
    }
}

/// `raw_hot` first, then `num`. Integers are abbreviated; text that already
/// has a magnitude suffix, or is not a number at all, is kept as is.
fn hot_score(entry: &Value) -> String {
    match first_present(entry, &["/raw_hot", "/num"]) {
        Some(Value::String(s)) => format_number_str(s.trim()),
        Some(v @ Value::Number(_)) => format_number_value(v),
        _ => NO_SCORE.to_string(),
    }
}

/// Topic search link: `#word#`, percent-encoded.
fn search_url(word: &str) -> String {
    format!(
        "https://s.weibo.com/weibo?q=%23{}%23",
        urlencoding::encode(word)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_hot_search() {
        let payload = json!({"ok": 1, "data": {"realtime": [
            {"word": "春节档票房", "raw_hot": 1_234_567, "label_name": "爆",
             "scheme": "sinaweibo://searchall?q=%23春节档票房%23"},
            {"word": "新款手机", "raw_hot": 0, "num": 8_888, "label_name": "新"},
            {"word": "某地降温", "num": "12.5万"},
            {"word": "无热度"}
        ]}});
        let hots = parse_hot_search(&payload, "realtime", 10).unwrap();
        assert_eq!(hots.len(), 4);

        assert_eq!(hots[0].rank, 1);
        assert_eq!(hots[0].title, "春节档票房");
        assert_eq!(hots[0].hot_score, "123.5万");
        assert_eq!(hots[0].label, "爆");
        assert!(hots[0].url.starts_with("sinaweibo://"));

        assert_eq!(hots[1].rank, 2);
        assert_eq!(hots[1].hot_score, "8888");
        assert_eq!(
            hots[1].url,
            "https://s.weibo.com/weibo?q=%23%E6%96%B0%E6%AC%BE%E6%89%8B%E6%9C%BA%23"
        );

        assert_eq!(hots[2].hot_score, "12.5万");
        assert_eq!(hots[2].label, "");
        assert_eq!(hots[3].hot_score, "N/A");
    }

    #[test]
    fn test_numeric_string_scores_are_formatted() {
        let payload = json!({"data": {"realtime": [
            {"word": "a", "raw_hot": "654321"},
            {"word": "b", "raw_hot": "沸"}
        ]}});
        let hots = parse_hot_search(&payload, "realtime", 10).unwrap();
        assert_eq!(hots[0].hot_score, "65.4万");
        assert_eq!(hots[1].hot_score, "沸");
    }

    #[test]
    fn test_missing_word_defaults() {
        let payload = json!({"data": {"realtime": [{}]}});
        let hots = parse_hot_search(&payload, "realtime", 10).unwrap();
        assert_eq!(hots[0].title, "无标题");
    }

    #[test]
    fn test_rank_follows_limited_sequence() {
        let entries: Vec<Value> = (0..60).map(|i| json!({"word": format!("t{i}")})).collect();
        let payload = json!({"data": {"realtime": entries}});
        for limit in [1, 5, 12, 50] {
            let hots = parse_hot_search(&payload, "realtime", limit).unwrap();
            assert_eq!(hots.len(), limit);
            assert_eq!(hots.last().unwrap().rank, limit);
        }
    }

    #[test]
    fn test_missing_category_is_an_error() {
        let payload = json!({"data": {"hotgov": {}}});
        assert!(parse_hot_search(&payload, "realtime", 10).is_err());
    }

    #[tokio::test]
    async fn test_fetch_reads_configured_category() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ajax/side/hotSearch"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"realtime": [{"word": "x"}], "hotgovs": [{"word": "gov"}]}
            })))
            .mount(&server)
            .await;

        let config = WeiboConfig {
            limit: 12,
            category: "hotgovs".to_string(),
        };
        let hots = WeiboFetcher::new(Client::new(), config, server.uri()).fetch().await;
        assert_eq!(hots.len(), 1);
        assert_eq!(hots[0].title, "gov");
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty() {
        // Nothing listens on this port.
        let fetcher = WeiboFetcher::new(Client::new(), WeiboConfig::default(), "http://127.0.0.1:9");
        assert!(fetcher.fetch().await.is_empty());
    }
}
