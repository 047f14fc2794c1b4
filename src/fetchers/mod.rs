//! Source fetchers: one per upstream platform.
//!
//! Every fetcher makes one request (plus at most one fallback request),
//! parses the response and maps each upstream item into a normalized record.
//!
//! | Source | Module | Method | Fallback |
//! |--------|--------|--------|----------|
//! | GitHub Trending | [`github`] | HTML scraping | none |
//! | Bilibili popular | [`bilibili`] | JSON API | `data` array when `data.list` is absent |
//! | Weibo hot search | [`weibo`] | JSON API | constructed search URL when `scheme` is absent |
//! | Zhihu hot list | [`zhihu`] | JSON API | billboard page `js-initialData` script |
//! | Pixiv ranking | [`pixiv`] | embedded `__INITIAL_STATE__` | `format=json` API |
//!
//! # Failure policy
//!
//! [`Fetcher::fetch`] never fails. Transport, status, parse and schema errors
//! are logged and the source yields an empty list, so one broken upstream
//! only costs its own section of the digest. Individual malformed items are
//! skipped inside the parsers.

pub mod bilibili;
pub mod github;
pub mod images;
pub mod pixiv;
pub mod weibo;
pub mod zhihu;

use crate::error::FetchError;
use crate::models::SourceKind;
use crate::utils::truncate_for_log;
use rand::rng;
use rand::seq::IndexedRandom;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Browser identities rotated across requests; several upstreams refuse
/// obvious non-browser clients.
pub const USER_AGENTS: [&str; 10] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Mobile/15E148 Safari/604.1",
];

/// Upstream base URLs. Overridden in tests to point at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub github: String,
    pub bilibili: String,
    pub weibo: String,
    pub zhihu: String,
    pub pixiv: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github: github::BASE_URL.to_string(),
            bilibili: bilibili::BASE_URL.to_string(),
            weibo: weibo::BASE_URL.to_string(),
            zhihu: zhihu::BASE_URL.to_string(),
            pixiv: pixiv::BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Every source served from one base URL.
    #[cfg(test)]
    pub fn all(base_url: &str) -> Self {
        Self {
            github: base_url.to_string(),
            bilibili: base_url.to_string(),
            weibo: base_url.to_string(),
            zhihu: base_url.to_string(),
            pixiv: base_url.to_string(),
        }
    }
}

/// A single-source retrieval and normalization unit.
pub trait Fetcher {
    /// The normalized record this source produces.
    type Record;

    fn kind(&self) -> SourceKind;

    /// Maximum number of records to return.
    fn limit(&self) -> usize;

    /// Fetch and normalize, surfacing any failure.
    async fn try_fetch(&self) -> Result<Vec<Self::Record>, FetchError>;

    /// Fetch and normalize, mapping any failure to an empty list.
    ///
    /// The result never holds more than [`Fetcher::limit`] records.
    async fn fetch(&self) -> Vec<Self::Record> {
        let kind = self.kind();
        match self.try_fetch().await {
            Ok(mut records) => {
                records.truncate(self.limit());
                info!(source = %kind, count = records.len(), "Fetched records");
                records
            }
            Err(e) => {
                error!(source = %kind, error = %e, "Fetch failed; source will be empty");
                Vec::new()
            }
        }
    }
}

/// Build the HTTP client shared by all fetchers.
pub fn build_client() -> Result<Client, reqwest::Error> {
    Client::builder().build()
}

pub fn random_user_agent() -> &'static str {
    USER_AGENTS.choose(&mut rng()).copied().unwrap_or(USER_AGENTS[0])
}

/// GET a URL and return the body as text. Non-2xx is an error.
pub(crate) async fn get_text(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<String, FetchError> {
    let mut request = client.get(url).header(USER_AGENT, random_user_agent());
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "Upstream returned non-success status");
        return Err(FetchError::Status {
            status,
            url: url.to_string(),
        });
    }
    let body = response.text().await?;
    debug!(%url, bytes = body.len(), "Fetched body");
    Ok(body)
}

/// GET a URL and parse the body as JSON regardless of its declared content type.
pub(crate) async fn get_json(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
) -> Result<Value, FetchError> {
    let mut all_headers = vec![("Accept", "application/json")];
    all_headers.extend_from_slice(headers);
    let body = get_text(client, url, &all_headers).await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!(
            %url,
            error = %e,
            body_preview = %truncate_for_log(&body, 300),
            "Response is not valid JSON"
        );
        FetchError::Json(e)
    })
}

/// First candidate that resolves to a non-empty string.
///
/// Candidates are JSON pointers (`"/owner/name"`) tried in order. Numbers are
/// accepted and rendered in decimal, since upstream ids drift between both.
pub(crate) fn first_str(item: &Value, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|p| item.pointer(p))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

/// First candidate that resolves to a non-negative integer, from a number or
/// an integer string.
pub(crate) fn first_u64(item: &Value, candidates: &[&str]) -> Option<u64> {
    candidates
        .iter()
        .filter_map(|p| item.pointer(p))
        .find_map(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().replace(',', "").parse().ok(),
            _ => None,
        })
}

/// First candidate that is present and neither null, `0` nor an empty string.
pub(crate) fn first_present<'a>(item: &'a Value, candidates: &[&str]) -> Option<&'a Value> {
    candidates
        .iter()
        .filter_map(|p| item.pointer(p))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            Value::Number(n) => n.as_f64() != Some(0.0),
            _ => true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Broken;

    impl Fetcher for Broken {
        type Record = u32;

        fn kind(&self) -> SourceKind {
            SourceKind::Weibo
        }

        fn limit(&self) -> usize {
            3
        }

        async fn try_fetch(&self) -> Result<Vec<u32>, FetchError> {
            Err(FetchError::schema("boom"))
        }
    }

    struct Plenty;

    impl Fetcher for Plenty {
        type Record = u32;

        fn kind(&self) -> SourceKind {
            SourceKind::Github
        }

        fn limit(&self) -> usize {
            3
        }

        async fn try_fetch(&self) -> Result<Vec<u32>, FetchError> {
            Ok((0..10).collect())
        }
    }

    #[tokio::test]
    async fn test_fetch_maps_errors_to_empty() {
        assert!(Broken.fetch().await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_enforces_limit() {
        assert_eq!(Plenty.fetch().await, vec![0, 1, 2]);
    }

    #[test]
    fn test_first_str_tries_candidates_in_order() {
        let item = json!({"userName": "alice", "user_name": "", "user_id": 42});
        assert_eq!(
            first_str(&item, &["/user_name", "/userName"]),
            Some("alice".to_string())
        );
        assert_eq!(first_str(&item, &["/user_id"]), Some("42".to_string()));
        assert_eq!(first_str(&item, &["/missing"]), None);
    }

    #[test]
    fn test_first_u64_accepts_numbers_and_strings() {
        let item = json!({"a": null, "b": "1,024", "c": 7});
        assert_eq!(first_u64(&item, &["/a", "/b"]), Some(1024));
        assert_eq!(first_u64(&item, &["/c"]), Some(7));
        assert_eq!(first_u64(&item, &["/x"]), None);
    }

    #[test]
    fn test_first_present_skips_zero_and_empty() {
        let item = json!({"raw_hot": 0, "num": "", "alt": 123});
        assert_eq!(
            first_present(&item, &["/raw_hot", "/num", "/alt"]),
            Some(&json!(123))
        );
        assert_eq!(first_present(&item, &["/raw_hot", "/num"]), None);
    }

    #[test]
    fn test_random_user_agent_is_from_list() {
        assert!(USER_AGENTS.contains(&random_user_agent()));
    }
}
