//! Pixiv ranking fetcher.
//!
//! The ranking page embeds its state as `window.__INITIAL_STATE__ = {...}`
//! inside a script tag. That blob is tried first; when the page does not
//! carry it (or it does not parse), the `format=json` variant of the same
//! ranking URL is used, which lists items under `contents`.
//!
//! Field names differ between the two shapes (`illustId` vs `illust_id`,
//! `userName` vs `user_name`, ...), so every field is read through an ordered
//! list of candidates.
//!
//! The ranking `mode` is passed through as given; the site decides what an
//! unsupported mode returns.

use super::images::ImageCache;
use super::{Fetcher, first_str, first_u64, get_json, get_text};
use crate::config::PixivConfig;
use crate::error::FetchError;
use crate::models::{PixivArtwork, SourceKind};
use crate::utils::today;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

pub const BASE_URL: &str = "https://www.pixiv.net";

const NO_TITLE: &str = "无标题";
const UNKNOWN_AUTHOR: &str = "未知作者";

static INITIAL_STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\})\s*;?\s*</script>")
        .expect("initial state regex")
});

/// One ranking entry before its image has been resolved.
#[derive(Debug, Clone, PartialEq)]
struct RankedItem {
    id: String,
    title: String,
    author: String,
    author_id: Option<String>,
    width: u64,
    height: u64,
    bookmarks: u64,
    /// Original image URL as listed; may be empty.
    source_image: String,
}

impl RankedItem {
    fn from_value(item: &Value) -> Option<Self> {
        let id = first_str(item, &["/illust_id", "/illustId", "/id"])?;
        Some(Self {
            title: first_str(item, &["/title"]).unwrap_or_else(|| NO_TITLE.to_string()),
            author: first_str(item, &["/user_name", "/userName"])
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            author_id: first_str(item, &["/user_id", "/userId"]),
            width: first_u64(item, &["/width"]).unwrap_or(0),
            height: first_u64(item, &["/height"]).unwrap_or(0),
            bookmarks: first_u64(item, &["/bookmarks", "/bookmark_count", "/bookmarkCount"])
                .unwrap_or(0),
            source_image: first_str(item, &["/url"]).unwrap_or_default(),
            id,
        })
    }

    fn into_artwork(self, image_url: String) -> PixivArtwork {
        PixivArtwork {
            url: format!("https://www.pixiv.net/artworks/{}", self.id),
            author_url: self
                .author_id
                .map(|uid| format!("https://www.pixiv.net/users/{uid}"))
                .unwrap_or_default(),
            title: self.title,
            image_url,
            author: self.author,
            width: self.width,
            height: self.height,
            bookmarks: self.bookmarks,
        }
    }
}

#[derive(Debug)]
pub struct PixivFetcher {
    client: Client,
    config: PixivConfig,
    base_url: String,
    /// Directory the page is written to; anchors a relative `image_dir`.
    page_dir: PathBuf,
}

impl PixivFetcher {
    pub fn new(client: Client, config: PixivConfig, base_url: impl Into<String>) -> Self {
        Self {
            client,
            config,
            base_url: base_url.into(),
            page_dir: PathBuf::new(),
        }
    }

    pub fn with_page_dir(mut self, page_dir: &Path) -> Self {
        self.page_dir = page_dir.to_path_buf();
        self
    }

    fn ranking_url(&self) -> String {
        format!(
            "{}/ranking.php?mode={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.mode)
        )
    }

    fn referer(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}

impl Fetcher for PixivFetcher {
    type Record = PixivArtwork;

    fn kind(&self) -> SourceKind {
        SourceKind::Pixiv
    }

    fn limit(&self) -> usize {
        self.config.limit
    }

    #[instrument(level = "info", skip_all, fields(mode = %self.config.mode))]
    async fn try_fetch(&self) -> Result<Vec<PixivArtwork>, FetchError> {
        let referer = self.referer();
        let headers = [("Referer", referer.as_str())];

        let page = get_text(&self.client, &self.ranking_url(), &headers).await?;
        let items = match parse_initial_state(&page) {
            Some(items) => items,
            None => {
                info!("No embedded ranking state; trying JSON ranking");
                let api_url = format!("{}&format=json", self.ranking_url());
                let payload = get_json(&self.client, &api_url, &headers).await?;
                parse_api_contents(&payload)?
            }
        };

        let ranked: Vec<RankedItem> = items
            .iter()
            .filter_map(|item| {
                let parsed = RankedItem::from_value(item);
                if parsed.is_none() {
                    debug!("Skipping ranking entry without an id");
                }
                parsed
            })
            .take(self.config.limit)
            .collect();

        let cache = self
            .config
            .download_images
            .then(|| {
                ImageCache::new(&self.config.image_dir, today(), referer.clone())
                    .with_page_dir(&self.page_dir)
            });

        let artworks = stream::iter(ranked)
            .then(|item| {
                let cache = cache.as_ref();
                async move {
                    let image_url = match cache {
                        Some(cache) => cache.resolve(&self.client, &item.id, &item.source_image).await,
                        None => proxy_image_url(&item.id),
                    };
                    item.into_artwork(image_url)
                }
            })
            .collect::<Vec<_>>()
            .await;
        Ok(artworks)
    }
}

/// Ranking items from the embedded page state, if the page carries it.
fn parse_initial_state(html: &str) -> Option<Vec<Value>> {
    let blob = INITIAL_STATE.captures(html)?.get(1)?.as_str();
    let state: Value = match serde_json::from_str(blob) {
        Ok(state) => state,
        Err(e) => {
            warn!(error = %e, "Embedded ranking state is not valid JSON");
            return None;
        }
    };
    ["/ranking/ranking", "/ranking/ranking/illusts", "/illusts"]
        .iter()
        .filter_map(|p| state.pointer(p).and_then(Value::as_array))
        .find(|items| !items.is_empty())
        .cloned()
}

fn parse_api_contents(payload: &Value) -> Result<Vec<Value>, FetchError> {
    payload
        .get("contents")
        .and_then(Value::as_array)
        .cloned()
        .ok_or_else(|| FetchError::schema("ranking JSON has no contents array"))
}

/// Public mirror used when images are not cached locally.
fn proxy_image_url(id: &str) -> String {
    format!("https://pixiv.cat/{id}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::images::PLACEHOLDER_IMAGE;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_contents(n: usize) -> Value {
        let contents: Vec<Value> = (0..n)
            .map(|i| {
                json!({
                    "illust_id": 1000 + i,
                    "title": format!("作品{i}"),
                    "user_name": "画师",
                    "user_id": 42,
                    "width": 1200,
                    "height": 1800,
                    "bookmark_count": 3456,
                    "url": ""
                })
            })
            .collect();
        json!({ "mode": "monthly", "contents": contents })
    }

    fn state_page() -> String {
        let state = json!({"ranking": {"ranking": [
            {"illustId": "555", "title": "夕焼け", "userName": "someone", "userId": "7",
             "width": 800, "height": 600, "bookmarkCount": 12},
            {"title": "no id"}
        ]}});
        format!("<html><head><script>window.__INITIAL_STATE__ = {state};</script></head><body></body></html>")
    }

    fn config(limit: usize, download: bool, image_dir: &std::path::Path) -> PixivConfig {
        PixivConfig {
            limit,
            mode: "monthly".to_string(),
            download_images: download,
            image_dir: image_dir.to_path_buf(),
        }
    }

    #[test]
    fn test_parse_initial_state() {
        let items = parse_initial_state(&state_page()).unwrap();
        assert_eq!(items.len(), 2);
        let ranked = RankedItem::from_value(&items[0]).unwrap();
        assert_eq!(ranked.id, "555");
        assert_eq!(ranked.author, "someone");
        assert_eq!(ranked.author_id.as_deref(), Some("7"));
        assert_eq!(ranked.bookmarks, 12);
        assert!(RankedItem::from_value(&items[1]).is_none());
    }

    #[test]
    fn test_parse_initial_state_absent_or_broken() {
        assert!(parse_initial_state("<html><body>login</body></html>").is_none());
        assert!(
            parse_initial_state("<script>window.__INITIAL_STATE__ = {oops};</script>").is_none()
        );
    }

    #[test]
    fn test_ranked_item_defaults_and_artwork_links() {
        let ranked = RankedItem::from_value(&json!({"illust_id": 9})).unwrap();
        let artwork = ranked.into_artwork(proxy_image_url("9"));
        assert_eq!(artwork.title, "无标题");
        assert_eq!(artwork.author, "未知作者");
        assert_eq!(artwork.author_url, "");
        assert_eq!(artwork.url, "https://www.pixiv.net/artworks/9");
        assert_eq!(artwork.image_url, "https://pixiv.cat/9.jpg");
        assert_eq!((artwork.width, artwork.height, artwork.bookmarks), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_embedded_state_without_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ranking.php"))
            .and(query_param("mode", "monthly"))
            .respond_with(ResponseTemplate::new(200).set_body_string(state_page()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = PixivFetcher::new(Client::new(), config(12, false, dir.path()), server.uri());
        let artworks = fetcher.fetch().await;
        assert_eq!(artworks.len(), 1);
        assert_eq!(artworks[0].title, "夕焼け");
        assert_eq!(artworks[0].image_url, "https://pixiv.cat/555.jpg");
        assert_eq!(artworks[0].author_url, "https://www.pixiv.net/users/7");
    }

    #[tokio::test]
    async fn test_falls_back_to_json_ranking() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ranking.php"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(api_contents(60)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ranking.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no state</html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        for limit in [1, 5, 12, 50] {
            let fetcher =
                PixivFetcher::new(Client::new(), config(limit, false, dir.path()), server.uri());
            let artworks = fetcher.fetch().await;
            assert_eq!(artworks.len(), limit);
            assert_eq!(artworks[0].bookmarks, 3456);
            assert_eq!(artworks[0].author, "画师");
        }
    }

    #[tokio::test]
    async fn test_download_caches_or_uses_placeholder() {
        let server = MockServer::start().await;
        let state = json!({"ranking": {"ranking": [
            {"illustId": "1", "url": format!("{}/img/1.jpg", server.uri())},
            {"illustId": "2", "url": ""}
        ]}});
        Mock::given(method("GET"))
            .and(path("/ranking.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<script>window.__INITIAL_STATE__={state}</script>"
            )))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/img/1.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7, 7, 7]))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = PixivFetcher::new(Client::new(), config(12, true, dir.path()), server.uri());
        let artworks = fetcher.fetch().await;
        assert_eq!(artworks.len(), 2);

        let expected = dir
            .path()
            .join(today().format("%Y-%m-%d").to_string())
            .join("1.jpg");
        assert_eq!(artworks[0].image_url, expected.display().to_string());
        assert!(expected.exists());
        assert_eq!(artworks[1].image_url, PLACEHOLDER_IMAGE);
    }

    #[tokio::test]
    async fn test_json_fallback_without_contents_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ranking.php"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": true})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ranking.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let fetcher = PixivFetcher::new(Client::new(), config(12, false, dir.path()), server.uri());
        assert!(fetcher.fetch().await.is_empty());
    }
}
