//! Per-day local cache for ranking images.
//!
//! Images land in `<image_dir>/<YYYY-MM-DD>/<artwork id>.jpg`. A relative
//! `image_dir` is taken relative to the directory holding the HTML page, so the
//! link stored in the record (`<image_dir>/<date>/<id>.jpg`) resolves from the
//! page wherever it is written. A file that already exists with non-zero size
//! is reused without touching the network, so re-running on the same day is
//! idempotent.
//!
//! Downloads are written to `<id>.jpg.part` and renamed into place, so an
//! interrupted write never looks like a cached image.

use super::random_user_agent;
use chrono::NaiveDate;
use reqwest::Client;
use reqwest::header::{REFERER, USER_AGENT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Shown when an image could not be downloaded.
pub const PLACEHOLDER_IMAGE: &str = "/static/placeholder.jpg";

/// Upper bound for a single image download.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ImageCache {
    /// Day directory as linked from the page.
    dir: PathBuf,
    /// Directory the page is written to; relative links resolve against it.
    page_dir: PathBuf,
    referer: String,
    timeout: Duration,
}

impl ImageCache {
    pub fn new(root: &Path, date: NaiveDate, referer: impl Into<String>) -> Self {
        Self {
            dir: root.join(date.format("%Y-%m-%d").to_string()),
            page_dir: PathBuf::new(),
            referer: referer.into(),
            timeout: IMAGE_TIMEOUT,
        }
    }

    /// Place relative cache directories next to a page written in `page_dir`.
    pub fn with_page_dir(mut self, page_dir: &Path) -> Self {
        self.page_dir = page_dir.to_path_buf();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Day directory on disk.
    pub fn dir(&self) -> PathBuf {
        self.page_dir.join(&self.dir)
    }

    /// On-disk location of artwork `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir().join(format!("{id}.jpg"))
    }

    /// Link to artwork `id` as written into the page.
    pub fn link_for(&self, id: &str) -> String {
        self.dir
            .join(format!("{id}.jpg"))
            .to_string_lossy()
            .replace('\\', "/")
    }

    /// Return a page link for artwork `id`, downloading `url` if needed.
    ///
    /// Any failure (no URL, transport error, timeout, non-2xx, write error)
    /// yields the placeholder path instead.
    #[instrument(level = "debug", skip(self, client, url))]
    pub async fn resolve(&self, client: &Client, id: &str, url: &str) -> String {
        let path = self.path_for(id);
        if is_cached(&path).await {
            debug!(path = %path.display(), "Image already cached");
            return self.link_for(id);
        }
        match self.download(client, url, &path).await {
            Ok(()) => {
                info!(path = %path.display(), "Cached image");
                self.link_for(id)
            }
            Err(e) => {
                warn!(%url, error = %e, "Image download failed; using placeholder");
                PLACEHOLDER_IMAGE.to_string()
            }
        }
    }

    async fn download(
        &self,
        client: &Client,
        url: &str,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if url.is_empty() {
            return Err("artwork has no image URL".into());
        }
        fs::create_dir_all(self.dir()).await?;
        let response = client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .header(REFERER, &self.referer)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err("empty image body".into());
        }

        let partial = partial_path(path);
        fs::write(&partial, &bytes).await?;
        if let Err(e) = fs::rename(&partial, path).await {
            let _ = fs::remove_file(&partial).await;
            return Err(e.into());
        }
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn is_cached(path: &Path) -> bool {
    fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    #[test]
    fn test_path_layout() {
        let cache = ImageCache::new(Path::new("images"), date(), "https://www.pixiv.net/");
        assert_eq!(cache.path_for("123"), PathBuf::from("images/2025-05-06/123.jpg"));
        assert_eq!(cache.link_for("123"), "images/2025-05-06/123.jpg");
    }

    #[test]
    fn test_relative_dir_follows_page_dir() {
        let cache = ImageCache::new(Path::new("images"), date(), "https://www.pixiv.net/")
            .with_page_dir(Path::new("public"));
        assert_eq!(cache.path_for("7"), PathBuf::from("public/images/2025-05-06/7.jpg"));
        assert_eq!(cache.link_for("7"), "images/2025-05-06/7.jpg");

        let absolute = ImageCache::new(Path::new("/srv/images"), date(), "")
            .with_page_dir(Path::new("public"));
        assert_eq!(absolute.path_for("7"), PathBuf::from("/srv/images/2025-05-06/7.jpg"));
        assert_eq!(absolute.link_for("7"), "/srv/images/2025-05-06/7.jpg");
    }

    #[tokio::test]
    async fn test_downloads_once_then_reuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/123.jpg"))
            .and(header("referer", "https://www.pixiv.net/"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .expect(1)
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(root.path(), date(), "https://www.pixiv.net/");
        let url = format!("{}/img/123.jpg", server.uri());
        let client = Client::new();

        let first = cache.resolve(&client, "123", &url).await;
        let second = cache.resolve(&client, "123", &url).await;
        assert_eq!(first, cache.path_for("123").display().to_string());
        assert_eq!(first, second);
        assert_eq!(std::fs::read(cache.path_for("123")).unwrap(), vec![0xFF, 0xD8, 0xFF]);
        assert!(!partial_path(&cache.path_for("123")).exists());
    }

    #[tokio::test]
    async fn test_empty_cached_file_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(root.path(), date(), "https://www.pixiv.net/");
        std::fs::create_dir_all(cache.dir()).unwrap();
        std::fs::write(cache.path_for("9"), b"").unwrap();

        let resolved = cache
            .resolve(&Client::new(), "9", &format!("{}/9.jpg", server.uri()))
            .await;
        assert_eq!(resolved, cache.path_for("9").display().to_string());
        assert_eq!(std::fs::read(cache.path_for("9")).unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_leftover_partial_file_is_not_a_cache_hit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/4.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![4, 4, 4, 4]))
            .expect(1)
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(root.path(), date(), "https://www.pixiv.net/");
        std::fs::create_dir_all(cache.dir()).unwrap();
        // A write that died halfway through a previous run.
        std::fs::write(partial_path(&cache.path_for("4")), [4, 4]).unwrap();

        let resolved = cache
            .resolve(&Client::new(), "4", &format!("{}/4.jpg", server.uri()))
            .await;
        assert_eq!(resolved, cache.link_for("4"));
        assert_eq!(std::fs::read(cache.path_for("4")).unwrap(), vec![4, 4, 4, 4]);
        assert!(!partial_path(&cache.path_for("4")).exists());
    }

    #[tokio::test]
    async fn test_failures_use_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(root.path(), date(), "https://www.pixiv.net/");
        let client = Client::new();

        let forbidden = cache
            .resolve(&client, "1", &format!("{}/1.jpg", server.uri()))
            .await;
        assert_eq!(forbidden, PLACEHOLDER_IMAGE);
        assert_eq!(cache.resolve(&client, "2", "").await, PLACEHOLDER_IMAGE);
        assert!(!cache.path_for("1").exists());
    }

    #[tokio::test]
    async fn test_stalled_download_times_out_to_placeholder() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1, 2, 3])
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let root = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(root.path(), date(), "https://www.pixiv.net/")
            .with_timeout(Duration::from_millis(300));
        let url = format!("{}/slow.jpg", server.uri());

        let resolved = tokio::time::timeout(
            Duration::from_secs(10),
            cache.resolve(&Client::new(), "1", &url),
        )
        .await
        .expect("download should give up on its own");
        assert_eq!(resolved, PLACEHOLDER_IMAGE);
        assert!(!cache.path_for("1").exists());
    }

    #[test]
    fn test_default_timeout_is_bounded() {
        let cache = ImageCache::new(Path::new("images"), date(), "");
        assert_eq!(cache.timeout, IMAGE_TIMEOUT);
        assert_eq!(IMAGE_TIMEOUT, Duration::from_secs(10));
    }
}
