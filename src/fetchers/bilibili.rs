//! Bilibili popular-video fetcher.
//!
//! Uses the site-wide popular list, or the per-region ranking when a region
//! id is configured. The two endpoints disagree on shape: the popular list
//! nests items under `data.list`, the older ranking endpoints put the array
//! directly in `data`. Both are accepted.

use super::{Fetcher, first_str, get_json};
use crate::config::BilibiliConfig;
use crate::error::FetchError;
use crate::formatters::{format_duration, format_number_value};
use crate::models::{BilibiliVideo, SourceKind};
use chrono::{DateTime, Local};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, instrument};

pub const BASE_URL: &str = "https://api.bilibili.com";

const NO_TITLE: &str = "无标题";
const UNKNOWN_UPLOADER: &str = "未知UP主";

#[derive(Debug)]
pub struct BilibiliFetcher {
    client: Client,
    config: BilibiliConfig,
    base_url: String,
}

impl BilibiliFetcher {
    pub fn new(client: Client, config: BilibiliConfig, base_url: impl Into<String>) -> Self {
        Self {
            client,
            config,
            base_url: base_url.into(),
        }
    }

    fn list_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.config.region == "all" {
            format!("{base}/x/web-interface/popular")
        } else {
            format!(
                "{base}/x/web-interface/ranking/region?rid={}",
                urlencoding::encode(&self.config.region)
            )
        }
    }
}

impl Fetcher for BilibiliFetcher {
    type Record = BilibiliVideo;

    fn kind(&self) -> SourceKind {
        SourceKind::Bilibili
    }

    fn limit(&self) -> usize {
        self.config.limit
    }

    #[instrument(level = "info", skip_all, fields(region = %self.config.region))]
    async fn try_fetch(&self) -> Result<Vec<BilibiliVideo>, FetchError> {
        let payload = get_json(&self.client, &self.list_url(), &[]).await?;
        parse_videos(&payload, self.config.limit)
    }
}

/// Map a popular/ranking payload into at most `limit` videos.
pub fn parse_videos(payload: &Value, limit: usize) -> Result<Vec<BilibiliVideo>, FetchError> {
    let items = payload
        .pointer("/data/list")
        .and_then(Value::as_array)
        .or_else(|| payload.pointer("/data").and_then(Value::as_array))
        .ok_or_else(|| FetchError::schema("neither data.list nor data is an array"))?;

    let videos: Vec<BilibiliVideo> = items
        .iter()
        .filter_map(video_from_item)
        .take(limit)
        .collect();
    debug!(available = items.len(), kept = videos.len(), "Mapped Bilibili items");
    Ok(videos)
}

fn video_from_item(item: &Value) -> Option<BilibiliVideo> {
    if !item.is_object() {
        return None;
    }

    let url = match first_str(item, &["/bvid"]) {
        Some(bvid) => format!("https://www.bilibili.com/video/{bvid}"),
        None => first_str(item, &["/short_link_v2"]).unwrap_or_else(|| "#".to_string()),
    };
    let up_url = first_str(item, &["/owner/mid"])
        .map(|mid| format!("https://space.bilibili.com/{mid}"))
        .unwrap_or_else(|| "#".to_string());
    let cover = first_str(item, &["/pic"])
        .map(|pic| upgrade_scheme(&pic))
        .unwrap_or_default();

    Some(BilibiliVideo {
        title: first_str(item, &["/title"]).unwrap_or_else(|| NO_TITLE.to_string()),
        url,
        cover,
        up_name: first_str(item, &["/owner/name"]).unwrap_or_else(|| UNKNOWN_UPLOADER.to_string()),
        up_url,
        duration: format_duration(item.get("duration").unwrap_or(&Value::Null)),
        views: format_number_value(item.pointer("/stat/view").unwrap_or(&Value::Null)),
        danmaku: format_number_value(item.pointer("/stat/danmaku").unwrap_or(&Value::Null)),
        published_date: item
            .get("pubdate")
            .and_then(Value::as_i64)
            .and_then(publish_date),
    })
}

fn upgrade_scheme(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Epoch seconds to a local `YYYY-MM-DD`. Zero means "not provided".
fn publish_date(epoch: i64) -> Option<String> {
    if epoch <= 0 {
        return None;
    }
    DateTime::from_timestamp(epoch, 0)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d").to_string())
}
