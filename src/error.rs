//! Error types raised inside the source fetchers.
//!
//! Nothing here crosses the [`Fetcher::fetch`](crate::fetchers::Fetcher::fetch)
//! boundary: every variant is logged there and turned into an empty list.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("unexpected response shape: {0}")]
    Schema(String),
}

impl FetchError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }
}
