//! # daily_hot
//!
//! Collects today's trending lists from five Chinese-internet and developer
//! platforms and renders them into one static, themed HTML page.
//!
//! ## Sources
//!
//! - GitHub Trending (optionally Chinese-language repositories only)
//! - Bilibili popular videos, site-wide or per region
//! - Weibo hot search
//! - Zhihu hot list, with a billboard-page fallback
//! - Pixiv ranking, with optional local image caching (off by default)
//!
//! ## Usage
//!
//! ```sh
//! daily_hot -c config.yaml -t dark -o public/index.html
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: defaults, then an optional YAML file, then CLI overrides
//! 2. **Fetching**: each enabled source in turn; a failing source yields no records
//! 3. **Rendering**: one section per enabled source, empty ones marked as failed
//! 4. **Output**: the page is written to `output_file`; this is the only fatal step

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetchers;
mod formatters;
mod models;
mod outputs;
mod pipeline;
mod themes;
mod utils;

use cli::Cli;
use config::Config;
use fetchers::{Endpoints, build_client};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("daily_hot starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.output, ?args.theme, "Parsed CLI arguments");

    let base = match &args.config {
        Some(path) => Config::load(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load configuration");
            e
        })?,
        None => Config::default(),
    };
    let config = args.apply(base);
    info!(
        theme = %config.theme,
        output = %config.output_file.display(),
        sources = ?config.enabled_sources().collect::<Vec<_>>(),
        "Configuration ready"
    );

    let client = build_client()?;
    let digest = match pipeline::run(&config, &client, &Endpoints::default()).await {
        Ok(digest) => digest,
        Err(e) => {
            error!(path = %config.output_file.display(), error = %e, "Failed to write digest");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        records = digest.values().map(|d| d.len()).sum::<usize>(),
        "Execution complete"
    );

    Ok(())
}
