//! One run: fetch every enabled source in order, render, write.

use crate::config::Config;
use crate::fetchers::bilibili::BilibiliFetcher;
use crate::fetchers::github::GithubFetcher;
use crate::fetchers::pixiv::PixivFetcher;
use crate::fetchers::weibo::WeiboFetcher;
use crate::fetchers::zhihu::ZhihuFetcher;
use crate::fetchers::{Endpoints, Fetcher};
use crate::models::{Digest, SourceData, SourceKind};
use crate::outputs::{html, write_document};
use reqwest::Client;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Fetch every enabled source, one after another, in [`SourceKind`] order.
///
/// Never fails: a broken source contributes an empty list.
#[instrument(level = "info", skip_all)]
pub async fn collect(config: &Config, client: &Client, endpoints: &Endpoints) -> Digest {
    let mut digest = Digest::new();
    for kind in config.enabled_sources() {
        let data = fetch_source(kind, config, client, endpoints).await;
        info!(source = %kind, count = data.len(), "Source collected");
        digest.insert(data.kind(), data);
    }
    digest
}

async fn fetch_source(
    kind: SourceKind,
    config: &Config,
    client: &Client,
    endpoints: &Endpoints,
) -> SourceData {
    match kind {
        SourceKind::Github => SourceData::Github(
            GithubFetcher::new(client.clone(), config.github.clone(), &endpoints.github)
                .fetch()
                .await,
        ),
        SourceKind::Bilibili => SourceData::Bilibili(
            BilibiliFetcher::new(client.clone(), config.bilibili.clone(), &endpoints.bilibili)
                .fetch()
                .await,
        ),
        SourceKind::Weibo => SourceData::Weibo(
            WeiboFetcher::new(client.clone(), config.weibo.clone(), &endpoints.weibo)
                .fetch()
                .await,
        ),
        SourceKind::Zhihu => SourceData::Zhihu(
            ZhihuFetcher::new(client.clone(), config.zhihu.clone(), &endpoints.zhihu)
                .fetch()
                .await,
        ),
        SourceKind::Pixiv => SourceData::Pixiv(
            PixivFetcher::new(client.clone(), config.pixiv.clone(), &endpoints.pixiv)
                .with_page_dir(page_dir(&config.output_file))
                .fetch()
                .await,
        ),
    }
}

/// Directory the page lands in; empty for a bare file name.
fn page_dir(output_file: &Path) -> &Path {
    output_file.parent().unwrap_or(Path::new(""))
}

/// Collect, render and write the digest to `config.output_file`.
///
/// Only the final write can fail the run.
#[instrument(level = "info", skip_all, fields(output = %config.output_file.display()))]
pub async fn run(
    config: &Config,
    client: &Client,
    endpoints: &Endpoints,
) -> Result<Digest, Box<dyn Error>> {
    let digest = collect(config, client, endpoints).await;
    let total: usize = digest.values().map(SourceData::len).sum();
    info!(sources = digest.len(), records = total, "Collection finished");

    let document = html::generate(&digest, config);
    write_document(&document, &config.output_file).await?;
    Ok(digest)
}
