//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Request validation
//! - The breadth-first frontier
//! - HTTP fetching with optional retries
//! - HTML parsing for text, images and links
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod request;
mod retry;

pub use coordinator::{Coordinator, CrawlSummary};
pub use fetcher::{build_http_client, Fetch, FetchError, Fetched, HttpFetcher, ResourceKind};
pub use frontier::Frontier;
pub use parser::{parse_page, ExtractedPage};
pub use request::{CrawlRequest, DEFAULT_MAX_PAGES};
pub use retry::RetryingFetcher;

pub use crate::storage::{ImageRecord, PageRecord};

use crate::config::Config;
use crate::storage::{FsContentStore, RecordStore};
use crate::HarvestError;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl with the HTTP fetcher and the on-disk content store
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client (wrapped in the retry policy)
/// 2. Open the content directory
/// 3. Arm the optional crawl timeout
/// 4. Drive the coordinator until the frontier drains, the budget is spent
///    or `cancel` fires
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash recorded with the run
/// * `request` - The validated crawl request
/// * `records` - Record store receiving the run and its pages
/// * `cancel` - Token that stops dispatching new pages
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl finished (possibly cancelled)
/// * `Err(HarvestError)` - Client construction or storage failed
pub async fn run_crawl<R: RecordStore>(
    config: &Config,
    config_hash: &str,
    request: &CrawlRequest,
    records: R,
    cancel: CancellationToken,
) -> Result<CrawlSummary, HarvestError> {
    let fetcher = RetryingFetcher::new(
        HttpFetcher::new(&config.fetcher)?,
        config.fetcher.retries,
        Duration::from_millis(config.fetcher.retry_delay_ms),
    );
    let content = FsContentStore::open(&config.output.content_dir)?;

    let timeout = config.crawler.crawl_timeout_secs.map(|secs| {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("Crawl timeout of {}s reached, cancelling", secs);
            token.cancel();
        })
    });

    let mut coordinator = Coordinator::new(fetcher, content, records, &config.crawler)
        .with_config_hash(config_hash);
    let result = coordinator.run_with_cancel(request, cancel).await;

    if let Some(handle) = timeout {
        handle.abort();
    }

    result
}
