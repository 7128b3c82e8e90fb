//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding and draining the frontier
//! - Coordinating fetching, parsing and content storage
//! - Persisting page records and building the crawl summary
//! - Handling cancellation
//!
//! Pages are dispatched in batches popped from the frontier in FIFO order and
//! processed concurrently. Results are applied in pop order, so the set and
//! order of visited pages are the same as a strictly sequential crawl.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Fetch, ResourceKind};
use crate::crawler::frontier::Frontier;
use crate::crawler::parser::parse_page;
use crate::crawler::request::CrawlRequest;
use crate::state::CrawlState;
use crate::storage::{
    ContentKind, ContentStore, ImageRecord, PageRecord, RecordStore, RunStatus, StorageError,
};
use crate::HarvestError;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Terminal output of one crawl run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Record store identifier of the run
    pub run_id: i64,

    /// Number of pages successfully fetched, parsed and persisted
    pub pages_visited: usize,

    /// Page records in visit order
    pub pages: Vec<PageRecord>,

    /// True if the run stopped early because it was cancelled
    pub cancelled: bool,
}

impl CrawlSummary {
    /// Total number of image records across all pages
    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|page| page.images.len()).sum()
    }
}

/// A page that made it through fetch, parse and storage
struct PageVisit {
    record: PageRecord,
    links: Vec<Url>,
}

/// Main crawler coordinator structure
pub struct Coordinator<F, C, R> {
    fetcher: F,
    content: C,
    records: R,
    frontier: Frontier,
    state: CrawlState,
    image_permits: Semaphore,
    max_concurrent_pages: usize,
    config_hash: String,
}

impl<F, C, R> Coordinator<F, C, R>
where
    F: Fetch,
    C: ContentStore,
    R: RecordStore,
{
    /// Creates a new coordinator in the `Idle` state
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher used for pages and images
    /// * `content` - Content-addressed store for page text and image bytes
    /// * `records` - Record store receiving runs and page records
    /// * `config` - Concurrency limits
    pub fn new(fetcher: F, content: C, records: R, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            content,
            records,
            frontier: Frontier::new(),
            state: CrawlState::Idle,
            image_permits: Semaphore::new(config.max_concurrent_images.max(1)),
            max_concurrent_pages: config.max_concurrent_pages.max(1),
            config_hash: String::from("defaults"),
        }
    }

    /// Sets the configuration hash recorded with the run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> CrawlState {
        self.state
    }

    #[cfg(test)]
    fn records(&self) -> &R {
        &self.records
    }

    #[cfg(test)]
    fn content(&self) -> &C {
        &self.content
    }

    /// Runs a crawl to completion
    pub async fn run(&mut self, request: &CrawlRequest) -> Result<CrawlSummary, HarvestError> {
        self.run_with_cancel(request, CancellationToken::new()).await
    }

    /// Runs a crawl that stops dispatching once `cancel` fires
    ///
    /// Cancellation is not an error: the pages gathered so far are returned
    /// with `cancelled` set. Storage failures are fatal and abort the run.
    pub async fn run_with_cancel(
        &mut self,
        request: &CrawlRequest,
        cancel: CancellationToken,
    ) -> Result<CrawlSummary, HarvestError> {
        self.transition(CrawlState::Running)?;

        let run_id =
            self.records
                .create_run(request.seed().as_str(), request.max_pages(), &self.config_hash)?;
        tracing::info!(
            "Starting crawl run {} from {} (max {} pages)",
            run_id,
            request.seed(),
            request.max_pages()
        );

        let mut summary = CrawlSummary {
            run_id,
            pages_visited: 0,
            pages: Vec::new(),
            cancelled: false,
        };

        if let Err(e) = self.crawl(request, &cancel, &mut summary).await {
            tracing::error!("Crawl run {} failed: {}", run_id, e);
            if let Err(mark_err) =
                self.records
                    .complete_run(run_id, RunStatus::Failed, summary.pages.len() as u64)
            {
                tracing::warn!("Failed to mark run {} as failed: {}", run_id, mark_err);
            }
            self.transition(CrawlState::Completed)?;
            return Err(e);
        }

        summary.pages_visited = summary.pages.len();
        summary.cancelled = self.state == CrawlState::Draining;
        let status = if summary.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };
        self.records
            .complete_run(run_id, status, summary.pages_visited as u64)?;
        self.transition(CrawlState::Completed)?;

        tracing::info!(
            "Crawl run {} {}: {} pages, {} images",
            run_id,
            status.to_db_string(),
            summary.pages_visited,
            summary.image_count()
        );

        Ok(summary)
    }

    /// The crawl loop
    ///
    /// Per batch:
    /// 1. Pop up to `max_concurrent_pages` URLs, never exceeding the page budget
    /// 2. Fetch, parse and store every popped page concurrently
    /// 3. In pop order: persist the record, mark visited, offer discovered links
    async fn crawl(
        &mut self,
        request: &CrawlRequest,
        cancel: &CancellationToken,
        summary: &mut CrawlSummary,
    ) -> Result<(), HarvestError> {
        let max_pages = request.max_pages() as usize;
        let mut dispatched = 0usize;

        self.frontier.reset(request.seed());

        loop {
            self.observe_cancel(cancel, dispatched)?;
            if !self.state.can_dispatch() {
                break;
            }

            let budget = max_pages - dispatched;
            if budget == 0 || self.frontier.is_empty() {
                break;
            }

            let batch: Vec<Url> = (0..budget.min(self.max_concurrent_pages))
                .map_while(|_| self.frontier.pop())
                .collect();
            dispatched += batch.len();
            tracing::debug!(
                "Dispatching {} pages ({} of {} budget used, {} pending)",
                batch.len(),
                dispatched,
                max_pages,
                self.frontier.pending_len()
            );

            let outcomes =
                join_all(batch.iter().map(|url| self.process_page(url, cancel))).await;

            for (url, outcome) in batch.iter().zip(outcomes) {
                match outcome? {
                    Some(visit) => {
                        self.records.persist_page(summary.run_id, &visit.record)?;
                        self.frontier.mark_visited(url);

                        let accepted = visit
                            .links
                            .iter()
                            .filter(|link| self.frontier.offer(link))
                            .count();
                        tracing::debug!(
                            "Visited {}: {} images, {} new links of {} found",
                            url,
                            visit.record.images.len(),
                            accepted,
                            visit.links.len()
                        );

                        summary.pages.push(visit.record);
                    }
                    None => self.frontier.mark_visited(url),
                }
            }
        }

        // Cancellation during the last batch still marks the run as cancelled
        self.observe_cancel(cancel, dispatched)?;

        let discarded = self.frontier.discard_pending();
        if discarded > 0 {
            tracing::debug!("Discarding {} pending URLs", discarded);
        }

        Ok(())
    }

    /// Moves a running crawl to `Draining` once `cancel` has fired
    fn observe_cancel(
        &mut self,
        cancel: &CancellationToken,
        dispatched: usize,
    ) -> Result<(), HarvestError> {
        if cancel.is_cancelled() && self.state == CrawlState::Running {
            tracing::info!("Crawl cancelled after {} dispatched pages", dispatched);
            self.transition(CrawlState::Draining)?;
        }
        Ok(())
    }

    /// Processes a single page up to (not including) persistence
    ///
    /// Returns `Ok(None)` if the page could not be fetched; the failure is
    /// logged and absorbed. Storage failures propagate.
    async fn process_page(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<PageVisit>, StorageError> {
        let fetched = match self.fetcher.fetch(url, ResourceKind::Page).await {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Error scraping {}: {}", url, e);
                return Ok(None);
            }
        };

        // Page bodies arrive decoded to UTF-8
        let html = String::from_utf8_lossy(&fetched.bytes);
        let extracted = parse_page(&html, url);

        let content_ref = self.content.put(extracted.text.as_bytes(), ContentKind::Text)?;

        let image_results =
            join_all(extracted.image_urls.iter().map(|src| self.process_image(src, cancel))).await;
        let mut images = Vec::with_capacity(image_results.len());
        for result in image_results {
            if let Some(image) = result? {
                images.push(image);
            }
        }

        Ok(Some(PageVisit {
            record: PageRecord {
                url: url.to_string(),
                content_ref,
                images,
            },
            links: extracted.link_urls,
        }))
    }

    /// Fetches and stores one image
    ///
    /// Returns `Ok(None)` if the image could not be fetched, or was never
    /// requested because the crawl was cancelled; the page keeps going
    /// without it.
    async fn process_image(
        &self,
        src: &Url,
        cancel: &CancellationToken,
    ) -> Result<Option<ImageRecord>, StorageError> {
        // The semaphore is never closed, so a failed acquire only means no limit
        let _permit = self.image_permits.acquire().await.ok();

        if cancel.is_cancelled() {
            tracing::debug!("Skipping image {}: crawl cancelled", src);
            return Ok(None);
        }

        match self.fetcher.fetch(src, ResourceKind::Image).await {
            Ok(fetched) => {
                let content_ref = self.content.put(&fetched.bytes, ContentKind::Image)?;
                Ok(Some(ImageRecord {
                    source_url: src.to_string(),
                    content_ref,
                }))
            }
            Err(e) => {
                tracing::warn!("Error saving image {}: {}", src, e);
                Ok(None)
            }
        }
    }

    fn transition(&mut self, next: CrawlState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Crawl state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
