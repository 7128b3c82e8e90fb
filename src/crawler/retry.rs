//! Retry policy layered around a fetcher
//!
//! The coordinator never retries on its own. When retries are configured the
//! fetcher it receives is wrapped in [`RetryingFetcher`], which re-issues a
//! request only for transient failures (timeouts, connection errors, 5xx).

use crate::crawler::fetcher::{Fetch, FetchError, Fetched, ResourceKind};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Fetcher wrapper retrying transient failures with a fixed delay
#[derive(Debug, Clone)]
pub struct RetryingFetcher<F> {
    inner: F,
    retries: u32,
    delay: Duration,
}

impl<F: Fetch> RetryingFetcher<F> {
    /// Wraps `inner`, allowing up to `retries` additional attempts
    pub fn new(inner: F, retries: u32, delay: Duration) -> Self {
        Self {
            inner,
            retries,
            delay,
        }
    }

    #[cfg(test)]
    fn inner(&self) -> &F {
        &self.inner
    }
}

#[async_trait]
impl<F: Fetch> Fetch for RetryingFetcher<F> {
    async fn fetch(&self, url: &Url, kind: ResourceKind) -> Result<Fetched, FetchError> {
        let mut attempt = 0;
        loop {
            match self.inner.fetch(url, kind).await {
                Err(e) if e.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} {} after {} (attempt {}/{})",
                        kind.as_str(),
                        url,
                        e,
                        attempt,
                        self.retries
                    );
                    tokio::time::sleep(self.delay).await;
                }
                result => return result,
            }
        }
    }
}
