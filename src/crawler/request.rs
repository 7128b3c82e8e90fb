//! Validated input of one crawl run

use crate::config::MAX_PAGES_LIMIT;
use crate::url::normalize_url;
use crate::HarvestError;
use url::Url;

/// Page budget used when the caller does not give one
pub const DEFAULT_MAX_PAGES: u32 = 10;

/// Immutable, validated input of one crawl run
///
/// Construction performs every invocation-level check, so holding a
/// `CrawlRequest` means no fetch can fail for input reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    seed: Url,
    max_pages: u32,
}

impl CrawlRequest {
    /// Validates a seed URL and an optional page budget (default 10)
    ///
    /// # Errors
    ///
    /// `HarvestError::InvalidInput` if the seed is not an absolute http(s) URL
    /// or the budget lies outside `[1, 100]`.
    ///
    /// # Example
    ///
    /// ```
    /// use site_harvester::crawler::CrawlRequest;
    ///
    /// let request = CrawlRequest::new("https://example.com/", None).unwrap();
    /// assert_eq!(request.max_pages(), 10);
    /// assert!(CrawlRequest::new("https://example.com/", Some(0)).is_err());
    /// assert!(CrawlRequest::new("not a url", Some(5)).is_err());
    /// ```
    pub fn new(seed: &str, max_pages: Option<i64>) -> Result<Self, HarvestError> {
        Self::with_default(seed, max_pages, DEFAULT_MAX_PAGES)
    }

    /// Like [`CrawlRequest::new`] with a caller-chosen default budget
    pub fn with_default(
        seed: &str,
        max_pages: Option<i64>,
        default_max_pages: u32,
    ) -> Result<Self, HarvestError> {
        let seed = normalize_url(seed)
            .map_err(|e| HarvestError::InvalidInput(format!("seed URL '{}': {}", seed, e)))?;

        let max_pages = max_pages.unwrap_or(i64::from(default_max_pages));
        if !(1..=i64::from(MAX_PAGES_LIMIT)).contains(&max_pages) {
            return Err(HarvestError::InvalidInput(format!(
                "max_pages must be between 1 and {}, got {}",
                MAX_PAGES_LIMIT, max_pages
            )));
        }

        Ok(Self {
            seed,
            max_pages: max_pages as u32,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }
}
