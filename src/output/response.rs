//! Serialized response of a crawl invocation

use crate::crawler::CrawlSummary;
use crate::storage::{ImageRecord, PageRecord};
use serde::Serialize;

/// Response body of one successful invocation
///
/// ```json
/// { "scraped_pages": 1, "data": [
///     { "url": "...", "text_file": "<ref>.txt", "images": [ { "url": "...", "filename": "<ref>.png" } ] }
/// ] }
/// ```
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CrawlSummaryResponse {
    pub scraped_pages: usize,
    pub data: Vec<PageEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageEntry {
    pub url: String,
    pub text_file: String,
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageEntry {
    pub url: String,
    pub filename: String,
}

impl From<&ImageRecord> for ImageEntry {
    fn from(image: &ImageRecord) -> Self {
        Self {
            url: image.source_url.clone(),
            filename: image.content_ref.to_string(),
        }
    }
}

impl From<&PageRecord> for PageEntry {
    fn from(page: &PageRecord) -> Self {
        Self {
            url: page.url.clone(),
            text_file: page.content_ref.to_string(),
            images: page.images.iter().map(ImageEntry::from).collect(),
        }
    }
}

impl From<&CrawlSummary> for CrawlSummaryResponse {
    fn from(summary: &CrawlSummary) -> Self {
        Self {
            scraped_pages: summary.pages_visited,
            data: summary.pages.iter().map(PageEntry::from).collect(),
        }
    }
}

/// Body reported when the whole invocation fails
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn scraping_failed(message: impl Into<String>) -> Self {
        Self {
            error: String::from("Scraping failed"),
            message: message.into(),
        }
    }
}
