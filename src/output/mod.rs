//! Output module for crawl results
//!
//! This module handles:
//! - The JSON response returned for one crawl invocation
//! - Record store statistics for the `--stats` dashboard

mod response;
pub mod stats;

pub use response::{CrawlSummaryResponse, ErrorResponse, ImageEntry, PageEntry};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
