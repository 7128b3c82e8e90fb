//! Statistics generation from the record store
//!
//! This module provides functionality for extracting and displaying the
//! page and image counts shown on the dashboard.

use crate::storage::{RecordStore, StorageResult};

/// Record store statistics summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Total number of persisted pages
    pub total_pages: u64,

    /// Total number of persisted images
    pub total_images: u64,

    /// Number of recorded crawl runs
    pub total_runs: u64,
}

impl CrawlStatistics {
    /// Average number of images per page
    pub fn images_per_page(&self) -> f64 {
        if self.total_pages == 0 {
            0.0
        } else {
            self.total_images as f64 / self.total_pages as f64
        }
    }
}

/// Loads statistics from a record store
///
/// # Arguments
///
/// * `records` - The record store to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query statistics
pub fn load_statistics(records: &dyn RecordStore) -> StorageResult<CrawlStatistics> {
    Ok(CrawlStatistics {
        total_pages: records.count_pages()?,
        total_images: records.count_images()?,
        total_runs: records.count_runs()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Crawl runs: {}", stats.total_runs);
    println!("  Pages scraped: {}", stats.total_pages);
    println!("  Images saved: {}", stats.total_images);
    println!("  Images per page: {:.1}", stats.images_per_page());
}
