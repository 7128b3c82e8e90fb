//! Storage traits and error types
//!
//! This module defines the trait interfaces for the content store and the
//! record store, and their shared error type.

use crate::storage::{ContentKind, ContentRef, PageRecord, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
///
/// Every storage error is fatal to the crawl run that hit it.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Write-once, content-addressed blob storage
///
/// Implementations must be idempotent: storing identical bytes twice yields the
/// same [`ContentRef`] and performs at most one physical write.
pub trait ContentStore: Send + Sync {
    /// Stores a payload and returns its content handle
    fn put(&self, bytes: &[u8], kind: ContentKind) -> StorageResult<ContentRef>;

    /// Returns true if the handle already exists in the backing area
    fn contains(&self, content_ref: &ContentRef) -> StorageResult<bool>;
}

/// Durable record persistence for crawl runs and their pages
pub trait RecordStore {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, seed_url: &str, max_pages: u32, config_hash: &str)
        -> StorageResult<i64>;

    /// Marks a run as finished with its final status and page count
    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_visited: u64,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    // ===== Page Management =====

    /// Persists a page together with all of its images
    ///
    /// The page and its images are committed atomically. Returns the durable
    /// identifier assigned to the page.
    fn persist_page(&mut self, run_id: i64, page: &PageRecord) -> StorageResult<i64>;

    /// Gets all pages of a run in persistence order
    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>>;

    // ===== Statistics =====

    /// Counts all persisted pages
    fn count_pages(&self) -> StorageResult<u64>;

    /// Counts all persisted images
    fn count_images(&self) -> StorageResult<u64>;

    /// Counts all recorded runs
    fn count_runs(&self) -> StorageResult<u64>;
}
