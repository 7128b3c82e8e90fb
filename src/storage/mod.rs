//! Storage module for persisting crawl results
//!
//! This module handles both halves of durable output:
//! - Content-addressed blob storage for page text and image bytes
//! - SQLite record persistence for runs, pages and their images
//! - An in-memory record store with the same contract

mod content;
mod memory;
mod schema;
mod sqlite;
mod traits;

pub use content::{sniff_image_extension, ContentKind, ContentRef, FsContentStore};
pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use traits::{ContentStore, RecordStore, StorageError, StorageResult};

use std::path::Path;

/// Opens (or creates) the SQLite record database
pub fn open_records(path: &Path) -> StorageResult<SqliteRecordStore> {
    SqliteRecordStore::new(path)
}

/// One successfully fetched image belonging to a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Absolute URL the image was fetched from
    pub source_url: String,
    /// Handle of the stored image bytes
    pub content_ref: ContentRef,
}

/// One successfully fetched and parsed page
///
/// Built once by the coordinator after every image attempt of the page has
/// settled, then persisted and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub url: String,
    /// Handle of the stored page text
    pub content_ref: ContentRef,
    /// Images in document order; failed images are absent
    pub images: Vec<ImageRecord>,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub seed_url: String,
    pub max_pages: u32,
    pub config_hash: String,
    pub status: RunStatus,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub pages_visited: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
