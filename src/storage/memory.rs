//! In-memory record store
//!
//! Keeps the RecordStore contract without a database file. Used when the
//! caller only wants the crawl summary (`--no-db`) and throughout the tests.

use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{PageRecord, RunRecord, RunStatus};
use chrono::Utc;

#[derive(Debug, Clone)]
struct StoredPage {
    id: i64,
    run_id: i64,
    record: PageRecord,
}

/// Record store backed by plain vectors
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    runs: Vec<RunRecord>,
    pages: Vec<StoredPage>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn run_mut(&mut self, run_id: i64) -> StorageResult<&mut RunRecord> {
        self.runs
            .iter_mut()
            .find(|run| run.id == run_id)
            .ok_or(StorageError::RunNotFound(run_id))
    }
}

impl RecordStore for MemoryRecordStore {
    fn create_run(
        &mut self,
        seed_url: &str,
        max_pages: u32,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let id = self.runs.len() as i64 + 1;
        self.runs.push(RunRecord {
            id,
            seed_url: seed_url.to_string(),
            max_pages,
            config_hash: config_hash.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now().to_rfc3339(),
            finished_at: None,
            pages_visited: 0,
        });
        Ok(id)
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_visited: u64,
    ) -> StorageResult<()> {
        let run = self.run_mut(run_id)?;
        run.status = status;
        run.pages_visited = pages_visited;
        run.finished_at = Some(Utc::now().to_rfc3339());
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.runs
            .iter()
            .find(|run| run.id == run_id)
            .cloned()
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn persist_page(&mut self, run_id: i64, page: &PageRecord) -> StorageResult<i64> {
        self.run_mut(run_id)?;

        let id = self.pages.len() as i64 + 1;
        self.pages.push(StoredPage {
            id,
            run_id,
            record: page.clone(),
        });
        Ok(id)
    }

    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>> {
        Ok(self
            .pages
            .iter()
            .filter(|page| page.run_id == run_id)
            .map(|page| page.record.clone())
            .collect())
    }

    fn count_pages(&self) -> StorageResult<u64> {
        Ok(self.pages.len() as u64)
    }

    fn count_images(&self) -> StorageResult<u64> {
        Ok(self.pages.iter().map(|p| p.record.images.len() as u64).sum())
    }

    fn count_runs(&self) -> StorageResult<u64> {
        Ok(self.runs.len() as u64)
    }
}
