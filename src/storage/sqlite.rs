//! SQLite record store implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{ContentRef, ImageRecord, PageRecord, RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite record store backend
pub struct SqliteRecordStore {
    conn: Connection,
}

impl SqliteRecordStore {
    /// Opens (or creates) the database at `path` and initializes its schema
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn images_for_page(&self, page_id: i64) -> StorageResult<Vec<ImageRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT url, filename FROM images WHERE page_id = ?1 ORDER BY position")?;

        let images = stmt
            .query_map(params![page_id], |row| {
                Ok(ImageRecord {
                    source_url: row.get(0)?,
                    content_ref: ContentRef::from_stored(row.get::<_, String>(1)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(images)
    }

    fn count(&self, table: &str) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                    row.get(0)
                })?;
        Ok(count as u64)
    }
}

impl RecordStore for SqliteRecordStore {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        seed_url: &str,
        max_pages: u32,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (seed_url, max_pages, config_hash, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                seed_url,
                max_pages,
                config_hash,
                RunStatus::Running.to_db_string(),
                now
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        pages_visited: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_visited = ?3 WHERE id = ?4",
            params![status.to_db_string(), now, pages_visited as i64, run_id],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let run = self
            .conn
            .query_row(
                "SELECT id, seed_url, max_pages, config_hash, status, started_at, finished_at,
                 pages_visited FROM runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        RunRecord {
                            id: row.get(0)?,
                            seed_url: row.get(1)?,
                            max_pages: row.get(2)?,
                            config_hash: row.get(3)?,
                            status: RunStatus::Running,
                            started_at: row.get(5)?,
                            finished_at: row.get(6)?,
                            pages_visited: row.get::<_, i64>(7)? as u64,
                        },
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let (mut run, status) = run.ok_or(StorageError::RunNotFound(run_id))?;
        run.status = RunStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Corrupt(format!("unknown run status '{}'", status)))?;

        Ok(run)
    }

    // ===== Page Management =====

    fn persist_page(&mut self, run_id: i64, page: &PageRecord) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO pages (run_id, url, text_file, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![run_id, page.url, page.content_ref.as_str(), now],
        )?;
        let page_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO images (page_id, position, url, filename) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, image) in page.images.iter().enumerate() {
                stmt.execute(params![
                    page_id,
                    position as i64,
                    image.source_url,
                    image.content_ref.as_str()
                ])?;
            }
        }

        tx.commit()?;
        Ok(page_id)
    }

    fn pages_for_run(&self, run_id: i64) -> StorageResult<Vec<PageRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, url, text_file FROM pages WHERE run_id = ?1 ORDER BY id")?;

        let rows = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(page_id, url, text_file)| {
                Ok(PageRecord {
                    url,
                    content_ref: ContentRef::from_stored(text_file),
                    images: self.images_for_page(page_id)?,
                })
            })
            .collect()
    }

    // ===== Statistics =====

    fn count_pages(&self) -> StorageResult<u64> {
        self.count("pages")
    }

    fn count_images(&self) -> StorageResult<u64> {
        self.count("images")
    }

    fn count_runs(&self) -> StorageResult<u64> {
        self.count("runs")
    }
}
