//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::state::StatsSnapshot;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{CategoryCount, ExtractedDocument, RunRecord, RunStatus, WordCountSummary};
use crate::SweepError;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;

const DOCUMENT_COLUMNS: &str = "id, title, content, category, word_count, url, fetched_at";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, start_id, end_id, status, \
     attempted, succeeded, failed, empty, skipped, not_attempted";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(SweepError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, SweepError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, SweepError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn document_from_row(row: &Row<'_>) -> rusqlite::Result<ExtractedDocument> {
    let fetched_at: String = row.get(6)?;
    let fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(ExtractedDocument {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        category: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        word_count: row.get::<_, Option<i64>>(4)?.unwrap_or(0) as usize,
        url: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        fetched_at,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        start_id: row.get(4)?,
        end_id: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?)
            .unwrap_or(RunStatus::Running),
        attempted: row.get::<_, i64>(7)? as u64,
        succeeded: row.get::<_, i64>(8)? as u64,
        failed: row.get::<_, i64>(9)? as u64,
        empty: row.get::<_, i64>(10)? as u64,
        skipped: row.get::<_, i64>(11)? as u64,
        not_attempted: row.get::<_, i64>(12)? as u64,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<CategoryCount> {
    Ok(CategoryCount {
        category: row.get(0)?,
        count: row.get::<_, i64>(1)? as u64,
    })
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str, start_id: i64, end_id: i64) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, start_id, end_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![now, config_hash, start_id, end_id, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        Ok(self.conn.query_row(&sql, [], run_from_row).optional()?)
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &StatsSnapshot,
        not_attempted: u64,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, attempted = ?3, succeeded = ?4,
                 failed = ?5, empty = ?6, skipped = ?7, not_attempted = ?8
             WHERE id = ?9",
            params![
                status.to_db_string(),
                now,
                stats.attempted as i64,
                stats.succeeded as i64,
                stats.failed as i64,
                stats.empty as i64,
                stats.skipped as i64,
                not_attempted as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    // ===== Documents =====

    fn upsert_document(&mut self, document: &ExtractedDocument) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO documents (id, title, content, category, word_count, url, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 content = excluded.content,
                 category = excluded.category,
                 word_count = excluded.word_count,
                 url = excluded.url,
                 fetched_at = excluded.fetched_at",
            params![
                document.id,
                document.title,
                document.content,
                document.category,
                document.word_count as i64,
                document.url,
                document.fetched_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    fn contains(&self, id: i64) -> StorageResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM documents WHERE id = ?1", params![id], |_| {
                Ok(())
            })
            .optional()?;
        Ok(found.is_some())
    }

    fn get_document(&self, id: i64) -> StorageResult<ExtractedDocument> {
        let sql = format!("SELECT {} FROM documents WHERE id = ?1", DOCUMENT_COLUMNS);
        self.conn
            .query_row(&sql, params![id], document_from_row)
            .optional()?
            .ok_or(StorageError::DocumentNotFound(id))
    }

    fn list_documents(&self) -> StorageResult<Vec<ExtractedDocument>> {
        let sql = format!("SELECT {} FROM documents ORDER BY id", DOCUMENT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let documents = stmt
            .query_map([], document_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents)
    }

    fn stored_ids(&self, start_id: i64, end_id: i64) -> StorageResult<HashSet<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM documents WHERE id BETWEEN ?1 AND ?2")?;
        let ids = stmt
            .query_map(params![start_id, end_id], |row| row.get(0))?
            .collect::<Result<HashSet<i64>, _>>()?;
        Ok(ids)
    }

    fn count_documents(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn word_count_summary(&self) -> StorageResult<Option<WordCountSummary>> {
        let summary = self.conn.query_row(
            "SELECT AVG(word_count), MIN(word_count), MAX(word_count) FROM documents",
            [],
            |row| {
                let average: Option<f64> = row.get(0)?;
                let min: Option<i64> = row.get(1)?;
                let max: Option<i64> = row.get(2)?;
                Ok(average.zip(min).zip(max).map(|((average, min), max)| {
                    WordCountSummary {
                        average,
                        min: min as u64,
                        max: max as u64,
                    }
                }))
            },
        )?;
        Ok(summary)
    }

    // ===== Category Aggregate =====

    fn refresh_categories(&mut self) -> StorageResult<Vec<CategoryCount>> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM categories", [])?;
        tx.execute(
            "INSERT INTO categories (name, count)
             SELECT COALESCE(category, ''), COUNT(*) FROM documents
             GROUP BY COALESCE(category, '')",
            [],
        )?;
        tx.commit()?;

        self.category_counts()
    }

    fn category_counts(&self) -> StorageResult<Vec<CategoryCount>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, count FROM categories ORDER BY count DESC, name ASC")?;
        let counts = stmt
            .query_map([], category_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}
