//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{CategoryCount, ExtractedDocument, RunRecord, RunStatus, WordCountSummary};
use crate::state::StatsSnapshot;
use std::collections::HashSet;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Writes take `&mut self`; callers that share a backend between workers wrap
/// it in a mutex and hold the guard for a single call.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run in the `running` state
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str, start_id: i64, end_id: i64) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records the final status and counters of a run
    fn finish_run(
        &mut self,
        run_id: i64,
        status: RunStatus,
        stats: &StatsSnapshot,
        not_attempted: u64,
    ) -> StorageResult<()>;

    // ===== Documents =====

    /// Inserts a document, or replaces every field of the existing row with
    /// the same id
    fn upsert_document(&mut self, document: &ExtractedDocument) -> StorageResult<()>;

    /// Returns true if a document exists for this id
    fn contains(&self, id: i64) -> StorageResult<bool>;

    /// Gets a document by id
    fn get_document(&self, id: i64) -> StorageResult<ExtractedDocument>;

    /// Gets all documents ordered by id
    fn list_documents(&self) -> StorageResult<Vec<ExtractedDocument>>;

    /// Gets the ids already stored within `[start_id, end_id]`
    fn stored_ids(&self, start_id: i64, end_id: i64) -> StorageResult<HashSet<i64>>;

    /// Gets total document count
    fn count_documents(&self) -> StorageResult<u64>;

    /// Average, min and max word count over all documents
    fn word_count_summary(&self) -> StorageResult<Option<WordCountSummary>>;

    // ===== Category Aggregate =====

    /// Rebuilds the `categories` table from `documents` in one transaction
    fn refresh_categories(&mut self) -> StorageResult<Vec<CategoryCount>>;

    /// Reads the `categories` table, largest first
    fn category_counts(&self) -> StorageResult<Vec<CategoryCount>>;
}
