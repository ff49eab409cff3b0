//! Output error types and the run summary model
//!
//! This module defines the error type shared by every output writer and the
//! data structure used for run summaries.

use crate::storage::{CategoryCount, RunRecord, StorageError, WordCountSummary};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary of one crawl run plus the state of the store afterwards
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<u64>,
    pub status: String,
    pub config_hash: String,
    pub start_id: i64,
    pub end_id: i64,

    // Outcome breakdown
    pub attempted: u64,
    pub stored: u64,
    pub empty: u64,
    pub failed: u64,
    pub skipped: u64,
    pub not_attempted: u64,

    // Store contents
    pub total_documents: u64,
    pub word_counts: Option<WordCountSummary>,
    pub categories: Vec<CategoryCount>,
}

impl CrawlSummary {
    /// Creates a new empty crawl summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a summary from a run record
    pub fn from_run(run: &RunRecord) -> Self {
        Self {
            run_id: run.id,
            started_at: run.started_at.clone(),
            finished_at: run.finished_at.clone(),
            duration_seconds: run_duration_seconds(run),
            status: run.status.to_db_string().to_string(),
            config_hash: run.config_hash.clone(),
            start_id: run.start_id,
            end_id: run.end_id,
            attempted: run.attempted,
            stored: run.succeeded,
            empty: run.empty,
            failed: run.failed,
            skipped: run.skipped,
            not_attempted: run.not_attempted,
            ..Self::default()
        }
    }

    /// Number of ids in the run's range
    pub fn total_targets(&self) -> u64 {
        if self.start_id > self.end_id {
            return 0;
        }
        (self.end_id - self.start_id) as u64 + 1
    }

    /// Returns the success rate as a percentage of attempted targets
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        (self.stored as f64 / self.attempted as f64) * 100.0
    }

    /// True if every id of the range is accounted for
    pub fn is_fully_accounted(&self) -> bool {
        self.stored + self.empty + self.failed + self.skipped + self.not_attempted
            == self.total_targets()
    }
}

fn run_duration_seconds(run: &RunRecord) -> Option<u64> {
    let started = run.started_at.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
    let finished = run
        .finished_at
        .as_deref()?
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    Some((finished - started).num_seconds().max(0) as u64)
}
