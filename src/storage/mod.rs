//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Idempotent document upserts keyed by resource id
//! - The denormalized category aggregate
//! - Run tracking for the final report and resumption

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::SweepError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(SweepError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SweepError> {
    SqliteStorage::new(path)
}

/// A document salvaged from one resource id
///
/// `word_count` is the length of `content` in characters. Field names are
/// also the JSON export field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub word_count: usize,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
}

impl ExtractedDocument {
    /// Builds a document, deriving `word_count` from the content
    pub fn new(
        id: i64,
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        let content = content.into();
        Self {
            id,
            title: title.into(),
            word_count: content.chars().count(),
            content,
            category: category.into(),
            url: url.into(),
            fetched_at,
        }
    }
}

/// Number of stored documents in one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

/// Aggregate word counts over the stored documents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordCountSummary {
    pub average: f64,
    pub min: u64,
    pub max: u64,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub start_id: i64,
    pub end_id: i64,
    pub status: RunStatus,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub empty: u64,
    pub skipped: u64,
    pub not_attempted: u64,
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
