//! id-sweep: a concurrent ID-space content crawler
//!
//! This crate walks a bounded range of numeric resource ids on a remote site,
//! fetches each resource, salvages a title/body/category out of whatever HTML
//! comes back, and stores the result idempotently in SQLite before exporting
//! the whole collection as JSON.

pub mod config;
pub mod content;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for id-sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid id range: start {start} > end {end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL template: {0}")]
    InvalidTemplate(String),

    #[error("Invalid CSS selector: {0}")]
    InvalidSelector(String),
}

/// Result type alias for id-sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use content::{Categorizer, Extractor};
pub use crawler::{Coordinator, CrawlReport, CrawlTarget, FetchOutcome, Fetcher, HttpFetcher};
pub use state::{CrawlStats, StatsSnapshot, TargetOutcome};
pub use storage::{ExtractedDocument, SqliteStorage, Storage};
