//! Output module for exports, statistics and run summaries
//!
//! This module handles:
//! - Exporting stored documents as JSON (optionally chunked)
//! - Reading exports back
//! - Generating markdown summaries of crawl runs
//! - Displaying store statistics

mod export;
mod markdown;
pub mod stats;
mod traits;

pub use export::{chunk_path, export_documents, load_export, write_documents};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use traits::{CrawlSummary, OutputError, OutputResult};

use crate::storage::{Storage, StorageError};
use crate::SweepError;

/// Generates a crawl summary for the most recent run
///
/// # Arguments
///
/// * `storage` - The storage backend containing crawl data
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Successfully generated summary
/// * `Err(SweepError)` - No run recorded, or the store could not be read
pub fn generate_summary(storage: &dyn Storage) -> Result<CrawlSummary, SweepError> {
    let run = storage
        .get_latest_run()?
        .ok_or_else(|| StorageError::Database("No crawl runs found in database".to_string()))?;

    let mut summary = CrawlSummary::from_run(&run);
    summary.total_documents = storage.count_documents()?;
    summary.word_counts = storage.word_count_summary()?;
    summary.categories = storage.category_counts()?;

    Ok(summary)
}
