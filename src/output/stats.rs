//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! statistics about the stored documents and the latest run.

use crate::storage::{CategoryCount, RunRecord, Storage, WordCountSummary};
use crate::SweepError;

/// Document store statistics
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stored documents
    pub total_documents: u64,

    /// Documents per category, largest first
    pub categories: Vec<CategoryCount>,

    /// Average, min and max document length
    pub word_counts: Option<WordCountSummary>,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(SweepError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<CrawlStatistics, SweepError> {
    Ok(CrawlStatistics {
        total_documents: storage.count_documents()?,
        categories: storage.category_counts()?,
        word_counts: storage.word_count_summary()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Stored documents: {}", stats.total_documents);
    println!("  Distinct categories: {}", stats.categories.len());
    if let Some(words) = &stats.word_counts {
        println!(
            "  Document length: avg {:.1}, min {}, max {} chars",
            words.average, words.min, words.max
        );
    }
    println!();

    if !stats.categories.is_empty() {
        println!("Documents by Category:");
        for entry in &stats.categories {
            let percentage = if stats.total_documents > 0 {
                (entry.count as f64 / stats.total_documents as f64) * 100.0
            } else {
                0.0
            };
            println!("  {}: {} ({:.1}%)", entry.category, entry.count, percentage);
        }
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run ({}):", run.id);
            println!("  Range: {}..={}", run.start_id, run.end_id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!(
                "  Stored: {}, empty: {}, failed: {}, skipped: {}, not attempted: {}",
                run.succeeded, run.empty, run.failed, run.skipped, run.not_attempted
            );

            let success_rate = if run.attempted > 0 {
                (run.succeeded as f64 / run.attempted as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "\nSuccess Rate: {:.1}% ({} / {} attempted ids stored)",
                success_rate, run.succeeded, run.attempted
            );
        }
        None => println!("No crawl runs recorded yet."),
    }
}
