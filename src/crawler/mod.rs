//! Crawler module for id-space fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Id range partitioning and concurrency limiting
//! - Overall crawl coordination and the final report

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use fetcher::{
    build_http_client, CrawlTarget, FailureReason, FetchOutcome, Fetcher, HttpFetcher,
    RetryPolicy,
};
pub use scheduler::{IdBatch, Scheduler};

use crate::state::StatsSnapshot;
use crate::storage::CategoryCount;
use std::time::Duration;

/// Final result of a crawl run
///
/// Every id of `[start_id, end_id]` is accounted for exactly once across
/// `stats.succeeded`, `stats.empty`, `stats.failed`, `stats.skipped` and
/// `not_attempted`.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub run_id: i64,
    pub start_id: i64,
    pub end_id: i64,
    pub stats: StatsSnapshot,
    pub not_attempted: u64,
    /// Number of distinct categories in the store after the run
    pub distinct_categories: usize,
    /// Category aggregate after the run, largest first
    pub categories: Vec<CategoryCount>,
    pub duration: Duration,
    pub cancelled: bool,
}

impl CrawlReport {
    /// Number of ids in the crawled range
    pub fn total_targets(&self) -> u64 {
        (self.end_id - self.start_id) as u64 + 1
    }

    /// Logs the one-line run summary
    pub fn log(&self) {
        tracing::info!(
            "Run {} {}: {} stored, {} empty, {} failed, {} skipped, {} not attempted, {} categories, took {:?}",
            self.run_id,
            if self.cancelled { "cancelled" } else { "completed" },
            self.stats.succeeded,
            self.stats.empty,
            self.stats.failed,
            self.stats.skipped,
            self.not_attempted,
            self.distinct_categories,
            self.duration
        );
    }
}
