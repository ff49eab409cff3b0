//! Process-wide crawl counters and progress reporting
//!
//! Workers only ever touch `CrawlStats` through atomic increments, so the
//! reporter never holds a lock that a worker could wait on.

use crate::state::TargetOutcome;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Counters for one crawl run
#[derive(Debug, Default)]
pub struct CrawlStats {
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    empty: AtomicU64,
    skipped: AtomicU64,
    completed: AtomicU64,
}

/// A point-in-time copy of `CrawlStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub empty: u64,
    pub skipped: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zeroes every counter; called when a run starts
    pub fn reset(&self) {
        for counter in [
            &self.attempted,
            &self.succeeded,
            &self.failed,
            &self.empty,
            &self.skipped,
            &self.completed,
        ] {
            counter.store(0, Ordering::SeqCst);
        }
    }

    /// Records one terminal outcome and returns the number of completed targets
    ///
    /// `NotAttempted` is never recorded; it is derived from the range size at
    /// the end of the run.
    pub fn record(&self, outcome: TargetOutcome) -> u64 {
        let counter = match outcome {
            TargetOutcome::Stored => &self.succeeded,
            TargetOutcome::Empty => &self.empty,
            TargetOutcome::Failed => &self.failed,
            TargetOutcome::Skipped => &self.skipped,
            TargetOutcome::NotAttempted => return self.completed.load(Ordering::SeqCst),
        };

        counter.fetch_add(1, Ordering::SeqCst);
        if outcome.is_attempted() {
            self.attempted.fetch_add(1, Ordering::SeqCst);
        }
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            attempted: self.attempted.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            empty: self.empty.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
        }
    }
}

impl StatsSnapshot {
    /// `attempted == succeeded + failed + empty`
    pub fn is_conserved(&self) -> bool {
        self.attempted == self.succeeded + self.failed + self.empty
    }

    /// Targets in a range of `total` ids that never reached a terminal state
    pub fn not_attempted(&self, total: u64) -> u64 {
        total.saturating_sub(self.attempted + self.skipped)
    }

    /// Percentage of attempted targets that produced a stored document
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.attempted as f64) * 100.0
    }
}

/// Wraps `CrawlStats` with periodic progress logging
pub struct ProgressReporter {
    stats: Arc<CrawlStats>,
    interval: u64,
    total: u64,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(stats: Arc<CrawlStats>, interval: u64, total: u64) -> Self {
        Self {
            stats,
            interval: interval.max(1),
            total,
            started: Instant::now(),
        }
    }

    pub fn stats(&self) -> &Arc<CrawlStats> {
        &self.stats
    }

    /// Records an outcome, logging a progress line every `interval` completions
    pub fn record(&self, id: i64, outcome: TargetOutcome) {
        let completed = self.stats.record(outcome);
        tracing::debug!("Target {} finished: {}", id, outcome);

        if outcome != TargetOutcome::NotAttempted && completed % self.interval == 0 {
            self.log_progress(completed);
        }
    }

    fn log_progress(&self, completed: u64) {
        let snapshot = self.stats.snapshot();
        let elapsed = self.started.elapsed().as_secs_f64();
        let rate = if elapsed > 0.0 {
            completed as f64 / elapsed
        } else {
            0.0
        };

        tracing::info!(
            "Progress: {}/{} done, {} stored, {} empty, {} failed, {:.2} targets/sec",
            completed,
            self.total,
            snapshot.succeeded,
            snapshot.empty,
            snapshot.failed,
            rate
        );
    }

    /// Logs the final counters for the run
    pub fn log_summary(&self) {
        let snapshot = self.stats.snapshot();
        tracing::info!(
            "Run finished in {:?}: attempted {}, stored {}, empty {}, failed {}, skipped {}, not attempted {}",
            self.started.elapsed(),
            snapshot.attempted,
            snapshot.succeeded,
            snapshot.empty,
            snapshot.failed,
            snapshot.skipped,
            snapshot.not_attempted(self.total)
        );
    }
}
