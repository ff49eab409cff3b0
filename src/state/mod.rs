//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `TargetOutcome`: how a single id finished (stored, empty, failed, ...)
//! - `CrawlStats`: atomic per-run counters shared by every worker
//! - `ProgressReporter`: periodic progress lines on top of `CrawlStats`

mod outcome;
mod stats;

pub use outcome::TargetOutcome;
pub use stats::{CrawlStats, ProgressReporter, StatsSnapshot};
