//! Scheduler for partitioning the id range and bounding concurrency
//!
//! This module handles:
//! - Splitting `[start_id, end_id]` into sequential batches
//! - Mapping ids to crawl targets through the URL template
//! - Global concurrency limiting via a semaphore

use crate::config::CrawlerConfig;
use crate::crawler::CrawlTarget;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// An inclusive, contiguous slice of the id range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdBatch {
    pub start: i64,
    pub end: i64,
}

impl IdBatch {
    /// Number of ids in the batch; never zero
    pub fn size(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    pub fn ids(&self) -> std::ops::RangeInclusive<i64> {
        self.start..=self.end
    }
}

/// A target that holds one of the global worker permits
pub struct ScheduledTarget {
    /// The target to process
    pub target: CrawlTarget,

    /// Released when the worker finishes
    pub _permit: OwnedSemaphorePermit,
}

/// Scheduler hands out targets batch by batch, one permit per target
///
/// At most `max_workers` targets hold a permit at once, and because batches
/// run one after another, never more than `batch_size` tasks are in flight.
pub struct Scheduler {
    /// Global semaphore for limiting concurrent workers
    global_semaphore: Arc<Semaphore>,

    start_id: i64,
    end_id: i64,
    batch_size: u64,
    url_template: String,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// Without a configured `batch_size` the whole range is a single batch.
    pub fn new(config: &CrawlerConfig, url_template: &str) -> Self {
        let total = range_len(config.start_id, config.end_id);
        let batch_size = config
            .batch_size
            .map(u64::from)
            .unwrap_or(total)
            .max(1);

        Self {
            global_semaphore: Arc::new(Semaphore::new(config.max_workers.max(1) as usize)),
            start_id: config.start_id,
            end_id: config.end_id,
            batch_size,
            url_template: url_template.to_string(),
        }
    }

    /// Number of ids in the whole range
    pub fn total_targets(&self) -> u64 {
        range_len(self.start_id, self.end_id)
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    /// Sequential batches covering the range in ascending id order
    pub fn batches(&self) -> impl Iterator<Item = IdBatch> {
        let end = self.end_id;
        let span = (self.batch_size - 1).min(i64::MAX as u64) as i64;
        let mut next = (self.start_id <= end).then_some(self.start_id);

        std::iter::from_fn(move || {
            let start = next?;
            let batch_end = start.saturating_add(span).min(end);
            next = (batch_end < end).then(|| batch_end + 1);
            Some(IdBatch {
                start,
                end: batch_end,
            })
        })
    }

    pub fn target(&self, id: i64) -> CrawlTarget {
        CrawlTarget::from_template(id, &self.url_template)
    }

    /// Waits for a free worker permit for the target
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledTarget)` - A target that may start now
    /// * `None` - The scheduler has been closed
    pub async fn schedule(&self, target: CrawlTarget) -> Option<ScheduledTarget> {
        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;
        Some(ScheduledTarget {
            target,
            _permit: permit,
        })
    }

    /// Number of permits not currently held by a worker
    pub fn available_permits(&self) -> usize {
        self.global_semaphore.available_permits()
    }
}

pub(crate) fn range_len(start_id: i64, end_id: i64) -> u64 {
    if start_id > end_id {
        0
    } else {
        (end_id - start_id) as u64 + 1
    }
}
