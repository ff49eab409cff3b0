//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates every part of a run:
//! - Recording the run in storage
//! - Walking the id range batch by batch
//! - Spawning one fetch, extract, categorize, store pipeline per id
//! - Handling cancellation and resumption
//! - Rebuilding the category aggregate and producing the final report

use crate::config::{validate_crawler_config, Config};
use crate::content::{Categorizer, Extractor};
use crate::crawler::scheduler::{range_len, IdBatch, ScheduledTarget, Scheduler};
use crate::crawler::{CrawlReport, CrawlTarget, FetchOutcome, Fetcher, HttpFetcher};
use crate::state::{CrawlStats, ProgressReporter, TargetOutcome};
use crate::storage::{ExtractedDocument, RunStatus, SqliteStorage, Storage, StorageError};
use crate::SweepError;
use chrono::Utc;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::task::JoinSet;

/// Everything a worker needs to process one target
struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Extractor,
    categorizer: Categorizer,
    storage: Arc<Mutex<SqliteStorage>>,
}

impl Pipeline {
    /// Runs fetch, extract, categorize and store for one target
    ///
    /// Every per-target error is recovered here and turned into an outcome.
    async fn process(&self, target: &CrawlTarget) -> TargetOutcome {
        let raw_body = match self.fetcher.fetch(target).await {
            FetchOutcome::Success { raw_body, .. } => raw_body,
            FetchOutcome::Failure { reason } => {
                tracing::warn!("Id {} failed: {}", target.id, reason);
                return TargetOutcome::Failed;
            }
        };

        let extracted = match self.extractor.extract(&raw_body) {
            Ok(extracted) => extracted,
            Err(rejection) => {
                tracing::warn!("Id {} has no usable content: {}", target.id, rejection);
                return TargetOutcome::Empty;
            }
        };

        let category = self
            .categorizer
            .categorize(&extracted.title, &extracted.content);
        let document = ExtractedDocument::new(
            target.id,
            target.url.clone(),
            extracted.title,
            extracted.content,
            category,
            Utc::now(),
        );

        match self.store(&document) {
            Ok(()) => {
                tracing::debug!(
                    "Stored id {} ({} chars, {})",
                    document.id,
                    document.word_count,
                    document.category
                );
                TargetOutcome::Stored
            }
            Err(e) => {
                tracing::error!("Failed to store id {}: {}", target.id, e);
                TargetOutcome::Failed
            }
        }
    }

    fn store(&self, document: &ExtractedDocument) -> Result<(), StorageError> {
        let mut storage = self
            .storage
            .lock()
            .map_err(|_| StorageError::LockPoisoned)?;
        storage.upsert_document(document)
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    pipeline: Arc<Pipeline>,
    storage: Arc<Mutex<SqliteStorage>>,
    stats: Arc<CrawlStats>,
    cancel: Arc<AtomicBool>,
    config_hash: String,
    resume: bool,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The crawler section is re-validated here so that CLI overrides can
    /// never start a run over an invalid range.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `storage` - An opened store
    /// * `fetcher` - The network capability used by every worker
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(SweepError)` - The configuration cannot produce a run
    pub fn new(
        config: Config,
        storage: SqliteStorage,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, SweepError> {
        if config.crawler.start_id > config.crawler.end_id {
            return Err(SweepError::InvalidRange {
                start: config.crawler.start_id,
                end: config.crawler.end_id,
            });
        }
        validate_crawler_config(&config.crawler)?;

        let extractor = Extractor::new(&config.extractor)?;
        let categorizer = Categorizer::new(&config.taxonomy(), &config.categorizer);
        let storage = Arc::new(Mutex::new(storage));

        let pipeline = Pipeline {
            fetcher,
            extractor,
            categorizer,
            storage: Arc::clone(&storage),
        };

        Ok(Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            storage,
            stats: Arc::new(CrawlStats::new()),
            cancel: Arc::new(AtomicBool::new(false)),
            config_hash: String::new(),
            resume: false,
        })
    }

    /// Opens the configured database and builds an HTTP fetcher
    pub fn from_config(config: Config) -> Result<Self, SweepError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let fetcher = HttpFetcher::new(&config.fetcher)?;
        Self::new(config, storage, Arc::new(fetcher))
    }

    /// Records the hash of the configuration that produced this run
    pub fn with_config_hash(mut self, config_hash: impl Into<String>) -> Self {
        self.config_hash = config_hash.into();
        self
    }

    /// Skip ids that already have a stored document
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Flag that stops the run from starting new targets once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn stats(&self) -> Arc<CrawlStats> {
        Arc::clone(&self.stats)
    }

    pub fn storage(&self) -> Arc<Mutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn lock_storage(&self) -> Result<std::sync::MutexGuard<'_, SqliteStorage>, StorageError> {
        self.storage.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Runs the crawl over the configured range
    ///
    /// 1. Reset counters and create the run record
    /// 2. For each batch, schedule every id (skipping stored ids on resume)
    ///    and wait for the whole batch before starting the next
    /// 3. Stop scheduling as soon as cancellation is requested; in-flight
    ///    targets finish, the rest are reported as not attempted
    /// 4. Rebuild the category aggregate and close the run record
    ///
    /// If the run errors after its record was created, the record is closed
    /// as `failed` before the error is returned. A cancellation request is
    /// consumed by the run it stops, so the coordinator can run again.
    pub async fn run(&self) -> Result<CrawlReport, SweepError> {
        let started = Instant::now();
        self.stats.reset();

        let crawler = &self.config.crawler;
        let run_id = self
            .lock_storage()?
            .create_run(&self.config_hash, crawler.start_id, crawler.end_id)?;

        let result = self.execute(run_id, started).await;
        self.cancel.store(false, Ordering::SeqCst);

        if let Err(e) = &result {
            tracing::error!("Run {} failed: {}", run_id, e);
            self.close_failed_run(run_id);
        }
        result
    }

    async fn execute(&self, run_id: i64, started: Instant) -> Result<CrawlReport, SweepError> {
        let crawler = &self.config.crawler;
        let scheduler = Scheduler::new(crawler, &self.config.fetcher.url_template);
        let total = scheduler.total_targets();

        let already_stored = if self.resume {
            self.lock_storage()?
                .stored_ids(crawler.start_id, crawler.end_id)?
        } else {
            HashSet::new()
        };

        tracing::info!(
            "Starting crawl run {}: ids {}..={} ({} targets), {} workers, batch size {}",
            run_id,
            crawler.start_id,
            crawler.end_id,
            total,
            crawler.max_workers,
            scheduler.batch_size()
        );
        tracing::debug!(
            "Categories: {}",
            self.pipeline
                .categorizer
                .labels()
                .collect::<Vec<_>>()
                .join(", ")
        );
        if self.resume {
            tracing::info!("Resuming: {} ids already stored", already_stored.len());
        }

        let reporter = Arc::new(ProgressReporter::new(
            Arc::clone(&self.stats),
            crawler.progress_interval,
            total,
        ));

        for batch in scheduler.batches() {
            if self.is_cancelled() {
                break;
            }
            self.run_batch(&scheduler, batch, &already_stored, &reporter)
                .await;
        }

        let cancelled = self.is_cancelled();
        if cancelled {
            tracing::warn!("Crawl cancelled; unstarted targets were not attempted");
        }
        reporter.log_summary();

        let snapshot = self.stats.snapshot();
        let not_attempted = snapshot.not_attempted(total);
        let status = if cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Completed
        };

        let categories = {
            let mut storage = self.lock_storage()?;
            let categories = storage.refresh_categories()?;
            storage.finish_run(run_id, status, &snapshot, not_attempted)?;
            categories
        };

        let report = CrawlReport {
            run_id,
            start_id: crawler.start_id,
            end_id: crawler.end_id,
            stats: snapshot,
            not_attempted,
            distinct_categories: categories.len(),
            categories,
            duration: started.elapsed(),
            cancelled,
        };
        report.log();

        Ok(report)
    }

    /// Best-effort close of a run record after an error
    fn close_failed_run(&self, run_id: i64) {
        let snapshot = self.stats.snapshot();
        let total = range_len(self.config.crawler.start_id, self.config.crawler.end_id);
        let result = self.lock_storage().and_then(|mut storage| {
            storage.finish_run(
                run_id,
                RunStatus::Failed,
                &snapshot,
                snapshot.not_attempted(total),
            )
        });

        if let Err(e) = result {
            tracing::error!("Could not mark run {} as failed: {}", run_id, e);
        }
    }

    /// Schedules every id of one batch and waits for all of them
    async fn run_batch(
        &self,
        scheduler: &Scheduler,
        batch: IdBatch,
        already_stored: &HashSet<i64>,
        reporter: &Arc<ProgressReporter>,
    ) {
        tracing::debug!("Starting batch {}..={}", batch.start, batch.end);
        let max_workers = self.config.crawler.max_workers as usize;
        let mut tasks = JoinSet::new();

        for id in batch.ids() {
            if self.is_cancelled() {
                break;
            }

            if already_stored.contains(&id) {
                reporter.record(id, TargetOutcome::Skipped);
                continue;
            }

            let scheduled = match scheduler.schedule(scheduler.target(id)).await {
                Some(scheduled) => scheduled,
                None => break,
            };

            // Cancellation may arrive while waiting for a permit
            if self.is_cancelled() {
                break;
            }

            let pipeline = Arc::clone(&self.pipeline);
            let task_reporter = Arc::clone(reporter);
            tasks.spawn(async move {
                let ScheduledTarget { target, _permit } = scheduled;
                let outcome = pipeline.process(&target).await;
                task_reporter.record(target.id, outcome);
            });

            // Finished tasks hold their output until joined
            while tasks.len() > max_workers {
                if let Some(result) = tasks.join_next().await {
                    record_join_error(result, reporter);
                }
            }
        }

        while let Some(result) = tasks.join_next().await {
            record_join_error(result, reporter);
        }
    }
}

/// A worker that panicked never recorded its outcome; count it as failed
fn record_join_error(result: Result<(), tokio::task::JoinError>, reporter: &ProgressReporter) {
    if let Err(e) = result {
        tracing::error!("Worker task failed: {}", e);
        reporter.stats().record(TargetOutcome::Failed);
    }
}

/// Runs the main crawl operation
///
/// Opens the store at `output.database-path`, crawls with an HTTP fetcher and
/// returns the final report.
///
/// # Example
///
/// ```no_run
/// use id_sweep::config::load_config_with_hash;
/// use id_sweep::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("sweep.toml"))?;
/// let report = run_crawl(config, &hash, false).await?;
/// println!("{} stored", report.stats.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    config_hash: &str,
    resume: bool,
) -> Result<CrawlReport, SweepError> {
    let coordinator = Coordinator::from_config(config)?
        .with_config_hash(config_hash)
        .with_resume(resume);
    coordinator.run().await
}
