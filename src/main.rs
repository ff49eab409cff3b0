//! id-sweep main entry point
//!
//! This is the command-line interface for the id-sweep content crawler.

use clap::Parser;
use id_sweep::config::{load_config_with_hash, validate, Config};
use id_sweep::crawler::{Coordinator, CrawlReport, CrawlTarget};
use id_sweep::output::{
    export_documents, generate_markdown_summary, generate_summary, load_statistics,
    print_statistics,
};
use id_sweep::storage::{open_storage, Storage, StorageError};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// id-sweep: a concurrent ID-space content crawler
///
/// id-sweep walks a numeric id range on a single site, extracts a title,
/// body and category from every page it can salvage, and stores the results
/// in SQLite before exporting them as JSON.
#[derive(Parser, Debug)]
#[command(name = "id-sweep")]
#[command(version)]
#[command(about = "A concurrent ID-space content crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the first id of the range
    #[arg(long)]
    start_id: Option<i64>,

    /// Override the last id of the range
    #[arg(long)]
    end_id: Option<i64>,

    /// Override the number of concurrent workers
    #[arg(long)]
    workers: Option<u32>,

    /// Skip ids that already have a stored document
    #[arg(long)]
    resume: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Export the stored documents as JSON and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    export: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if apply_overrides(&mut config, &cli) {
        // Overrides bypass the checks run at load time
        validate(&config)?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.export {
        handle_export(&config)?;
    } else {
        handle_crawl(config, &config_hash, cli.resume).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("id_sweep=info,warn"),
            1 => EnvFilter::new("id_sweep=debug,info"),
            2 => EnvFilter::new("id_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Applies command-line overrides; returns true if anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;

    if let Some(start_id) = cli.start_id {
        config.crawler.start_id = start_id;
        changed = true;
    }
    if let Some(end_id) = cli.end_id {
        config.crawler.end_id = end_id;
        changed = true;
    }
    if let Some(workers) = cli.workers {
        config.crawler.max_workers = workers;
        changed = true;
    }

    changed
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    let crawler = &config.crawler;
    let template = &config.fetcher.url_template;
    let total = (crawler.end_id - crawler.start_id) as u64 + 1;

    println!("=== id-sweep Dry Run ===\n");

    println!("Range:");
    println!("  Ids: {}..={} ({} targets)", crawler.start_id, crawler.end_id, total);
    println!(
        "  First URL: {}",
        CrawlTarget::from_template(crawler.start_id, template).url
    );
    println!(
        "  Last URL: {}",
        CrawlTarget::from_template(crawler.end_id, template).url
    );

    println!("\nWorkers:");
    println!("  Max workers: {}", crawler.max_workers);
    match crawler.batch_size {
        Some(size) => println!("  Batch size: {}", size),
        None => println!("  Batch size: whole range"),
    }

    println!("\nFetcher:");
    println!("  Max attempts: {}", config.fetcher.max_attempts);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!(
        "  Request delay: {}-{}ms",
        config.fetcher.min_delay_ms, config.fetcher.max_delay_ms
    );
    println!("  User agent: {}", config.fetcher.user_agent);

    println!("\nCategories ({}):", config.taxonomy().len());
    for entry in config.taxonomy() {
        println!("  - {} ({} keywords)", entry.name, entry.keywords.len());
    }
    println!("  - {} (fallback)", config.categorizer.fallback);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Export: {}", config.output.export_path);
    if let Some(size) = config.output.export_chunking() {
        println!("  Export chunk size: {}", size);
    }
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let mut storage = open_storage(Path::new(&config.output.database_path))?;
    storage.refresh_categories()?;

    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes the JSON export from existing data
fn handle_export(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Exporting Documents ===\n");
    println!("Database: {}", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let written = export_documents(
        &storage,
        Path::new(&config.output.export_path),
        config.output.export_chunking(),
    )?;

    for path in &written {
        println!("✓ Wrote {}", path.display());
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    resume: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if resume {
        tracing::info!("Resuming crawl (stored ids will be skipped)");
    }

    let export_path = PathBuf::from(&config.output.export_path);
    let chunking = config.output.export_chunking();
    let summary_path = config.output.summary_path.clone().map(PathBuf::from);

    let coordinator = Coordinator::from_config(config)?
        .with_config_hash(config_hash)
        .with_resume(resume);

    // First Ctrl-C stops scheduling; in-flight targets still finish
    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight targets");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let report = match coordinator.run().await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    let storage = coordinator.storage();
    let storage = storage.lock().map_err(|_| StorageError::LockPoisoned)?;

    let written = export_documents(&*storage, &export_path, chunking)?;
    tracing::info!("Export written to {} file(s)", written.len());

    if let Some(path) = summary_path {
        let summary = generate_summary(&*storage)?;
        generate_markdown_summary(&summary, &path)?;
        tracing::info!("Summary written to {}", path.display());
    }

    print_report(&report);
    Ok(())
}

/// Prints the final run report to stdout
fn print_report(report: &CrawlReport) {
    let stats = &report.stats;

    println!("\n=== Crawl Report (run {}) ===\n", report.run_id);
    println!(
        "Range: {}..={} ({} ids)",
        report.start_id,
        report.end_id,
        report.total_targets()
    );
    println!("Stored: {}", stats.succeeded);
    println!("Empty: {}", stats.empty);
    println!("Failed: {}", stats.failed);
    println!("Skipped: {}", stats.skipped);
    println!("Not attempted: {}", report.not_attempted);
    println!("Success rate: {:.1}%", stats.success_rate());
    println!("Duration: {:.1}s", report.duration.as_secs_f64());

    if !report.categories.is_empty() {
        println!("\nCategories ({}):", report.distinct_categories);
        for entry in &report.categories {
            println!("  {}: {}", entry.category, entry.count);
        }
    }

    if report.cancelled {
        println!("\nRun was cancelled before the whole range was scheduled.");
    }
}
