//! Configuration module for id-sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use id_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Crawling ids {}..={}", config.crawler.start_id, config.crawler.end_id);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    default_taxonomy, CategorizerConfig, CategoryEntry, Config, CrawlerConfig, ExtractorConfig,
    FetcherConfig, OutputConfig, DEFAULT_EXPORT_CHUNK_SIZE,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_url_template, ID_PLACEHOLDER};

pub(crate) use validation::validate_crawler_config;
