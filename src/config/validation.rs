use crate::config::types::{
    CategorizerConfig, CategoryEntry, Config, CrawlerConfig, ExtractorConfig, FetcherConfig,
    OutputConfig,
};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Placeholder substituted with the numeric id in `url-template`
pub const ID_PLACEHOLDER: &str = "{id}";

/// Upper bound on `max-workers`
const MAX_WORKERS: u32 = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_extractor_config(&config.extractor)?;
    validate_categorizer_config(&config.categorizer)?;
    validate_categories(&config.categories)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the id range and worker pool settings
pub(crate) fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.start_id < 0 {
        return Err(ConfigError::Validation(format!(
            "start_id must be >= 0, got {}",
            config.start_id
        )));
    }

    if config.start_id > config.end_id {
        return Err(ConfigError::Validation(format!(
            "start_id ({}) must be <= end_id ({})",
            config.start_id, config.end_id
        )));
    }

    if config.max_workers < 1 || config.max_workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.max_workers
        )));
    }

    if let Some(batch_size) = config.batch_size {
        if batch_size < 1 {
            return Err(ConfigError::Validation(
                "batch_size must be >= 1".to_string(),
            ));
        }
    }

    if config.progress_interval < 1 {
        return Err(ConfigError::Validation(
            "progress_interval must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    validate_url_template(&config.url_template)?;

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must be <= max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) must be <= backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a URL template: exactly one `{id}` and an http(s) URL once filled in
pub fn validate_url_template(template: &str) -> Result<(), ConfigError> {
    let placeholders = template.matches(ID_PLACEHOLDER).count();
    if placeholders != 1 {
        return Err(ConfigError::InvalidTemplate(format!(
            "'{}' must contain exactly one {} placeholder, found {}",
            template, ID_PLACEHOLDER, placeholders
        )));
    }

    let sample = template.replace(ID_PLACEHOLDER, "0");
    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidTemplate(format!("'{}': {}", template, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidTemplate(format!(
            "'{}' must use http or https",
            template
        )));
    }

    Ok(())
}

/// Validates extraction thresholds and selector lists
fn validate_extractor_config(config: &ExtractorConfig) -> Result<(), ConfigError> {
    if config.min_content_length < 1 {
        return Err(ConfigError::Validation(
            "min_content_length must be >= 1".to_string(),
        ));
    }

    if config.title_min_length < 1 || config.title_min_length > config.title_max_length {
        return Err(ConfigError::Validation(format!(
            "title length bounds are invalid: [{}, {}]",
            config.title_min_length, config.title_max_length
        )));
    }

    if config.title_selectors.is_empty() {
        return Err(ConfigError::Validation(
            "title_selectors cannot be empty".to_string(),
        ));
    }

    for selector in config
        .title_selectors
        .iter()
        .chain(config.content_selectors.iter())
    {
        Selector::parse(selector)
            .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))?;
    }

    if config.boilerplate.iter().any(|b| b.is_empty()) {
        return Err(ConfigError::Validation(
            "boilerplate entries cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_categorizer_config(config: &CategorizerConfig) -> Result<(), ConfigError> {
    if config.fallback.trim().is_empty() {
        return Err(ConfigError::Validation(
            "categorizer fallback cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates the category taxonomy
fn validate_categories(categories: &[CategoryEntry]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in categories {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate category '{}'",
                entry.name
            )));
        }

        if entry.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "category '{}' must have at least one keyword",
                entry.name
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.export_path.is_empty() {
        return Err(ConfigError::Validation(
            "export_path cannot be empty".to_string(),
        ));
    }

    if config.export_chunk_size == Some(0) {
        return Err(ConfigError::Validation(
            "export_chunk_size must be >= 1".to_string(),
        ));
    }

    if matches!(&config.summary_path, Some(p) if p.is_empty()) {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
