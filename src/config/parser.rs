use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use id_sweep::config::load_config;
///
/// let config = load_config(Path::new("sweep.toml")).unwrap();
/// println!("Workers: {}", config.crawler.max_workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Each crawl run records this hash so runs can be traced back to the
/// configuration that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"
[crawler]
start-id = 1
end-id = 100
max-workers = 4
batch-size = 50

[fetcher]
url-template = "https://example.com/?id={id}"

[extractor]
site-name = "Story Nook"

[[category]]
name = "love"
keywords = ["love", "romance"]

[[category]]
name = "horror"
keywords = ["ghost"]

[output]
database-path = "./stories.db"
export-path = "./stories.json"
"#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let file = create_temp_config(VALID);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.start_id, 1);
        assert_eq!(config.crawler.end_id, 100);
        assert_eq!(config.crawler.max_workers, 4);
        assert_eq!(config.crawler.batch_size, Some(50));
        assert_eq!(config.crawler.progress_interval, 10);
        assert_eq!(config.fetcher.max_attempts, 3);
        assert_eq!(config.extractor.min_content_length, 100);
        assert_eq!(config.extractor.site_name.as_deref(), Some("Story Nook"));
        assert_eq!(config.categories.len(), 2);
        assert_eq!(config.categories[0].name, "love");
        assert_eq!(config.categorizer.fallback, "other");
        assert!(config.output.summary_path.is_none());
    }

    #[test]
    fn test_default_taxonomy_when_no_categories() {
        let head = VALID.split("[[category]]").next().unwrap();
        let tail = VALID.split("[output]").nth(1).unwrap();
        let content = format!("{}[output]{}", head, tail);
        let config = parse_config(&content).unwrap();

        assert!(config.categories.is_empty());
        let taxonomy = config.taxonomy();
        assert_eq!(taxonomy[0].name, "love");
        assert!(taxonomy.iter().any(|c| c.name == "history"));
    }

    #[test]
    fn test_export_chunking() {
        let config = parse_config(VALID).unwrap();
        assert_eq!(config.output.export_chunking(), None);

        let chunked = VALID.replace(
            "export-path = \"./stories.json\"",
            "export-path = \"./stories.json\"\nchunked-export = true",
        );
        let config = parse_config(&chunked).unwrap();
        assert_eq!(config.output.export_chunking(), Some(100));

        let sized = VALID.replace(
            "export-path = \"./stories.json\"",
            "export-path = \"./stories.json\"\nexport-chunk-size = 25",
        );
        let config = parse_config(&sized).unwrap();
        assert_eq!(config.output.export_chunking(), Some(25));
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/sweep.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let content = VALID.replace("end-id = 100", "end-id = 0");
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_template_without_placeholder_is_rejected() {
        let content = VALID.replace("?id={id}", "");
        let result = parse_config(&content);
        assert!(matches!(result, Err(ConfigError::InvalidTemplate(_))));
    }

    #[test]
    fn test_config_hash_is_stable() {
        let file = create_temp_config(VALID);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let (_, hash2) = load_config_with_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(hash_content("content 1"), hash_content("content 2"));
    }
}
