use serde::Deserialize;

/// Main configuration structure for id-sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub categorizer: CategorizerConfig,
    /// Ordered category taxonomy; earlier entries win ties
    #[serde(default, rename = "category")]
    pub categories: Vec<CategoryEntry>,
    pub output: OutputConfig,
}

impl Config {
    /// Returns the configured taxonomy, or the built-in one when none is given
    pub fn taxonomy(&self) -> Vec<CategoryEntry> {
        if self.categories.is_empty() {
            default_taxonomy()
        } else {
            self.categories.clone()
        }
    }
}

/// Range and worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First id to crawl (inclusive)
    #[serde(rename = "start-id")]
    pub start_id: i64,

    /// Last id to crawl (inclusive)
    #[serde(rename = "end-id")]
    pub end_id: i64,

    /// Maximum number of targets processed concurrently
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Maximum number of in-flight tasks per sequential batch
    #[serde(rename = "batch-size", default)]
    pub batch_size: Option<u32>,

    /// Emit a progress line every N completed targets
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: u64,
}

/// Fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// URL template with exactly one `{id}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Attempts per target before the target is marked failed
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Per-attempt request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// TCP connect timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Base delay for exponential backoff between attempts (milliseconds)
    #[serde(rename = "backoff-base-ms", default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay (milliseconds)
    #[serde(rename = "backoff-max-ms", default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Lower bound of the randomized pre-request delay (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pre-request delay (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Content extraction heuristics
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Minimum number of characters a document body must have to be stored
    #[serde(rename = "min-content-length", default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Paragraph-like nodes shorter than this are ignored by the last fallback
    #[serde(rename = "min-paragraph-length", default = "default_min_paragraph_length")]
    pub min_paragraph_length: usize,

    #[serde(rename = "title-min-length", default = "default_title_min_length")]
    pub title_min_length: usize,

    #[serde(rename = "title-max-length", default = "default_title_max_length")]
    pub title_max_length: usize,

    /// Site boilerplate name; never accepted as a title
    #[serde(rename = "site-name", default)]
    pub site_name: Option<String>,

    /// Title selectors, tried in order
    #[serde(rename = "title-selectors", default = "default_title_selectors")]
    pub title_selectors: Vec<String>,

    /// Content container selectors, tried in order
    #[serde(rename = "content-selectors", default = "default_content_selectors")]
    pub content_selectors: Vec<String>,

    /// Substrings removed from extracted content
    #[serde(default = "default_boilerplate")]
    pub boilerplate: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_content_length: default_min_content_length(),
            min_paragraph_length: default_min_paragraph_length(),
            title_min_length: default_title_min_length(),
            title_max_length: default_title_max_length(),
            site_name: None,
            title_selectors: default_title_selectors(),
            content_selectors: default_content_selectors(),
            boilerplate: default_boilerplate(),
        }
    }
}

/// Categorizer tuning
#[derive(Debug, Clone, Deserialize)]
pub struct CategorizerConfig {
    /// Number of content characters considered alongside the title
    #[serde(rename = "prefix-length", default = "default_prefix_length")]
    pub prefix_length: usize,

    /// Label returned when no keyword matches
    #[serde(default = "default_fallback_category")]
    pub fallback: String,
}

impl Default for CategorizerConfig {
    fn default() -> Self {
        Self {
            prefix_length: default_prefix_length(),
            fallback: default_fallback_category(),
        }
    }
}

/// One entry of the category taxonomy
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoryEntry {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the JSON export file
    #[serde(rename = "export-path")]
    pub export_path: String,

    /// Split the export into several files
    #[serde(rename = "chunked-export", default)]
    pub chunked_export: bool,

    /// Documents per export file; setting it implies `chunked-export`
    #[serde(rename = "export-chunk-size", default)]
    pub export_chunk_size: Option<usize>,

    /// Optional markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

impl OutputConfig {
    /// Chunk size for the export, or `None` for a single file
    pub fn export_chunking(&self) -> Option<usize> {
        match self.export_chunk_size {
            Some(size) => Some(size),
            None if self.chunked_export => Some(DEFAULT_EXPORT_CHUNK_SIZE),
            None => None,
        }
    }
}

/// Documents per export file when chunking is enabled without a size
pub const DEFAULT_EXPORT_CHUNK_SIZE: usize = 100;

fn default_progress_interval() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_backoff_base_ms() -> u64 {
    1000
}

fn default_backoff_max_ms() -> u64 {
    10_000
}

fn default_min_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    2000
}

fn default_user_agent() -> String {
    format!("id-sweep/{}", env!("CARGO_PKG_VERSION"))
}

fn default_min_content_length() -> usize {
    100
}

fn default_min_paragraph_length() -> usize {
    20
}

fn default_title_min_length() -> usize {
    3
}

fn default_title_max_length() -> usize {
    200
}

fn default_title_selectors() -> Vec<String> {
    [
        "h1",
        ".story-title",
        ".post-title",
        ".entry-title",
        ".title",
        "title",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_content_selectors() -> Vec<String> {
    [
        "article",
        ".story-content",
        ".post-content",
        ".entry-content",
        ".article-content",
        ".content",
        "#content",
        "main",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_boilerplate() -> Vec<String> {
    [
        "All rights reserved",
        "Copyright",
        "©",
        "Return to home",
        "Back to top",
        "版权所有",
        "返回首页",
        "返回顶部",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_prefix_length() -> usize {
    500
}

fn default_fallback_category() -> String {
    "other".to_string()
}

/// Built-in taxonomy, in tie-break order
pub fn default_taxonomy() -> Vec<CategoryEntry> {
    let entry = |name: &str, keywords: &[&str]| CategoryEntry {
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
    };

    vec![
        entry(
            "love",
            &["love", "romance", "wedding", "爱情", "恋爱", "情侣", "结婚", "约会"],
        ),
        entry(
            "horror",
            &["horror", "ghost", "haunted", "恐怖", "鬼", "灵异", "惊悚"],
        ),
        entry(
            "fable",
            &["fable", "moral", "fox", "crow", "寓言", "道理", "启示"],
        ),
        entry(
            "history",
            &["history", "dynasty", "emperor", "ancient", "历史", "朝代", "皇帝"],
        ),
    ]
}
