//! Shared helpers for the integration tests

use async_trait::async_trait;
use id_sweep::config::{parse_config, Config};
use id_sweep::crawler::{CrawlTarget, FailureReason, FetchOutcome, Fetcher};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Serves canned pages by id; unknown ids fail like an exhausted retry loop
pub struct ScriptedFetcher {
    pages: Mutex<HashMap<i64, String>>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    delay: Duration,
}

impl ScriptedFetcher {
    pub fn new(pages: HashMap<i64, String>) -> Self {
        Self {
            pages: Mutex::new(pages),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            delay: Duration::from_millis(5),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Replaces the page served for `id`
    pub fn set_page(&self, id: i64, body: String) {
        self.pages.lock().unwrap().insert(id, body);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, target: &CrawlTarget) -> FetchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let page = self.pages.lock().unwrap().get(&target.id).cloned();
        match page {
            Some(raw_body) => FetchOutcome::Success {
                status_code: 200,
                content_type: "text/html; charset=utf-8".to_string(),
                raw_body,
            },
            None => FetchOutcome::Failure {
                reason: FailureReason::BadStatus(503),
            },
        }
    }
}

/// Builds a validated config whose store and export live under `dir`
pub fn create_test_config(dir: &Path, start: i64, end: i64, workers: u32) -> Config {
    let db = dir.join("sweep.db");
    let export = dir.join("stories.json");
    parse_config(&format!(
        r#"
[crawler]
start-id = {start}
end-id = {end}
max-workers = {workers}
progress-interval = 2

[fetcher]
url-template = "https://stories.example.com/story?id={{id}}"
min-delay-ms = 0
max-delay-ms = 0

[output]
database-path = "{}"
export-path = "{}"
"#,
        db.display(),
        export.display()
    ))
    .unwrap()
}

/// A page with an `<h1>` title and an `<article>` body of `body_len` chars
pub fn story_page(title: &str, body_len: usize) -> String {
    format!(
        r#"<html>
<head><title>{title} - Story Site</title></head>
<body>
  <nav><a href="/">Home</a></nav>
  <h1>{title}</h1>
  <article>{}</article>
  <footer>Copyright Story Site</footer>
</body>
</html>"#,
        "x".repeat(body_len)
    )
}
