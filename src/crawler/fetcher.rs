//! HTTP fetcher implementation
//!
//! This module handles all network retrieval for the crawler, including:
//! - Deriving a target URL from an id and the URL template
//! - Building HTTP clients with the configured user agent and timeouts
//! - A randomized delay before every request
//! - Retry with exponential backoff and jitter
//! - Classifying responses into success, `bad_status` or `transport`

use crate::config::{FetcherConfig, ID_PLACEHOLDER};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// One id of the crawl range and the URL it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub id: i64,
    pub url: String,
}

impl CrawlTarget {
    /// Builds a target by substituting `id` into the URL template
    pub fn from_template(id: i64, template: &str) -> Self {
        Self {
            id,
            url: template.replacen(ID_PLACEHOLDER, &id.to_string(), 1),
        }
    }
}

/// Why a fetch produced no body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a status other than 200
    BadStatus(u16),

    /// Connection, timeout, or body read error
    Transport(String),
}

impl FailureReason {
    /// Short reason code used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadStatus(_) => "bad_status",
            Self::Transport(_) => "transport",
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::BadStatus(code) => {
                *code == StatusCode::TOO_MANY_REQUESTS.as_u16() || (500..600).contains(code)
            }
            Self::Transport(_) => true,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadStatus(code) => write!(f, "bad_status (HTTP {})", code),
            Self::Transport(error) => write!(f, "transport ({})", error),
        }
    }
}

/// Result of fetching one target, after retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Success {
        status_code: u16,
        content_type: String,
        raw_body: String,
    },
    Failure {
        reason: FailureReason,
    },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// A network retrieval capability
///
/// Implementations own their retry policy; the outcome they return is final
/// for the target in the current run.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, target: &CrawlTarget) -> FetchOutcome;
}

/// Attempt limits and delays for `HttpFetcher`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base_ms: config.backoff_base_ms,
            backoff_max_ms: config.backoff_max_ms,
            min_delay_ms: config.min_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// Delay before the retry that follows failed attempt number `attempt`
    /// (1-based): `base * 2^(attempt - 1)` plus up to half of `base` of
    /// jitter, never more than `backoff_max_ms`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let exponential = self.backoff_base_ms.saturating_mul(1u64 << exponent);
        let jitter = random_ms(0, self.backoff_base_ms / 2);

        Duration::from_millis(exponential.saturating_add(jitter).min(self.backoff_max_ms))
    }

    /// Randomized politeness delay taken before every request
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(random_ms(self.min_delay_ms, self.max_delay_ms))
    }
}

fn random_ms(min: u64, max: u64) -> u64 {
    if max <= min {
        return min;
    }
    rand::random_range(min..=max)
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Outcome of a single HTTP attempt
enum Attempt {
    Done(FetchOutcome),
    Failed(FailureReason),
}

/// `Fetcher` backed by reqwest
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 200 | Success |
/// | HTTP 429, 5xx | Retry with backoff, then `bad_status` |
/// | Any other status | Immediate `bad_status` |
/// | Timeout, connect, body read error | Retry with backoff, then `transport` |
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            policy: RetryPolicy::from_config(config),
        })
    }

    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Failed(FailureReason::Transport(describe_error(&e))),
        };

        let status = response.status();
        if status != StatusCode::OK {
            return Attempt::Failed(FailureReason::BadStatus(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        match response.text().await {
            Ok(raw_body) => Attempt::Done(FetchOutcome::Success {
                status_code: status.as_u16(),
                content_type,
                raw_body,
            }),
            Err(e) => Attempt::Failed(FailureReason::Transport(describe_error(&e))),
        }
    }
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error.to_string()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, target: &CrawlTarget) -> FetchOutcome {
        let mut attempt_number = 1;

        loop {
            tokio::time::sleep(self.policy.request_delay()).await;

            let reason = match self.attempt(&target.url).await {
                Attempt::Done(outcome) => return outcome,
                Attempt::Failed(reason) => reason,
            };

            if !reason.is_retryable() || attempt_number >= self.policy.max_attempts {
                return FetchOutcome::Failure { reason };
            }

            let delay = self.policy.backoff_delay(attempt_number);
            tracing::warn!(
                "Attempt {}/{} for id {} failed: {}; retrying in {:?}",
                attempt_number,
                self.policy.max_attempts,
                target.id,
                reason,
                delay
            );
            tokio::time::sleep(delay).await;
            attempt_number += 1;
        }
    }
}
