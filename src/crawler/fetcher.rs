//! Fetching with retry
//!
//! [`PageFetcher`] issues rate-limited GET requests and retries transient
//! failures with exponential backoff. [`ArticleFetcher`] builds on it to turn
//! one article URL into exactly one outcome.
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Timeout, connection failure | Retry with backoff |
//! | HTTP 429 | Retry with backoff, host marked as throttling |
//! | HTTP 5xx | Retry with backoff |
//! | Other HTTP 4xx/3xx | Fail immediately |
//! | Invalid request | Fail immediately |
//! | Malformed article page | Fail immediately, no refetch |

use crate::adapter::SiteAdapter;
use crate::config::RetryConfig;
use crate::crawler::frontier::LinkCandidate;
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::transport::Transport;
use crate::output::{ArticleRecord, ErrorKind, ErrorRecord, FetchReport, Outcome};
use crate::ExtractError;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

/// Exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.backoff_multiplier.max(1),
        }
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Returns true for HTTP statuses worth retrying
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: String,
    pub final_url: String,
    pub attempts: u32,
}

/// A request that failed for good
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub message: String,
    pub attempts: u32,
    /// Last HTTP status, when the server answered at all
    pub status: Option<u16>,
}

/// Rate-limited GET with retry, shared by listing and article fetches
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
}

impl PageFetcher {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            policy,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches `url`, retrying transient failures
    ///
    /// Each attempt holds a host permit only while its request is open; the
    /// backoff sleep happens with no permit held.
    pub async fn get_with_retry(&self, url: &str) -> Result<Fetched, FetchFailure> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = {
                let _permit = self.limiter.acquire(url).await;
                self.transport.get(url).await
            };

            let (message, status, transient) = match result {
                Ok(page) if page.is_success() => {
                    tracing::debug!(url, attempt, "Fetched");
                    return Ok(Fetched {
                        body: page.body,
                        final_url: page.final_url,
                        attempts: attempt,
                    });
                }
                Ok(page) => {
                    if page.status == 429 {
                        self.limiter.record_throttled(url);
                    }
                    (
                        format!("HTTP {}", page.status),
                        Some(page.status),
                        is_transient_status(page.status),
                    )
                }
                Err(e) => (e.to_string(), None, e.is_transient()),
            };

            if !transient || attempt >= self.policy.max_attempts {
                tracing::debug!(url, attempt, error = %message, "Giving up");
                return Err(FetchFailure {
                    message,
                    attempts: attempt,
                    status,
                });
            }

            let delay = self.policy.backoff(attempt);
            tracing::debug!(
                url,
                attempt,
                error = %message,
                delay_ms = delay.as_millis() as u64,
                "Transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Turns an article URL into an article record or an error record
pub struct ArticleFetcher {
    pages: Arc<PageFetcher>,
    adapter: Arc<dyn SiteAdapter>,
}

impl ArticleFetcher {
    pub fn new(pages: Arc<PageFetcher>, adapter: Arc<dyn SiteAdapter>) -> Self {
        Self { pages, adapter }
    }

    /// Fetches and extracts one candidate
    ///
    /// The returned record always carries the category the link was
    /// discovered under.
    pub async fn fetch(&self, candidate: &LinkCandidate) -> FetchReport {
        let url = candidate.raw_url.as_str();
        let category = candidate.discovered_in_category.clone();

        let fetched = match self.pages.get_with_retry(url).await {
            Ok(fetched) => fetched,
            Err(failure) => {
                tracing::warn!(url, attempts = failure.attempts, error = %failure.message, "Article fetch failed");
                return FetchReport {
                    outcome: Outcome::Error(ErrorRecord {
                        url: url.to_string(),
                        category,
                        error_kind: ErrorKind::Network,
                        message: failure.message,
                        attempts: failure.attempts,
                    }),
                    attempts: failure.attempts,
                };
            }
        };

        match extract(self.adapter.as_ref(), &fetched.body, url) {
            Ok(mut record) => {
                record.category = category;
                if !record.extraction_warnings.is_empty() {
                    tracing::debug!(url, missing = ?record.extraction_warnings, "Article extracted partially");
                }
                FetchReport {
                    outcome: Outcome::Article(record),
                    attempts: fetched.attempts,
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Page is not an article");
                FetchReport {
                    outcome: Outcome::Error(ErrorRecord {
                        url: url.to_string(),
                        category,
                        error_kind: ErrorKind::Parse,
                        message: e.to_string(),
                        attempts: fetched.attempts,
                    }),
                    attempts: fetched.attempts,
                }
            }
        }
    }
}

fn extract(adapter: &dyn SiteAdapter, body: &str, url: &str) -> Result<ArticleRecord, ExtractError> {
    let document = Html::parse_document(body);
    adapter.extract_article(&document, url)
}
