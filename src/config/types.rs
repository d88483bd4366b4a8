use serde::Deserialize;
use std::time::Duration;

/// Built-in agent used when the configured pool is empty
pub const DEFAULT_USER_AGENT: &str = concat!("Warta/", env!("CARGO_PKG_VERSION"));

/// Main configuration structure for Warta
///
/// Every section is optional; `Config::default()` is a complete, polite
/// engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub politeness: PolitenessConfig,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    pub dedup: DedupConfig,
    pub output: OutputConfig,
}

/// Worker pool and session behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Number of article fetches allowed in flight at once
    pub workers: u32,

    /// Number of category frontiers paginating concurrently
    pub max_concurrent_frontiers: u32,

    /// Capacity of the bounded link queue between frontiers and workers
    pub queue_capacity: u32,

    /// Consecutive failed fetches that abort the session (0 disables)
    pub max_consecutive_failures: u32,

    /// How long in-flight fetches may run after cancellation (milliseconds)
    pub cancel_grace_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_concurrent_frontiers: 2,
            queue_capacity: 64,
            max_consecutive_failures: 25,
            cancel_grace_ms: 2_000,
        }
    }
}

impl CrawlerConfig {
    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }
}

/// Per-host request pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolitenessConfig {
    /// Minimum time between request starts to the same host (milliseconds)
    pub min_request_spacing_ms: u64,

    /// Maximum concurrent requests to the same host
    pub max_in_flight_per_host: u32,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            min_request_spacing_ms: 500,
            max_in_flight_per_host: 2,
        }
    }
}

impl PolitenessConfig {
    pub fn min_request_spacing(&self) -> Duration {
        Duration::from_millis(self.min_request_spacing_ms)
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// User agents rotated round-robin, one per request
    pub user_agents: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agents: vec![DEFAULT_USER_AGENT.to_string()],
        }
    }
}

/// Retry policy for transient failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay after the first failed attempt (milliseconds)
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after each further failure
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            backoff_multiplier: 2,
        }
    }
}

/// URL canonicalization settings for deduplication
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DedupConfig {
    /// Query parameters dropped before comparing URLs
    pub tracking_params: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the exported session files are written to
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./output".to_string(),
        }
    }
}
