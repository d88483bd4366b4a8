//! Warta: a polite news-index crawler
//!
//! This crate enumerates article links from paginated news-index pages,
//! fetches and extracts each article into a uniform record, and tolerates
//! partial failures at the article, page and category level. Site specifics
//! live in small declarative adapters; the crawl engine is shared.

pub mod adapter;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Warta operations
#[derive(Debug, Error)]
pub enum WartaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawl error: {0}")]
    Crawl(#[from] CrawlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session has not finished yet")]
    SessionInProgress,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unknown site: {0}")]
    UnknownSite(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Errors an adapter reports while reading a document
///
/// Missing optional fields are not errors; they become extraction warnings on
/// the article record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractError {
    /// The page is not recognizable as an article at all
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// A structural anchor the adapter relies on is absent
    #[error("Missing structural anchor: {0}")]
    MissingAnchor(String),
}

/// Crawl failures, each contained at the smallest unit that makes sense
#[derive(Debug, Clone, Error)]
pub enum CrawlError {
    /// Category index unreachable or unrecognizable
    #[error("Category discovery failed for {url}: {message}")]
    Discovery {
        url: String,
        message: String,
        attempts: u32,
    },

    /// A listing page failed after retries; the frontier stops
    #[error("Pagination failed at page {page} ({url}): {message}")]
    Pagination {
        url: String,
        page: u32,
        message: String,
    },

    /// Transient network failure, terminal after retries are exhausted
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The article page could not be read as an article
    #[error("Malformed document at {url}: {message}")]
    MalformedDocument { url: String, message: String },
}

/// Result type alias for Warta operations
pub type Result<T> = std::result::Result<T, WartaError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use adapter::{Category, Site, SiteAdapter};
pub use config::Config;
pub use crawler::{run_crawl, CategorySelector, Coordinator, CrawlRequest};
pub use output::{ArticleRecord, ErrorKind, ErrorRecord, SessionSnapshot};
pub use url::canonicalize_url;
