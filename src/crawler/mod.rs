//! Crawl engine for paginated news indexes
//!
//! This module contains the site-independent crawling logic, including:
//! - HTTP transport and fetching with retry
//! - Per-host rate limiting
//! - Category discovery and per-category pagination
//! - Session coordination with a bounded worker pool

mod breaker;
mod coordinator;
mod discovery;
mod fetcher;
mod frontier;
mod rate_limiter;
mod transport;

#[cfg(test)]
mod testing;

pub use breaker::FailureBreaker;
pub use coordinator::{run_crawl, Coordinator, CrawlRequest};
pub use discovery::{discover_categories, select_categories, CategorySelector};
pub use fetcher::{is_transient_status, ArticleFetcher, FetchFailure, Fetched, PageFetcher, RetryPolicy};
pub use frontier::{LinkCandidate, LinkFrontier, PageRequest};
pub use rate_limiter::{HostPermit, RateLimiter};
pub use transport::{FetchedPage, HttpTransport, Transport, TransportError};
