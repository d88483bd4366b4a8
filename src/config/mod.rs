//! Configuration module for Warta
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section has defaults, so an empty file (or no file) is a valid setup.
//!
//! # Example
//!
//! ```no_run
//! use warta::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("warta.toml")).unwrap();
//! println!("Fetch workers: {}", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DedupConfig, HttpConfig, OutputConfig, PolitenessConfig, RetryConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
