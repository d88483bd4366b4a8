//! URL handling module for Warta
//!
//! This module provides canonicalization for duplicate detection and host
//! extraction for per-host politeness.

mod canonical;
mod domain;

// Re-export main functions
pub use canonical::canonicalize_url;
pub use domain::{extract_host, host_key};
