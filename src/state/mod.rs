//! State module for tracking crawl progress
//!
//! This module provides the shared and per-task state used during a session.
//!
//! # Components
//!
//! - `FrontierState`: Pagination state of one category frontier
//! - `HostState`: Per-host request spacing and in-flight ceiling
//! - `Deduplicator`: Session-wide set of canonical article URLs

mod frontier_state;
mod host_state;
mod seen;

// Re-export main types
pub use frontier_state::FrontierState;
pub use host_state::HostState;
pub use seen::Deduplicator;
