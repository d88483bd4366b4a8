//! Output module for crawl results
//!
//! This module handles:
//! - The record types every dispatched URL resolves to
//! - Accumulating outcomes into a session snapshot
//! - Exporting snapshots as JSON and printing statistics

mod export;
mod records;
mod sink;
pub mod stats;

pub use export::{default_export_path, write_session_json};
pub use records::{
    fields, ArticleImage, ArticleRecord, ErrorKind, ErrorRecord, FetchReport, Outcome,
};
pub use sink::{FrontierReport, ResultSink, SessionMetadata, SessionSnapshot, SessionStatus};
pub use stats::{load_statistics, print_statistics, SessionStatistics};
