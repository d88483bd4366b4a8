//! Session statistics
//!
//! Computes and prints a summary of a finished session.

use crate::output::records::ErrorKind;
use crate::output::sink::SessionSnapshot;
use std::collections::{BTreeMap, HashMap};

/// Per-session statistics summary
#[derive(Debug, Clone)]
pub struct SessionStatistics {
    /// Article fetches dispatched
    pub total_requested: usize,

    /// Articles extracted
    pub total_succeeded: usize,

    /// Article fetches that produced an error record
    pub total_failed: usize,

    /// Fetches aborted before they resolved
    pub total_abandoned: usize,

    /// Article count per category name
    pub articles_by_category: BTreeMap<String, usize>,

    /// Error count per kind
    pub errors_by_kind: HashMap<ErrorKind, usize>,

    /// How often each field was missing from an otherwise readable article
    pub warnings_by_field: BTreeMap<String, usize>,

    /// Listing pages requested across all frontiers
    pub pages_fetched: u32,

    /// Categories whose frontier stopped on a pagination error
    pub failed_frontiers: Vec<String>,
}

/// Computes statistics from a snapshot
pub fn load_statistics(snapshot: &SessionSnapshot) -> SessionStatistics {
    let mut articles_by_category = BTreeMap::new();
    let mut warnings_by_field = BTreeMap::new();
    for article in &snapshot.articles {
        *articles_by_category
            .entry(article.category.name.clone())
            .or_insert(0) += 1;
        for field in &article.extraction_warnings {
            *warnings_by_field.entry(field.clone()).or_insert(0) += 1;
        }
    }

    let mut errors_by_kind = HashMap::new();
    for error in snapshot.errors.iter().chain(&snapshot.discovery_errors) {
        *errors_by_kind.entry(error.error_kind).or_insert(0) += 1;
    }

    let failed_frontiers = snapshot
        .frontiers
        .iter()
        .filter(|f| f.error.is_some())
        .map(|f| f.category.name.clone())
        .collect();

    SessionStatistics {
        total_requested: snapshot.metadata.total_requested,
        total_succeeded: snapshot.metadata.total_succeeded,
        total_failed: snapshot.metadata.total_failed,
        total_abandoned: snapshot.metadata.total_abandoned,
        articles_by_category,
        errors_by_kind,
        warnings_by_field,
        pages_fetched: snapshot.frontiers.iter().map(|f| f.pages_fetched).sum(),
        failed_frontiers,
    }
}

/// Prints statistics for a finished session to stdout
pub fn print_statistics(snapshot: &SessionSnapshot) {
    let stats = load_statistics(snapshot);
    let meta = &snapshot.metadata;

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Site: {}", meta.site);
    println!("  Date: {}", meta.date_filter);
    println!("  Status: {}", meta.status);
    println!(
        "  Duration: {}s",
        (meta.finished_at - meta.started_at).num_seconds()
    );
    println!("  Categories: {}", snapshot.categories_requested.len());
    println!("  Listing pages fetched: {}", stats.pages_fetched);
    println!("  Unique article URLs: {}", snapshot.seen_urls.len());
    println!();

    println!("Articles:");
    println!("  Requested: {}", stats.total_requested);
    println!("  Succeeded: {}", stats.total_succeeded);
    println!("  Failed: {}", stats.total_failed);
    if stats.total_abandoned > 0 {
        println!("  Abandoned: {}", stats.total_abandoned);
    }
    println!();

    if !stats.articles_by_category.is_empty() {
        println!("Articles by Category:");
        let mut counts: Vec<_> = stats.articles_by_category.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (name, count) in counts {
            println!("  {}: {}", name, count);
        }
        println!();
    }

    if !stats.errors_by_kind.is_empty() {
        println!("Error Summary:");
        let mut counts: Vec<_> = stats.errors_by_kind.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in counts {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    if !stats.warnings_by_field.is_empty() {
        println!("Missing Fields:");
        for (field, count) in &stats.warnings_by_field {
            println!("  {}: {}", field, count);
        }
        println!();
    }

    if !stats.failed_frontiers.is_empty() {
        println!(
            "Categories Stopped Early ({}):",
            stats.failed_frontiers.len()
        );
        for name in &stats.failed_frontiers {
            println!("  - {}", name);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} articles extracted)",
        snapshot.success_rate(),
        stats.total_succeeded,
        stats.total_succeeded + stats.total_failed
    );
}
