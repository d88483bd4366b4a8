//! Result accumulation for a crawl session
//!
//! The sink is shared by every fetch task. Appends happen under one lock and
//! records keep completion order, which is not discovery order: ordering by
//! discovery would mean buffering every in-flight fetch.

use crate::adapter::Category;
use crate::output::records::{ArticleRecord, ErrorRecord, FetchReport, Outcome};
use crate::state::FrontierState;
use crate::WartaError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionStatus {
    /// Still running; snapshots are not available yet
    Running,
    /// Every frontier finished and every dispatched fetch resolved
    Completed,
    /// Aborted by an external cancellation signal
    Cancelled,
    /// The session-level timeout fired
    TimedOut,
    /// Too many consecutive failures
    CircuitOpen,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
            Self::CircuitOpen => "circuit open",
        };
        write!(f, "{}", name)
    }
}

/// Final state of one category frontier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierReport {
    pub category: Category,
    pub state: FrontierState,
    pub pages_fetched: u32,
    pub links_yielded: usize,
    pub page_hint: Option<u32>,
    pub error: Option<String>,
}

/// Session metadata accompanying an export
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub site: String,
    pub date_filter: String,
    pub status: SessionStatus,
    /// Article fetches dispatched to workers
    pub total_requested: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
    /// Dispatched fetches aborted by cancellation before they resolved
    pub total_abandoned: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: Option<String>,
}

/// Read-only copy of a finished session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub metadata: SessionMetadata,
    pub categories_requested: Vec<Category>,
    pub seen_urls: BTreeSet<String>,
    /// Articles in completion order
    pub articles: Vec<ArticleRecord>,
    /// Failed article fetches in completion order
    pub errors: Vec<ErrorRecord>,
    /// Discovery and category-selection failures; never article fetches
    pub discovery_errors: Vec<ErrorRecord>,
    pub frontiers: Vec<FrontierReport>,
}

impl SessionSnapshot {
    /// Articles discovered under the given category id
    pub fn articles_in(&self, category_id: &str) -> impl Iterator<Item = &ArticleRecord> {
        let category_id = category_id.to_string();
        self.articles
            .iter()
            .filter(move |a| a.category.id == category_id)
    }

    /// Fraction of resolved fetches that produced an article, in percent
    pub fn success_rate(&self) -> f64 {
        let resolved = self.articles.len() + self.errors.len();
        if resolved == 0 {
            return 0.0;
        }
        (self.articles.len() as f64 / resolved as f64) * 100.0
    }
}

#[derive(Debug)]
struct SinkState {
    site: String,
    date_filter: String,
    config_hash: Option<String>,
    categories_requested: Vec<Category>,
    articles: Vec<ArticleRecord>,
    errors: Vec<ErrorRecord>,
    discovery_errors: Vec<ErrorRecord>,
    frontiers: Vec<FrontierReport>,
    seen_urls: BTreeSet<String>,
    dispatched: usize,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

/// Thread-safe accumulator of session outcomes
#[derive(Debug)]
pub struct ResultSink {
    state: Mutex<SinkState>,
}

impl ResultSink {
    /// Starts a new session record
    pub fn new(site: impl Into<String>, date_filter: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SinkState {
                site: site.into(),
                date_filter: date_filter.into(),
                config_hash: None,
                categories_requested: Vec::new(),
                articles: Vec::new(),
                errors: Vec::new(),
                discovery_errors: Vec::new(),
                frontiers: Vec::new(),
                seen_urls: BTreeSet::new(),
                dispatched: 0,
                status: SessionStatus::Running,
                started_at: Utc::now(),
                finished_at: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_config_hash(&self, hash: Option<String>) {
        self.lock().config_hash = hash;
    }

    pub fn set_categories(&self, categories: Vec<Category>) {
        self.lock().categories_requested = categories;
    }

    /// Counts one article fetch handed to a worker
    pub fn note_dispatched(&self) {
        self.lock().dispatched += 1;
    }

    /// Appends the outcome of a dispatched fetch
    pub fn record(&self, report: FetchReport) {
        let mut state = self.lock();
        if state.finished_at.is_some() {
            tracing::warn!(url = report.outcome.url(), "Outcome arrived after session finished");
            return;
        }

        match report.outcome {
            Outcome::Article(article) => state.articles.push(article),
            Outcome::Error(error) => state.errors.push(error),
        }
    }

    /// Appends a discovery or category-selection failure
    pub fn record_discovery_error(&self, error: ErrorRecord) {
        self.lock().discovery_errors.push(error);
    }

    pub fn record_frontier(&self, report: FrontierReport) {
        self.lock().frontiers.push(report);
    }

    /// Returns (dispatched, succeeded, failed) so far
    pub fn counts(&self) -> (usize, usize, usize) {
        let state = self.lock();
        (state.dispatched, state.articles.len(), state.errors.len())
    }

    /// Declares the session complete; later outcomes are ignored
    pub fn finish(&self, status: SessionStatus, seen_urls: BTreeSet<String>) {
        let mut state = self.lock();
        state.status = status;
        state.seen_urls = seen_urls;
        state.finished_at = Some(Utc::now());
    }

    /// Returns a copy of the finished session
    ///
    /// # Errors
    ///
    /// `WartaError::SessionInProgress` until `finish` has been called.
    pub fn snapshot(&self) -> Result<SessionSnapshot, WartaError> {
        let state = self.lock();
        let finished_at = state.finished_at.ok_or(WartaError::SessionInProgress)?;

        let resolved = state.articles.len() + state.errors.len();
        let metadata = SessionMetadata {
            site: state.site.clone(),
            date_filter: state.date_filter.clone(),
            status: state.status,
            total_requested: state.dispatched,
            total_succeeded: state.articles.len(),
            total_failed: state.errors.len(),
            total_abandoned: state.dispatched.saturating_sub(resolved),
            started_at: state.started_at,
            finished_at,
            config_hash: state.config_hash.clone(),
        };

        Ok(SessionSnapshot {
            metadata,
            categories_requested: state.categories_requested.clone(),
            seen_urls: state.seen_urls.clone(),
            articles: state.articles.clone(),
            errors: state.errors.clone(),
            discovery_errors: state.discovery_errors.clone(),
            frontiers: state.frontiers.clone(),
        })
    }
}
