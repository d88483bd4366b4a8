//! Crawl coordinator - session orchestration
//!
//! The coordinator ties the pieces of a session together:
//! - Discovering categories once and applying the category selector
//! - Running one [`LinkFrontier`] per selected category, a few at a time
//! - Feeding link candidates through a bounded queue to a fixed worker pool
//! - Deduplicating before dispatch and recording every outcome
//! - Honoring cancellation, the session timeout and the circuit breaker
//!
//! A session always ends in a [`SessionSnapshot`]. Failures are contained at
//! the article, page or category level; only cancellation (external, timeout
//! or circuit breaker) stops a session early.

use crate::adapter::{Category, SiteAdapter};
use crate::config::Config;
use crate::crawler::breaker::FailureBreaker;
use crate::crawler::discovery::{discover_categories, select_categories, CategorySelector};
use crate::crawler::fetcher::{ArticleFetcher, PageFetcher, RetryPolicy};
use crate::crawler::frontier::{LinkCandidate, LinkFrontier};
use crate::crawler::rate_limiter::RateLimiter;
use crate::crawler::transport::{HttpTransport, Transport};
use crate::output::{ErrorKind, ErrorRecord, ResultSink, SessionSnapshot, SessionStatus};
use crate::state::Deduplicator;
use crate::{CrawlError, WartaError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;

/// Parameters of one crawl session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    /// Date in the site's native format, passed through to listing URLs
    pub date_filter: String,
    pub categories: CategorySelector,
    pub max_pages_per_category: Option<u32>,
    /// Counted after deduplication
    pub max_articles_per_category: Option<usize>,
    pub timeout: Option<Duration>,
}

impl CrawlRequest {
    pub fn new(date_filter: impl Into<String>) -> Self {
        Self {
            date_filter: date_filter.into(),
            categories: CategorySelector::All,
            max_pages_per_category: None,
            max_articles_per_category: None,
            timeout: None,
        }
    }

    pub fn with_categories(mut self, categories: CategorySelector) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages_per_category = max_pages;
        self
    }

    pub fn with_max_articles(mut self, max_articles: Option<usize>) -> Self {
        self.max_articles_per_category = max_articles;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Main crawl coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    config_hash: Option<String>,
    adapter: Arc<dyn SiteAdapter>,
    pages: Arc<PageFetcher>,
    dedup: Arc<Deduplicator>,
    breaker: Arc<FailureBreaker>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a coordinator that talks to the network over HTTP
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built from `config.http`.
    pub fn new(config: Config, adapter: Arc<dyn SiteAdapter>) -> Result<Self, WartaError> {
        let transport = HttpTransport::new(&config.http)?;
        Ok(Self::with_transport(config, adapter, Arc::new(transport)))
    }

    /// Creates a coordinator over any transport
    pub fn with_transport(
        config: Config,
        adapter: Arc<dyn SiteAdapter>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.politeness.clone()));
        let pages = Arc::new(PageFetcher::new(
            transport,
            limiter,
            RetryPolicy::from_config(&config.retry),
        ));
        let dedup = Arc::new(Deduplicator::new(config.dedup.tracking_params.clone()));
        let breaker = Arc::new(FailureBreaker::new(
            config.crawler.max_consecutive_failures,
        ));

        Self {
            config: Arc::new(config),
            config_hash: None,
            adapter,
            pages,
            dedup,
            breaker,
            cancel: CancellationToken::new(),
        }
    }

    /// Stamps exported sessions with the hash of the config file they ran under
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Token that cancels the session when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Lists the site's categories without crawling
    pub async fn discover(&self) -> Result<Vec<Category>, CrawlError> {
        discover_categories(self.adapter.as_ref(), &self.pages).await
    }

    /// Runs one crawl session to completion or cancellation
    ///
    /// # Errors
    ///
    /// Individual failures end up in the snapshot; an error here means the
    /// session itself could not be assembled.
    pub async fn run(self, request: CrawlRequest) -> Result<SessionSnapshot, WartaError> {
        let site = self.adapter.site();
        tracing::info!(site = %site, date = %request.date_filter, "Starting crawl session");

        let sink = Arc::new(ResultSink::new(site.as_str(), request.date_filter.clone()));
        sink.set_config_hash(self.config_hash.clone());

        let timed_out = Arc::new(AtomicBool::new(false));
        let watchdog = request
            .timeout
            .map(|limit| spawn_watchdog(limit, self.cancel.clone(), Arc::clone(&timed_out)));

        let categories = self.resolve_categories(&request, &sink).await;
        sink.set_categories(categories.clone());

        let (tx, rx) = mpsc::channel(self.config.crawler.queue_capacity.max(1) as usize);
        let mut frontiers = JoinSet::new();
        let mut frontier_stops = HashMap::new();
        let slots = Arc::new(Semaphore::new(
            self.config.crawler.max_concurrent_frontiers.max(1) as usize,
        ));

        for category in categories {
            let stop = self.cancel.child_token();
            frontier_stops.insert(category.id.clone(), stop.clone());

            let frontier = LinkFrontier::new(
                Arc::clone(&self.adapter),
                Arc::clone(&self.pages),
                Arc::clone(&self.dedup),
                category,
                request.date_filter.clone(),
            )
            .with_max_pages(request.max_pages_per_category);

            frontiers.spawn(drive_frontier(
                frontier,
                tx.clone(),
                Arc::clone(&slots),
                stop,
                Arc::clone(&sink),
            ));
        }
        drop(tx);

        self.dispatch(rx, &request, &frontier_stops, &sink).await;

        let grace = self.config.crawler.cancel_grace();
        finish_tasks(&mut frontiers, grace, "frontier").await;

        if let Some(watchdog) = watchdog {
            watchdog.abort();
        }

        let status = if self.breaker.is_tripped() {
            SessionStatus::CircuitOpen
        } else if timed_out.load(Ordering::SeqCst) {
            SessionStatus::TimedOut
        } else if self.cancel.is_cancelled() {
            SessionStatus::Cancelled
        } else {
            SessionStatus::Completed
        };

        sink.finish(status, self.dedup.snapshot());
        let snapshot = sink.snapshot()?;

        tracing::info!(
            status = %status,
            requested = snapshot.metadata.total_requested,
            succeeded = snapshot.metadata.total_succeeded,
            failed = snapshot.metadata.total_failed,
            abandoned = snapshot.metadata.total_abandoned,
            "Crawl session finished"
        );

        Ok(snapshot)
    }

    /// Discovers categories and applies the request's selector
    ///
    /// Discovery failures and unmatched tokens become discovery error records.
    async fn resolve_categories(&self, request: &CrawlRequest, sink: &ResultSink) -> Vec<Category> {
        let discovered = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                tracing::info!("Cancelled before category discovery finished");
                return Vec::new();
            }
            result = self.discover() => result,
        };

        let discovered = match discovered {
            Ok(discovered) => discovered,
            Err(e) => {
                tracing::error!(error = %e, "Category discovery failed");
                sink.record_discovery_error(discovery_record(e, &self.adapter.category_index_url()));
                return Vec::new();
            }
        };

        let (selected, unmatched) = select_categories(discovered, &request.categories);
        for token in unmatched {
            tracing::warn!(token = %token, "No category matches selector");
            sink.record_discovery_error(ErrorRecord {
                url: self.adapter.category_index_url(),
                category: Category::new("", token.clone(), ""),
                error_kind: ErrorKind::Discovery,
                message: format!("No category matches '{}'", token),
                attempts: 0,
            });
        }

        tracing::info!(count = selected.len(), "Categories selected");
        selected
    }

    /// Pulls candidates off the queue and hands them to fetch workers
    ///
    /// Returns once every frontier has closed its sender and every dispatched
    /// fetch has resolved, or once cancellation has run its grace period out.
    async fn dispatch(
        &self,
        mut rx: mpsc::Receiver<LinkCandidate>,
        request: &CrawlRequest,
        frontier_stops: &HashMap<String, CancellationToken>,
        sink: &Arc<ResultSink>,
    ) {
        let articles = Arc::new(ArticleFetcher::new(
            Arc::clone(&self.pages),
            Arc::clone(&self.adapter),
        ));
        let workers = Arc::new(Semaphore::new(self.config.crawler.workers.max(1) as usize));
        let mut fetches = JoinSet::new();
        let mut dispatched_per_category: HashMap<String, usize> = HashMap::new();
        let mut completed = 0usize;
        let start_time = Instant::now();

        'dispatch: loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break 'dispatch,
                Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                    log_join_error("fetch", joined);
                    completed += 1;
                    if completed % 10 == 0 {
                        let (requested, succeeded, failed) = sink.counts();
                        let per_sec = completed as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(requested, succeeded, failed, per_sec, "Progress");
                    }
                }
                received = rx.recv() => {
                    let Some(candidate) = received else {
                        break 'dispatch;
                    };
                    let category_id = candidate.discovered_in_category.id.clone();

                    let so_far = dispatched_per_category.get(&category_id).copied().unwrap_or(0);
                    if request.max_articles_per_category.is_some_and(|cap| so_far >= cap) {
                        if let Some(stop) = frontier_stops.get(&category_id) {
                            stop.cancel();
                        }
                        continue 'dispatch;
                    }

                    let permit = tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break 'dispatch,
                        permit = Arc::clone(&workers).acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break 'dispatch,
                        },
                    };

                    if !self.dedup.observe_canonical(candidate.canonical_url.clone()) {
                        tracing::debug!(url = %candidate.raw_url, "Duplicate link skipped");
                        continue 'dispatch;
                    }

                    let count = dispatched_per_category.entry(category_id.clone()).or_default();
                    *count += 1;
                    if request.max_articles_per_category.is_some_and(|cap| *count >= cap) {
                        tracing::info!(category = %candidate.discovered_in_category, "Article cap reached");
                        if let Some(stop) = frontier_stops.get(&category_id) {
                            stop.cancel();
                        }
                    }

                    sink.note_dispatched();
                    fetches.spawn(fetch_one(
                        candidate,
                        permit,
                        Arc::clone(&articles),
                        Arc::clone(sink),
                        Arc::clone(&self.breaker),
                        self.cancel.clone(),
                    ));
                }
            }
        }

        // Everything dispatched so far gets to finish unless the session is cancelled
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                joined = fetches.join_next() => match joined {
                    Some(joined) => log_join_error("fetch", joined),
                    None => break,
                },
            }
        }

        finish_tasks(&mut fetches, self.config.crawler.cancel_grace(), "fetch").await;
    }
}

async fn fetch_one(
    candidate: LinkCandidate,
    _worker: OwnedSemaphorePermit,
    articles: Arc<ArticleFetcher>,
    sink: Arc<ResultSink>,
    breaker: Arc<FailureBreaker>,
    cancel: CancellationToken,
) {
    let report = articles.fetch(&candidate).await;
    let success = report.is_success();
    sink.record(report);

    if breaker.record(success) {
        tracing::error!(
            consecutive = breaker.consecutive_failures(),
            "Too many consecutive failures, cancelling session"
        );
        cancel.cancel();
    }
}

/// Paginates one category and forwards its candidates into the queue
async fn drive_frontier(
    mut frontier: LinkFrontier,
    tx: mpsc::Sender<LinkCandidate>,
    slots: Arc<Semaphore>,
    stop: CancellationToken,
    sink: Arc<ResultSink>,
) {
    let slot = tokio::select! {
        biased;
        _ = stop.cancelled() => None,
        slot = slots.acquire_owned() => slot.ok(),
    };

    if slot.is_some() {
        tracing::info!(category = %frontier.category(), "Frontier started");
        loop {
            let candidate = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                candidate = frontier.next() => candidate,
            };
            let Some(candidate) = candidate else {
                break;
            };

            tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                sent = tx.send(candidate) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
        }
    }

    let report = frontier.report();
    tracing::info!(
        category = %report.category,
        state = %report.state,
        pages = report.pages_fetched,
        links = report.links_yielded,
        "Frontier finished"
    );
    sink.record_frontier(report);
}

fn spawn_watchdog(
    limit: Duration,
    cancel: CancellationToken,
    timed_out: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(limit) => {
                tracing::warn!(timeout_secs = limit.as_secs_f64(), "Session timed out");
                timed_out.store(true, Ordering::SeqCst);
                cancel.cancel();
            }
        }
    })
}

/// Waits up to `grace` for remaining tasks, then aborts the rest
async fn finish_tasks(tasks: &mut JoinSet<()>, grace: Duration, kind: &str) {
    if tasks.is_empty() {
        return;
    }

    tracing::info!(kind, remaining = tasks.len(), grace_ms = grace.as_millis() as u64, "Waiting for tasks");
    let drained = tokio::time::timeout(grace, async {
        while let Some(joined) = tasks.join_next().await {
            log_join_error(kind, joined);
        }
    })
    .await;

    if drained.is_err() {
        tracing::warn!(kind, aborted = tasks.len(), "Grace period over, aborting tasks");
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
    }
}

fn log_join_error(kind: &str, joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            tracing::error!(kind, error = %e, "Task panicked");
        }
    }
}

fn discovery_record(error: CrawlError, index_url: &str) -> ErrorRecord {
    let (url, message, attempts) = match error {
        CrawlError::Discovery {
            url,
            message,
            attempts,
        } => (url, message, attempts),
        other => (index_url.to_string(), other.to_string(), 0),
    };

    ErrorRecord {
        url,
        category: Category::default(),
        error_kind: ErrorKind::Discovery,
        message,
        attempts,
    }
}

/// Runs a complete crawl session over HTTP
///
/// # Example
///
/// ```no_run
/// use warta::config::Config;
/// use warta::crawler::{run_crawl, CrawlRequest};
/// use warta::Site;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let adapter = Site::Bisnis.adapter(None)?;
/// let snapshot = run_crawl(Config::default(), adapter, CrawlRequest::new("2025-07-28")).await?;
/// println!("{} articles", snapshot.articles.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    adapter: Arc<dyn SiteAdapter>,
    request: CrawlRequest,
) -> Result<SessionSnapshot, WartaError> {
    Coordinator::new(config, adapter)?.run(request).await
}
