//! Pagination driver for one category
//!
//! A [`LinkFrontier`] walks the listing pages of one (category, date) pair
//! strictly in page order and yields the article links it finds. It stops:
//! - after the hinted last page, when the site publishes a page count
//! - at the first page without article items, when it does not
//! - at the configured page cap
//! - at the first page that still fails after retries
//!
//! Links already yielded are never withdrawn.

use crate::adapter::{Category, SiteAdapter};
use crate::crawler::fetcher::PageFetcher;
use crate::output::FrontierReport;
use crate::state::{Deduplicator, FrontierState};
use crate::CrawlError;
use scraper::Html;
use std::collections::VecDeque;
use std::sync::Arc;
use url::Url;

/// One listing page to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub category: Category,
    pub date_filter: String,
    /// 1-based
    pub page: u32,
}

impl PageRequest {
    pub fn url(&self, adapter: &dyn SiteAdapter) -> String {
        adapter.build_page_url(&self.category, &self.date_filter, self.page)
    }
}

/// An article link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    /// URL as found, used for fetching
    pub raw_url: String,
    /// Comparison key for deduplication only
    pub canonical_url: String,
    pub discovered_in_category: Category,
    pub discovered_at_page: u32,
}

struct Listing {
    links: Vec<String>,
    empty: bool,
    hint: Option<u32>,
}

fn read_listing(adapter: &dyn SiteAdapter, body: &str, page_url: &Url) -> Listing {
    let document = Html::parse_document(body);
    let links = adapter.extract_links(&document, page_url);
    Listing {
        empty: adapter.is_empty_listing(&document, &links),
        hint: adapter.max_page_hint(&document),
        links,
    }
}

/// Lazy, finite, non-restartable sequence of link candidates
pub struct LinkFrontier {
    adapter: Arc<dyn SiteAdapter>,
    pages: Arc<PageFetcher>,
    dedup: Arc<Deduplicator>,
    category: Category,
    date_filter: String,
    max_pages: Option<u32>,
    state: FrontierState,
    buffer: VecDeque<LinkCandidate>,
    hint: Option<u32>,
    pages_fetched: u32,
    links_yielded: usize,
    error: Option<CrawlError>,
}

impl LinkFrontier {
    pub fn new(
        adapter: Arc<dyn SiteAdapter>,
        pages: Arc<PageFetcher>,
        dedup: Arc<Deduplicator>,
        category: Category,
        date_filter: impl Into<String>,
    ) -> Self {
        Self {
            adapter,
            pages,
            dedup,
            category,
            date_filter: date_filter.into(),
            max_pages: None,
            state: FrontierState::initial(),
            buffer: VecDeque::new(),
            hint: None,
            pages_fetched: 0,
            links_yielded: 0,
            error: None,
        }
    }

    /// Stops after `max_pages` listing pages
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn state(&self) -> FrontierState {
        self.state
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn error(&self) -> Option<&CrawlError> {
        self.error.as_ref()
    }

    /// Next link candidate, fetching further pages as needed
    ///
    /// Returns None once the frontier is exhausted or failed and every
    /// buffered link has been handed out.
    pub async fn next(&mut self) -> Option<LinkCandidate> {
        loop {
            if let Some(candidate) = self.buffer.pop_front() {
                self.links_yielded += 1;
                return Some(candidate);
            }

            let page = self.state.pending_page()?;
            self.fetch_page(page).await;
        }
    }

    async fn fetch_page(&mut self, page: u32) {
        if self.max_pages.is_some_and(|max| page > max) {
            tracing::debug!(category = %self.category, page, "Page cap reached");
            self.state = FrontierState::Exhausted;
            return;
        }

        self.state = FrontierState::Fetching { page };
        let request = PageRequest {
            category: self.category.clone(),
            date_filter: self.date_filter.clone(),
            page,
        };
        let url = request.url(self.adapter.as_ref());

        let fetched = match self.pages.get_with_retry(&url).await {
            Ok(fetched) => fetched,
            Err(failure) => {
                let error = CrawlError::Pagination {
                    url,
                    page,
                    message: failure.message,
                };
                tracing::warn!(category = %self.category, error = %error, "Frontier stopped");
                self.error = Some(error);
                self.state = FrontierState::Failed;
                return;
            }
        };
        self.pages_fetched += 1;

        let page_url = Url::parse(&fetched.final_url)
            .or_else(|_| Url::parse(&url))
            .unwrap_or_else(|_| self.adapter.base_url().clone());
        let listing = read_listing(self.adapter.as_ref(), &fetched.body, &page_url);

        if self.hint.is_none() {
            if let Some(hint) = listing.hint {
                tracing::debug!(category = %self.category, hint, "Page count published");
                self.hint = Some(hint);
            }
        }

        tracing::debug!(
            category = %self.category,
            page,
            links = listing.links.len(),
            "Listing page read"
        );

        let empty = listing.empty;
        for raw_url in listing.links {
            self.buffer.push_back(LinkCandidate {
                canonical_url: self.dedup.canonical_form(&raw_url),
                raw_url,
                discovered_in_category: self.category.clone(),
                discovered_at_page: page,
            });
        }

        self.state = match self.hint {
            Some(hint) if page >= hint => FrontierState::Exhausted,
            Some(_) => FrontierState::HasMore { next_page: page + 1 },
            None if empty => FrontierState::Exhausted,
            None => FrontierState::HasMore { next_page: page + 1 },
        };
    }

    /// Summary of the frontier in its current state
    pub fn report(&self) -> FrontierReport {
        FrontierReport {
            category: self.category.clone(),
            state: self.state,
            pages_fetched: self.pages_fetched,
            links_yielded: self.links_yielded,
            page_hint: self.hint,
            error: self.error.as_ref().map(|e| e.to_string()),
        }
    }
}
