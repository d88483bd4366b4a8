//! Category discovery and selection

use crate::adapter::{Category, SiteAdapter};
use crate::crawler::fetcher::PageFetcher;
use crate::{CrawlError, ExtractError};
use scraper::Html;
use std::collections::HashSet;
use url::Url;

/// Which discovered categories a crawl covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategorySelector {
    #[default]
    All,
    /// Tokens matched against id, slug or name
    Matching(Vec<String>),
}

impl CategorySelector {
    /// Builds a selector from command-line style tokens; no tokens means all
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let tokens: Vec<String> = tokens
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.is_empty() {
            Self::All
        } else {
            Self::Matching(tokens)
        }
    }
}

/// Fetches the category index and lets the adapter read it
///
/// # Errors
///
/// `CrawlError::Discovery` when the index cannot be fetched after retries or
/// its structural anchor is missing. An index without categories is not an
/// error.
pub async fn discover_categories(
    adapter: &dyn SiteAdapter,
    pages: &PageFetcher,
) -> Result<Vec<Category>, CrawlError> {
    let url = adapter.category_index_url();
    tracing::info!(site = %adapter.site(), url = %url, "Discovering categories");

    let fetched = pages
        .get_with_retry(&url)
        .await
        .map_err(|failure| CrawlError::Discovery {
            url: url.clone(),
            message: failure.message,
            attempts: failure.attempts,
        })?;

    let page_url = Url::parse(&fetched.final_url)
        .or_else(|_| Url::parse(&url))
        .map_err(|e| CrawlError::Discovery {
            url: url.clone(),
            message: e.to_string(),
            attempts: fetched.attempts,
        })?;

    let categories =
        parse_index(adapter, &fetched.body, &page_url).map_err(|e| CrawlError::Discovery {
            url: url.clone(),
            message: e.to_string(),
            attempts: fetched.attempts,
        })?;

    if categories.is_empty() {
        tracing::warn!(url = %url, "Category index lists no categories");
    } else {
        tracing::info!(count = categories.len(), "Categories discovered");
    }
    Ok(categories)
}

fn parse_index(
    adapter: &dyn SiteAdapter,
    body: &str,
    page_url: &Url,
) -> Result<Vec<Category>, ExtractError> {
    let document = Html::parse_document(body);
    adapter.parse_categories(&document, page_url)
}

/// Applies a selector to discovered categories
///
/// Returns the selected categories in discovery order, with repeated ids
/// dropped after their first occurrence, and the tokens that matched nothing.
pub fn select_categories(
    discovered: Vec<Category>,
    selector: &CategorySelector,
) -> (Vec<Category>, Vec<String>) {
    let mut seen_ids = HashSet::new();
    let discovered: Vec<Category> = discovered
        .into_iter()
        .filter(|c| seen_ids.insert(c.id.clone()))
        .collect();

    let tokens = match selector {
        CategorySelector::All => return (discovered, Vec::new()),
        CategorySelector::Matching(tokens) => tokens,
    };

    let unmatched = tokens
        .iter()
        .filter(|token| !discovered.iter().any(|c| c.matches(token)))
        .cloned()
        .collect();

    let selected = discovered
        .into_iter()
        .filter(|c| tokens.iter().any(|token| c.matches(token)))
        .collect();

    (selected, unmatched)
}
