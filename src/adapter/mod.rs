//! Site adapters
//!
//! An adapter is the only place that knows a site's markup. It supplies pure
//! functions over parsed documents: category parsing, listing-page URL
//! construction, link extraction, an optional page-count hint and article
//! extraction rules. All fetching is done by the crawl engine.
//!
//! # Sites
//!
//! - `bisnis`: www.bisnis.com, dates as `YYYY-MM-DD`
//! - `detik`: news.detik.com, dates as `MM/DD/YYYY`
//! - `kompas`: indeks.kompas.com, dates as `YYYY-MM-DD`
//! - `cnbc`: www.cnbcindonesia.com, dates as `YYYY/MM/DD`
//! - `cnn`: www.cnnindonesia.com, dates as `YYYY/MM/DD`

mod bisnis;
mod cnbc;
mod cnn;
pub mod document;
mod detik;
mod kompas;
pub mod rules;

pub use bisnis::Bisnis;
pub use cnbc::CnbcIndonesia;
pub use cnn::CnnIndonesia;
pub use detik::Detik;
pub use kompas::Kompas;
pub use rules::{ArticleRules, Byline, ImageRule};

use crate::output::ArticleRecord;
use crate::{ConfigError, ExtractError};
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// A news category as listed on a site's index page
///
/// `id` is site-scoped: a numeric id, a kanal slug, or for some sites the
/// kanal index URL itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
}

impl Category {
    pub fn new(id: impl Into<String>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            slug: slug.into(),
        }
    }

    /// True if `token` names this category by id, slug or case-insensitive name
    pub fn matches(&self, token: &str) -> bool {
        let token = token.trim();
        !token.is_empty()
            && (self.id == token || self.slug == token || self.name.eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Per-site capability bundle used by the crawl engine
///
/// Every method is synchronous and free of I/O.
pub trait SiteAdapter: Send + Sync + fmt::Debug {
    fn site(&self) -> Site;

    /// Root the adapter builds URLs against
    fn base_url(&self) -> &Url;

    /// Page listing the site's categories
    fn category_index_url(&self) -> String;

    /// Reads categories from the category index page
    ///
    /// Returns `MissingAnchor` when the structural element holding the list is
    /// absent, and an empty list when it is present but empty.
    fn parse_categories(
        &self,
        document: &Html,
        page_url: &Url,
    ) -> Result<Vec<Category>, ExtractError>;

    /// Listing page for one category, date and 1-based page number
    fn build_page_url(&self, category: &Category, date_filter: &str, page: u32) -> String;

    /// Article links on a listing page
    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<String>;

    /// Whether a listing page carries no article items at all
    ///
    /// Ends pagination for sites without a page count.
    fn is_empty_listing(&self, _document: &Html, links: &[String]) -> bool {
        links.is_empty()
    }

    /// Total page count, for sites that publish one
    fn max_page_hint(&self, _document: &Html) -> Option<u32> {
        None
    }

    fn article_rules(&self) -> &ArticleRules;

    fn extract_article(&self, document: &Html, url: &str) -> Result<ArticleRecord, ExtractError> {
        rules::extract_article(self.article_rules(), document, url)
    }
}

/// Supported sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    Bisnis,
    Detik,
    Kompas,
    CnbcIndonesia,
    CnnIndonesia,
}

impl Site {
    pub const ALL: [Site; 5] = [
        Site::Bisnis,
        Site::Detik,
        Site::Kompas,
        Site::CnbcIndonesia,
        Site::CnnIndonesia,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bisnis => "bisnis",
            Self::Detik => "detik",
            Self::Kompas => "kompas",
            Self::CnbcIndonesia => "cnbc",
            Self::CnnIndonesia => "cnn",
        }
    }

    /// Date filter format the site's listing pages expect
    pub fn date_format(&self) -> &'static str {
        match self {
            Self::Bisnis | Self::Kompas => "YYYY-MM-DD",
            Self::Detik => "MM/DD/YYYY",
            Self::CnbcIndonesia | Self::CnnIndonesia => "YYYY/MM/DD",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Bisnis => "https://www.bisnis.com",
            Self::Detik => "https://news.detik.com",
            Self::Kompas => "https://indeks.kompas.com",
            Self::CnbcIndonesia => "https://www.cnbcindonesia.com",
            Self::CnnIndonesia => "https://www.cnnindonesia.com",
        }
    }

    /// Builds the adapter, optionally against a mirror or test server
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidUrl` if `base_url` is not an absolute http(s) URL.
    pub fn adapter(&self, base_url: Option<&str>) -> Result<Arc<dyn SiteAdapter>, ConfigError> {
        let raw = base_url.unwrap_or(self.default_base_url());
        let base = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "{}: expected http or https",
                raw
            )));
        }

        let adapter: Arc<dyn SiteAdapter> = match self {
            Self::Bisnis => Arc::new(Bisnis::new(base)),
            Self::Detik => Arc::new(Detik::new(base)),
            Self::Kompas => Arc::new(Kompas::new(base)),
            Self::CnbcIndonesia => Arc::new(CnbcIndonesia::new(base)),
            Self::CnnIndonesia => Arc::new(CnnIndonesia::new(base)),
        };
        Ok(adapter)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Site {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bisnis" => Ok(Self::Bisnis),
            "detik" => Ok(Self::Detik),
            "kompas" => Ok(Self::Kompas),
            "cnbc" | "cnbcindonesia" => Ok(Self::CnbcIndonesia),
            "cnn" | "cnnindonesia" => Ok(Self::CnnIndonesia),
            other => Err(ConfigError::UnknownSite(other.to_string())),
        }
    }
}

/// Base URL without its trailing slash, for string templates
pub(crate) fn root(base: &Url) -> &str {
    base.as_str().trim_end_matches('/')
}
