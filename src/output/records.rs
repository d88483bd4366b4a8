//! Record types produced by a crawl
//!
//! Every dispatched article URL resolves to exactly one [`Outcome`]: an
//! [`ArticleRecord`] when the page could be read as an article, or an
//! [`ErrorRecord`] otherwise.

use crate::adapter::Category;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Field names used in `extraction_warnings`, matching the exported keys
pub mod fields {
    pub const TITLE: &str = "title";
    pub const PUBLISH_DATE: &str = "publishDate";
    pub const AUTHOR: &str = "author";
    pub const EDITOR: &str = "editor";
    pub const TAGS: &str = "tags";
    pub const CONTENT: &str = "content";
    pub const IMAGES: &str = "images";
}

/// An image attached to an article
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleImage {
    pub url: String,
    pub alt: String,
    pub caption: String,
}

/// A successfully extracted article
///
/// Optional fields that could not be located hold their empty default and are
/// named in `extraction_warnings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    /// Site-native date text, not reparsed
    pub publish_date: String,
    pub author: String,
    pub editor: String,
    pub tags: Vec<String>,
    /// Paragraphs in document order
    pub content: Vec<String>,
    pub images: Vec<ArticleImage>,
    /// Category the URL was discovered under
    pub category: Category,
    pub scraped_at: DateTime<Utc>,
    pub extraction_warnings: BTreeSet<String>,
}

impl ArticleRecord {
    /// Creates an empty record for `url`, stamped with the current time
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            publish_date: String::new(),
            author: String::new(),
            editor: String::new(),
            tags: Vec::new(),
            content: Vec::new(),
            images: Vec::new(),
            category: Category::default(),
            scraped_at: Utc::now(),
            extraction_warnings: BTreeSet::new(),
        }
    }

    /// Flags an optional field that could not be extracted
    pub fn warn(&mut self, field: &str) {
        self.extraction_warnings.insert(field.to_string());
    }

    pub fn has_warning(&self, field: &str) -> bool {
        self.extraction_warnings.contains(field)
    }
}

/// Classification of a failed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Transport failure or HTTP error status
    Network,
    /// The page was fetched but is not recognizable as an article
    Parse,
    /// Category discovery or selection failed
    Discovery,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Network => "Network",
            Self::Parse => "Parse",
            Self::Discovery => "Discovery",
        };
        write!(f, "{}", name)
    }
}

/// A URL that did not yield an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorRecord {
    pub url: String,
    pub category: Category,
    pub error_kind: ErrorKind,
    pub message: String,
    pub attempts: u32,
}

/// What a single dispatched fetch produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Article(ArticleRecord),
    Error(ErrorRecord),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Article(_))
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Article(article) => &article.url,
            Self::Error(error) => &error.url,
        }
    }

    pub fn category(&self) -> &Category {
        match self {
            Self::Article(article) => &article.category,
            Self::Error(error) => &error.category,
        }
    }
}

/// An outcome together with the number of requests it took
#[derive(Debug, Clone, PartialEq)]
pub struct FetchReport {
    pub outcome: Outcome,
    pub attempts: u32,
}

impl FetchReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}
