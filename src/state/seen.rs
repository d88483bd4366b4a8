use crate::url::canonicalize_url;
use std::collections::{BTreeSet, HashSet};
use std::sync::{Mutex, PoisonError};

/// Session-wide record of article URLs already dispatched
///
/// `observe` is the single shared-mutable chokepoint between fetch workers:
/// the lookup and the insert happen under one lock, so exactly one caller
/// wins for each canonical form.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: Mutex<HashSet<String>>,
    tracking_params: Vec<String>,
}

impl Deduplicator {
    /// Creates a deduplicator that drops the given query parameters before comparing
    pub fn new(tracking_params: Vec<String>) -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
            tracking_params,
        }
    }

    /// Computes the comparison key for a raw URL
    ///
    /// URLs that cannot be parsed are compared by their trimmed raw text, which
    /// can only ever let a duplicate through, never merge two distinct URLs.
    pub fn canonical_form(&self, raw_url: &str) -> String {
        match canonicalize_url(raw_url, &self.tracking_params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::debug!(url = raw_url, error = %e, "Comparing uncanonicalizable URL verbatim");
                raw_url.trim().to_string()
            }
        }
    }

    /// Returns true the first time a canonical form is seen, false thereafter
    pub fn observe(&self, raw_url: &str) -> bool {
        let key = self.canonical_form(raw_url);
        self.observe_canonical(key)
    }

    /// Same as `observe` for a key that is already canonical
    pub fn observe_canonical(&self, canonical_url: String) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.insert(canonical_url)
    }

    /// Returns true if the URL's canonical form was already observed
    pub fn contains(&self, raw_url: &str) -> bool {
        let key = self.canonical_form(raw_url);
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.contains(&key)
    }

    /// Number of distinct canonical URLs observed
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted copy of every observed canonical URL
    pub fn snapshot(&self) -> BTreeSet<String> {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.iter().cloned().collect()
    }
}
