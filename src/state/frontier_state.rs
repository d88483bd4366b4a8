/// Frontier state definitions for tracking pagination progress
///
/// A frontier walks the listing pages of one (category, date) pair. It starts
/// in `Fetching { page: 1 }` and ends in either `Exhausted` or `Failed`.
use serde::Serialize;
use std::fmt;

/// Represents the pagination state of a single category frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum FrontierState {
    // ===== Active States =====
    /// A listing page is being requested
    Fetching { page: u32 },

    /// The previous page yielded links; `next_page` is due
    HasMore { next_page: u32 },

    // ===== Terminal States =====
    /// Pagination finished normally (empty page, page hint or page cap reached)
    Exhausted,

    /// A listing page failed after retries; earlier links were kept
    Failed,
}

impl FrontierState {
    /// Initial state of every frontier
    pub fn initial() -> Self {
        Self::Fetching { page: 1 }
    }

    /// Returns true if no further pages will be requested
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Failed)
    }

    /// The page the frontier will request next, if any
    pub fn pending_page(&self) -> Option<u32> {
        match self {
            Self::Fetching { page } => Some(*page),
            Self::HasMore { next_page } => Some(*next_page),
            Self::Exhausted | Self::Failed => None,
        }
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching { .. } => "fetching",
            Self::HasMore { .. } => "has_more",
            Self::Exhausted => "exhausted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for FrontierState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pending_page() {
            Some(page) => write!(f, "{}(page {})", self.as_str(), page),
            None => write!(f, "{}", self.as_str()),
        }
    }
}
