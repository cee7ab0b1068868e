use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// One consumable feed entry. Immutable after construction: the summary is
/// already HTML-stripped and a missing author has been replaced with the
/// "Not available" placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub summary: String,
    pub author: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
}

/// Comparator for item ordering: publish time ascending. Used with a stable
/// sort so entries sharing a timestamp keep their fetch order.
pub fn by_published(a: &Item, b: &Item) -> Ordering {
    a.published_at.cmp(&b.published_at)
}

/// A feed entry as the parser hands it back, before watermark filtering.
/// The summary still carries untrusted markup at this point.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub title: String,
    pub summary: String,
    pub author: Option<String>,
    pub link: String,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("feed '{name}' unavailable: {reason}")]
    Fetch { name: String, reason: String },

    #[error("no feeds configured")]
    EmptyConfiguration,

    #[error("query resolved to no feeds")]
    EmptyResolution,

    #[error("no pending articles in feed '{name}'")]
    EmptyQueue { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReaderError>;
