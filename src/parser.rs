use crate::types::{RawEntry, ReaderError, Result};
use chrono::Utc;
use feed_rs::parser;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Parse RSS/Atom content into raw entries, preserving document order.
/// Entries keep their markup; stripping happens when an entry becomes a
/// session item.
pub fn parse_feed(content: &str) -> Result<Vec<RawEntry>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| ReaderError::Parse(format!("failed to parse feed: {}", e)))?;

    let mut entries = Vec::new();
    for entry in feed.entries {
        let title = entry
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled".to_string());
        let link = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();
        let summary = entry.summary.map(|s| s.content).unwrap_or_default();
        let author = entry.authors.first().map(|a| a.name.clone());
        // Some feeds only carry an update time; treat it as the publish time.
        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        entries.push(RawEntry {
            title,
            summary,
            author,
            link,
            published_at,
        });
    }

    debug!("parsed feed with {} entries", entries.len());
    Ok(entries)
}

/// Remove markup from untrusted summary HTML.
pub fn strip_html(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^<]+?>").expect("valid tag pattern"));
    tag.replace_all(html, "").trim().to_string()
}
