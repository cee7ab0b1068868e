use crate::parser::strip_html;
use crate::types::{by_published, Item, RawEntry, ReaderError, Result};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::debug;

/// One named feed within a session: the entries published after the stored
/// watermark, oldest first, plus the session's working watermark copy.
///
/// The watermark only ever moves forward, and only `next` removes items from
/// the queue.
pub struct FeedSource {
    name: String,
    url: String,
    watermark: DateTime<Utc>,
    pending: VecDeque<Item>,
}

impl FeedSource {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        watermark: DateTime<Utc>,
        entries: Vec<RawEntry>,
    ) -> Self {
        let name = name.into();
        let mut items = Vec::new();

        for entry in entries {
            let Some(published_at) = entry.published_at else {
                debug!("skipping undated entry '{}' in feed '{}'", entry.title, name);
                continue;
            };
            if published_at > watermark {
                items.push(Item {
                    title: entry.title,
                    summary: strip_html(&entry.summary),
                    author: entry
                        .author
                        .unwrap_or_else(|| "Not available".to_string()),
                    link: entry.link,
                    published_at,
                });
            }
        }

        // Stable sort: entries sharing a publish time keep fetch order.
        items.sort_by(by_published);

        Self {
            name,
            url: url.into(),
            watermark,
            pending: items.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }

    pub fn count(&self) -> usize {
        self.pending.len()
    }

    /// Remove and return the earliest remaining item.
    pub fn next(&mut self) -> Result<Item> {
        self.pending.pop_front().ok_or_else(|| ReaderError::EmptyQueue {
            name: self.name.clone(),
        })
    }

    /// Watermarks never regress within a session either.
    pub fn advance_watermark(&mut self, t: DateTime<Utc>) {
        if t > self.watermark {
            self.watermark = t;
        }
    }
}
