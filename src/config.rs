use crate::types::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// One configured feed: a user-chosen name and the feed URL. A slot is
/// usable only when both fields are filled in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FeedSlot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReaderConfig {
    #[serde(default)]
    pub feeds: Vec<FeedSlot>,
}

impl ReaderConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("loaded {} feed slots from {}", config.feeds.len(), path.display());
        Ok(config)
    }

    /// Keeps only fully-filled slots, in configuration order. A slot with a
    /// name but no URL (or the reverse) is a configuration inconsistency:
    /// logged, then skipped.
    pub fn valid_slots(&self) -> Vec<FeedSlot> {
        let mut slots = Vec::new();
        for slot in &self.feeds {
            let has_name = !slot.name.trim().is_empty();
            let has_url = !slot.url.trim().is_empty();
            if has_name && has_url {
                slots.push(slot.clone());
            } else if has_name != has_url {
                warn!(
                    "feed slot is half-filled (name: '{}', url: '{}'), skipping",
                    slot.name, slot.url
                );
            }
        }
        slots
    }
}
