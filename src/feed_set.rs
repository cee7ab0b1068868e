use crate::config::FeedSlot;
use crate::fetcher::FetchFeed;
use crate::source::FeedSource;
use crate::store::WatermarkStore;
use crate::types::{ReaderError, Result};
use futures::future::join_all;
use tracing::{info, warn};

/// The feeds selected for one query: the sources that fetched cleanly, plus
/// the per-feed failures that degraded to "unavailable".
pub struct FeedSet {
    pub sources: Vec<FeedSource>,
    pub unavailable: Vec<ReaderError>,
}

impl FeedSet {
    /// Select the configured feeds a query refers to.
    ///
    /// Each configured name is matched case-insensitively as a substring of
    /// the query; the first name found narrows the set to that single feed.
    /// A query matching nothing selects every configured feed, in
    /// configuration order — that is the intended scope of a general,
    /// unscoped request, not a fallback bug.
    pub fn select(query: &str, config: &[FeedSlot]) -> Result<Vec<FeedSlot>> {
        if config.is_empty() {
            return Err(ReaderError::EmptyConfiguration);
        }

        let query = query.to_lowercase();
        let mut selected = Vec::new();
        for slot in config {
            if query.contains(&slot.name.to_lowercase()) {
                return Ok(vec![slot.clone()]);
            }
            selected.push(slot.clone());
        }
        Ok(selected)
    }

    /// Fetch the selected feeds concurrently, join the results, and build
    /// the session sources with their stored watermarks. A failed fetch
    /// degrades that one feed and never aborts its siblings.
    pub async fn resolve(
        query: &str,
        config: &[FeedSlot],
        store: &WatermarkStore,
        fetcher: &dyn FetchFeed,
    ) -> Result<Self> {
        let selected = Self::select(query, config)?;
        if selected.is_empty() {
            return Err(ReaderError::EmptyResolution);
        }

        let fetches = selected.iter().map(|slot| fetcher.fetch(&slot.url));
        let results = join_all(fetches).await;

        let mut sources = Vec::new();
        let mut unavailable = Vec::new();
        for (slot, result) in selected.iter().zip(results) {
            match result {
                Ok(entries) => {
                    let watermark = store.read(&slot.name);
                    let source = FeedSource::new(&slot.name, &slot.url, watermark, entries);
                    info!(
                        "feed '{}': {} new articles since {}",
                        slot.name,
                        source.count(),
                        watermark
                    );
                    sources.push(source);
                }
                Err(e) => {
                    warn!("feed '{}' unavailable: {}", slot.name, e);
                    unavailable.push(ReaderError::Fetch {
                        name: slot.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(Self {
            sources,
            unavailable,
        })
    }

    /// Per-feed new-article counts, without consuming anything.
    pub fn new_counts(&self) -> Vec<(String, usize)> {
        self.sources
            .iter()
            .map(|s| (s.name().to_string(), s.count()))
            .collect()
    }
}
