use crate::source::FeedSource;
use crate::types::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Durable feed-name -> last-consumed-timestamp mapping, held in a JSON
/// file.
///
/// The session owns the handle: `open` at the start, `commit`/`close` at the
/// end. `Drop` flushes as a last resort so an abnormal exit still releases
/// whatever advancement happened.
pub struct WatermarkStore {
    path: PathBuf,
    entries: HashMap<String, DateTime<Utc>>,
    dirty: bool,
    closed: bool,
}

impl WatermarkStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            "opened watermark store at {} ({} feeds)",
            path.display(),
            entries.len()
        );
        Ok(Self {
            path,
            entries,
            dirty: false,
            closed: false,
        })
    }

    /// Stored watermark for `name`. A feed never seen before reads as the
    /// Unix epoch: everything it carries counts as new.
    pub fn read(&self, name: &str) -> DateTime<Utc> {
        self.entries
            .get(name)
            .copied()
            .unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Advance stored watermarks from the session's sources. A stored value
    /// is overwritten only when the source moved strictly past it, so a
    /// stale or out-of-order session can never regress a feed.
    pub fn commit(&mut self, sources: &[FeedSource]) {
        for source in sources {
            let advanced = match self.entries.get(source.name()) {
                Some(&stored) => source.watermark() > stored,
                None => true,
            };
            if advanced {
                debug!(
                    "advancing watermark for '{}' to {}",
                    source.name(),
                    source.watermark()
                );
                self.entries
                    .insert(source.name().to_string(), source.watermark());
                self.dirty = true;
            }
        }
    }

    /// Flush and release. Idempotent.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush()?;
        self.closed = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, text)?;
        self.dirty = false;
        info!(
            "persisted {} feed watermarks to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl Drop for WatermarkStore {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.flush() {
                error!("failed to flush watermark store on drop: {}", e);
            }
        }
    }
}
