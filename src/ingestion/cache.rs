//! Memoized file loads keyed by file identity and read options, with a
//! bounded time-to-live.

use crate::error::Result;
use crate::ingestion::{open_source, SourceOptions};
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(1800);

/// Identity of a loaded file: a changed size or mtime is a different file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LoadKey {
    path: PathBuf,
    len: u64,
    modified: Option<SystemTime>,
    options: SourceOptions,
}

struct CachedFrame {
    frame: DataFrame,
    loaded_at: Instant,
}

pub struct LoadCache {
    ttl: Duration,
    entries: HashMap<LoadKey, CachedFrame>,
    hits: u64,
}

impl Default for LoadCache {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}

impl LoadCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            hits: 0,
        }
    }

    /// Load `path`, reusing a previous result for the same file and options
    /// while it is younger than the TTL.
    pub fn load(&mut self, path: &Path, options: &SourceOptions) -> Result<DataFrame> {
        let metadata = std::fs::metadata(path)?;
        let key = LoadKey {
            path: std::fs::canonicalize(path)?,
            len: metadata.len(),
            modified: metadata.modified().ok(),
            options: options.clone(),
        };

        self.evict_expired();
        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            debug!(path = %path.display(), "load cache hit");
            return Ok(entry.frame.clone());
        }

        let source = open_source(path, options)?;
        let frame = source.load()?;
        debug!(
            source = %source.source_id(),
            source_type = source.source_type(),
            rows = frame.height(),
            "input loaded"
        );
        self.entries.insert(
            key,
            CachedFrame {
                frame: frame.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(frame)
    }

    fn evict_expired(&mut self) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| entry.loaded_at.elapsed() < ttl);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
