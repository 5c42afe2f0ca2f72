//! TTL cache for loaded signal sets
//!
//! Cache key: the signals file path. Value: the loaded and normalized rows.
//! Invalidation: fixed TTL per entry, or a manual bust. `fetch` hands out
//! clones — sessions own their copies, so shocked state in one session never
//! writes back through the cache and a fresh session always starts from
//! source data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;

use crate::loader::load_signals;
use crate::normalize::normalize;
use crate::risk::DriverWeights;
use crate::signal::Observation;

/// Default entry lifetime.
pub const DEFAULT_SIGNAL_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
struct CacheEntry {
    rows: Vec<Observation>,
    loaded_at: Instant,
}

/// In-memory cache of normalized signal sets keyed by source path.
#[derive(Debug)]
pub struct SignalCache {
    ttl: Duration,
    entries: HashMap<PathBuf, CacheEntry>,
}

impl SignalCache {
    pub fn new(ttl: Duration) -> Self {
        SignalCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Loaded and normalized rows for `path`.
    ///
    /// Entries older than the TTL are reloaded from disk; a TTL of zero
    /// disables caching entirely. Load failures propagate and leave any
    /// previous entry untouched.
    pub fn fetch(&mut self, path: &Path, weights: &DriverWeights) -> Result<Vec<Observation>> {
        if let Some(entry) = self.entries.get(path) {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(entry.rows.clone());
            }
        }

        let rows = normalize(&load_signals(path)?, weights);
        self.entries.insert(
            path.to_path_buf(),
            CacheEntry {
                rows: rows.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(rows)
    }

    /// Drop the entry for one path. Returns whether an entry existed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SignalCache {
    fn default() -> Self {
        SignalCache::new(DEFAULT_SIGNAL_TTL)
    }
}
