//! Cache Store Module
//!
//! The in-memory key/entry map behind the cache-aware fetcher: TTL expiry on
//! read, unconditional overwrite on write, and pattern-based invalidation.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, KeyPattern, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

// == Memory Cache ==
/// Key -> entry map with per-entry TTL.
///
/// The store does not run its own clock: expired entries are removed lazily
/// when a reader touches them, and in bulk by [`MemoryCache::sweep_expired`]
/// (driven by the background sweep task). Either way the visibility invariant
/// holds: an entry is returned only while `now < expires_at`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    /// Rendered-key -> entry storage
    entries: HashMap<String, CacheEntry>,
    /// Performance statistics
    stats: CacheStats,
}

impl MemoryCache {
    /// Creates a new empty MemoryCache.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Retrieves the value for `key` if present and unexpired.
    ///
    /// An expired entry is removed and counted as a miss, so the next
    /// fetch repopulates it.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let value = self.lookup(key);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Peek ==
    /// Like [`MemoryCache::get`], but without recording hit/miss statistics.
    ///
    /// Used for the fetcher's post-wait re-check, which belongs to a read
    /// the statistics have already counted.
    pub fn peek(&mut self, key: &str) -> Option<Value> {
        self.lookup(key)
    }

    /// Shared read path: expired entries are removed lazily and behave as
    /// absent.
    fn lookup(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.stats.set_total_entries(self.entries.len());
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    // == Set ==
    /// Stores `value` under `key` with the given TTL, unconditionally
    /// overwriting any existing entry.
    pub fn set(&mut self, key: String, value: Value, ttl_ms: u64) -> Result<()> {
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidRequest(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        self.entries.insert(key, CacheEntry::new(value, ttl_ms));
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Delete ==
    /// Removes exactly one entry. Returns whether an entry was present.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.stats.record_invalidations(1);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    /// Removes all entries.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.record_invalidations(removed as u64);
        self.stats.set_total_entries(0);
    }

    // == Delete Matching ==
    /// Removes every entry whose rendered key matches `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn delete_matching(&mut self, pattern: &KeyPattern) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.matches(key));
        let removed = before - self.entries.len();

        if removed > 0 {
            debug!("Invalidated {} cache entries matching {:?}", removed, pattern);
            self.stats.record_invalidations(removed as u64);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Invalidate Resource ==
    /// Removes every entry belonging to `resource` (keys prefixed
    /// `{resource}:`). Returns the number of entries removed.
    pub fn invalidate_resource(&mut self, resource: &str) -> usize {
        self.delete_matching(&KeyPattern::resource(resource))
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - self.entries.len();

        if removed > 0 {
            self.stats.record_invalidations(removed as u64);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
