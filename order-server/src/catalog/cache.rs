//! TTL result cache for serialized catalogue query results.
//!
//! Keyed by the semantic cache key. An entry is never served past its
//! TTL (expired entries are evicted on read), and absence says nothing
//! about existence — that verdict belongs to the existence filter.
//! Population races are acceptable: the last writer overwrites with an
//! equivalent value.

use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry {
    value: serde_json::Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

pub struct ResultCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Unexpired value for the key, if any. A hit is trusted even when
    /// the stored result set is empty.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }
        // Evict lazily after the read guard is dropped.
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        None
    }

    pub fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}
