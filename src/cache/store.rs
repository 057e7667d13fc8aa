//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU ordering, TTL expiration
//! and a running byte counter.

use std::collections::HashMap;
use std::fmt;

use tracing::{debug, warn};

use crate::cache::entry::{estimate_size, CacheEntry, Payload, Recency};
use crate::cache::lru::{aggressive_target, LruIndex};
use crate::cache::transform::{JsonTransform, ValueTransform};
use crate::cache::{CacheStats, CacheValue};
use crate::clock::SharedClock;
use crate::config::CacheConfig;
use crate::error::CacheError;

// == Cache Store ==
/// Cache storage with TTL expiry, LRU eviction and byte accounting.
///
/// `memory_usage` always equals the sum of resident entries' `size_bytes`.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Recency order
    lru: LruIndex,
    /// Running byte counter
    memory_usage: usize,
    config: CacheConfig,
    transform: Option<Box<dyn ValueTransform<V>>>,
    clock: SharedClock,
    next_seq: u64,
    evictions: u64,
    expirations: u64,
}

impl<V: CacheValue> CacheStore<V> {
    // == Constructor ==
    /// Creates a store; `config.compress` selects the JSON transform.
    pub fn new(config: CacheConfig, clock: SharedClock) -> Self {
        let transform: Option<Box<dyn ValueTransform<V>>> = if config.compress {
            Some(Box::new(JsonTransform))
        } else {
            None
        };

        Self {
            entries: HashMap::new(),
            lru: LruIndex::new(),
            memory_usage: 0,
            config,
            transform,
            clock,
            next_seq: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Replaces the value transform.
    pub fn with_transform(mut self, transform: impl ValueTransform<V> + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    // == Set ==
    /// Stores a value, overwriting any entry under the same key.
    ///
    /// A new key arriving at `max_entries` evicts exactly one entry, the least
    /// recently used, before insertion.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        let key = key.into();
        let replaced = self.remove_entry(&key).is_some();

        if !replaced && self.entries.len() >= self.config.max_entries.max(1) {
            if let Some(evicted) = self.evict_lru() {
                debug!(key = %evicted, "evicted least recently used entry");
            }
        }

        let size_bytes = estimate_size(&key, &value);
        let payload = self.pack(&key, value);
        let now = self.clock.now_ms();
        let recency = self.next_recency(now);
        let ttl_ms = ttl_ms.unwrap_or(self.config.default_ttl_ms);

        self.lru.touch(&key, None, recency);
        self.memory_usage += size_bytes;
        self.entries.insert(
            key.clone(),
            CacheEntry::new(key, payload, size_bytes, ttl_ms, recency),
        );
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries are removed and reported as absent. A value the transform
    /// cannot decode is dropped and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now_ms();
        if self.entries.get(key)?.is_expired(now) {
            self.expire(key);
            return None;
        }

        let recency = self.next_recency(now);
        let entry = self.entries.get_mut(key)?;
        let previous = entry.recency();
        entry.touch(recency);
        self.lru.touch(key, Some(previous), recency);

        let decoded = match (&entry.payload, &self.transform) {
            (Payload::Plain(value), _) => Ok(value.clone()),
            (Payload::Packed(packed), Some(transform)) => transform.decode(packed),
            (Payload::Packed(_), None) => Err(CacheError::Transform(
                "packed value without a transform".to_string(),
            )),
        };

        match decoded {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "dropping cache entry that failed to decode");
                self.remove_entry(key);
                None
            }
        }
    }

    // == Has ==
    /// Reports whether a live entry exists without touching its access stats.
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return false,
        };
        if expired {
            self.expire(key);
        }
        !expired
    }

    // == Delete ==
    /// Removes an entry by key, returning whether anything was removed.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.memory_usage = 0;
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }

        self.expirations += expired_keys.len() as u64;
        expired_keys.len()
    }

    // == Aggressive Cleanup ==
    /// Removes entries oldest-access first until usage is at or below 70% of
    /// the byte budget, or the store is empty.
    ///
    /// Returns the number of entries removed.
    pub fn aggressive_cleanup(&mut self) -> usize {
        let target = aggressive_target(self.config.max_memory_bytes);
        let mut removed = 0;

        while self.memory_usage > target {
            if self.evict_lru().is_none() {
                break;
            }
            removed += 1;
        }

        removed
    }

    /// True when usage exceeds the byte budget.
    pub fn is_over_budget(&self) -> bool {
        self.memory_usage > self.config.max_memory_bytes
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats::from_entries(
            self.entries.values(),
            self.clock.now_ms(),
            self.memory_usage,
            self.config.max_memory_bytes,
        )
        .with_counters(self.evictions, self.expirations)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Raw presence check that ignores expiry.
    #[cfg(test)]
    pub(crate) fn is_resident(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Internals ==
    fn next_recency(&mut self, now_ms: u64) -> Recency {
        self.next_seq += 1;
        Recency {
            at_ms: now_ms,
            seq: self.next_seq,
        }
    }

    fn pack(&self, key: &str, value: V) -> Payload<V> {
        let Some(transform) = &self.transform else {
            return Payload::Plain(value);
        };
        match transform.encode(&value) {
            Ok(packed) => Payload::Packed(packed),
            Err(err) => {
                warn!(key, error = %err, "value transform failed, storing raw value");
                Payload::Plain(value)
            }
        }
    }

    /// Single removal path: unindexes the entry and debits its size.
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(entry.recency());
        self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
        Some(entry)
    }

    fn expire(&mut self, key: &str) {
        if self.remove_entry(key).is_some() {
            self.expirations += 1;
            debug!(key, "cache entry expired on read");
        }
    }

    fn evict_lru(&mut self) -> Option<String> {
        let key = self.lru.peek_oldest()?.clone();
        self.remove_entry(&key)?;
        self.evictions += 1;
        Some(key)
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("memory_usage", &self.memory_usage)
            .field("config", &self.config)
            .field("transform", &self.transform)
            .finish()
    }
}
