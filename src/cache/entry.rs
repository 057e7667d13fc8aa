//! Cache Entry Module
//!
//! Defines individual cache entries with TTL and access bookkeeping.

use serde::Serialize;

// == Constants ==
/// Size charged for a value that cannot be measured.
pub const DEFAULT_SIZE_ESTIMATE: usize = 1024;

// == Recency ==
/// Position of an entry in LRU order.
///
/// `seq` is a per-store monotonic counter, so entries touched within the same
/// millisecond still order by access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Recency {
    pub at_ms: u64,
    pub seq: u64,
}

// == Payload ==
/// Stored form of a value: as given, or encoded by the instance transform.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<V> {
    Plain(V),
    Packed(String),
}

impl<V> Payload<V> {
    pub fn is_packed(&self) -> bool {
        matches!(self, Payload::Packed(_))
    }
}

// == Cache Entry ==
/// A single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key the entry is stored under
    pub key: String,
    /// The stored value
    pub payload: Payload<V>,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Successful reads since the write
    pub access_count: u64,
    /// Last read (or write) timestamp, drives LRU
    pub last_accessed_at: u64,
    /// Estimated bytes charged to the store
    pub size_bytes: usize,
    seq: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped at `recency`.
    pub fn new(
        key: String,
        payload: Payload<V>,
        size_bytes: usize,
        ttl_ms: u64,
        recency: Recency,
    ) -> Self {
        Self {
            key,
            payload,
            stored_at: recency.at_ms,
            ttl_ms,
            access_count: 0,
            last_accessed_at: recency.at_ms,
            size_bytes,
            seq: recency.seq,
        }
    }

    // == Is Expired ==
    /// An entry is expired once strictly more than `ttl_ms` has passed since it was stored.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) > self.ttl_ms
    }

    pub fn recency(&self) -> Recency {
        Recency {
            at_ms: self.last_accessed_at,
            seq: self.seq,
        }
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, recency: Recency) {
        self.access_count += 1;
        self.last_accessed_at = recency.at_ms;
        self.seq = recency.seq;
    }
}

// == Size Estimation ==
/// Estimates the bytes held by `key` and `value` from the value's JSON encoding.
///
/// Values that fail to serialize are charged [`DEFAULT_SIZE_ESTIMATE`].
pub fn estimate_size<V: Serialize>(key: &str, value: &V) -> usize {
    match serde_json::to_vec(value) {
        Ok(bytes) => key.len() + bytes.len(),
        Err(_) => DEFAULT_SIZE_ESTIMATE,
    }
}
