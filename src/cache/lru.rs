//! LRU Index Module
//!
//! Orders cache keys by recency for single-entry and aggressive eviction.

use std::collections::BTreeMap;

use crate::cache::entry::Recency;

// == Eviction Constants ==
/// Aggressive cleanup drains a store down to this share of its byte budget.
pub const AGGRESSIVE_TARGET_RATIO: f64 = 0.7;

/// Byte usage aggressive cleanup stops at.
pub fn aggressive_target(max_memory_bytes: usize) -> usize {
    (max_memory_bytes as f64 * AGGRESSIVE_TARGET_RATIO) as usize
}

// == LRU Index ==
/// Tracks access order for LRU eviction.
///
/// Keys are ordered by [`Recency`]: the first key is the least recently used.
#[derive(Debug, Default)]
pub struct LruIndex {
    order: BTreeMap<Recency, String>,
}

impl LruIndex {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
        }
    }

    // == Touch ==
    /// Moves `key` from `previous` (if it was tracked) to `now`.
    pub fn touch(&mut self, key: &str, previous: Option<Recency>, now: Recency) {
        if let Some(previous) = previous {
            self.order.remove(&previous);
        }
        self.order.insert(now, key.to_string());
    }

    // == Remove ==
    /// Stops tracking the key stored at `recency`.
    pub fn remove(&mut self, recency: Recency) -> Option<String> {
        self.order.remove(&recency)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.values().next()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}
