//! Cache Statistics Module
//!
//! Snapshot of a cache instance: occupancy, reuse, age and eviction counters.

use serde::Serialize;

use crate::cache::entry::CacheEntry;

/// Number of entries listed in [`CacheStats::most_accessed`].
pub const MOST_ACCESSED_LIMIT: usize = 5;

// == Access Summary ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessSummary {
    pub key: String,
    pub access_count: u64,
}

// == Cache Stats ==
/// Point-in-time statistics for one cache instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Resident entries
    pub size: usize,
    /// Sum of resident entries' estimated sizes
    pub memory_usage: usize,
    /// Configured byte budget
    pub max_memory_usage: usize,
    /// Average access count per resident entry. Misses are not tracked, so this
    /// measures reuse of what is cached rather than a hit/miss ratio.
    pub hit_rate: f64,
    /// Age of the earliest-stored resident entry
    pub oldest_item_age_ms: u64,
    /// Top resident entries by access count, descending
    pub most_accessed: Vec<AccessSummary>,
    /// Entries removed by capacity or aggressive eviction
    pub evictions: u64,
    /// Entries removed because their TTL ran out
    pub expirations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Builds a snapshot from the resident entries.
    pub fn from_entries<'a, V: 'a>(
        entries: impl Iterator<Item = &'a CacheEntry<V>>,
        now_ms: u64,
        memory_usage: usize,
        max_memory_usage: usize,
    ) -> Self {
        let mut size = 0usize;
        let mut total_accesses = 0u64;
        let mut oldest_stored_at: Option<u64> = None;
        let mut accesses = Vec::new();

        for entry in entries {
            size += 1;
            total_accesses += entry.access_count;
            oldest_stored_at = Some(match oldest_stored_at {
                Some(oldest) => oldest.min(entry.stored_at),
                None => entry.stored_at,
            });
            accesses.push(AccessSummary {
                key: entry.key.clone(),
                access_count: entry.access_count,
            });
        }

        accesses.sort_by(|a, b| {
            b.access_count
                .cmp(&a.access_count)
                .then_with(|| a.key.cmp(&b.key))
        });
        accesses.truncate(MOST_ACCESSED_LIMIT);

        Self {
            size,
            memory_usage,
            max_memory_usage,
            hit_rate: average_accesses(total_accesses, size),
            oldest_item_age_ms: oldest_stored_at
                .map(|stored_at| now_ms.saturating_sub(stored_at))
                .unwrap_or(0),
            most_accessed: accesses,
            evictions: 0,
            expirations: 0,
        }
    }

    /// Attaches cumulative eviction and expiration counters.
    pub fn with_counters(mut self, evictions: u64, expirations: u64) -> Self {
        self.evictions = evictions;
        self.expirations = expirations;
        self
    }
}

/// Accesses per entry, `0.0` for an empty store.
fn average_accesses(total_accesses: u64, entries: usize) -> f64 {
    if entries == 0 {
        0.0
    } else {
        total_accesses as f64 / entries as f64
    }
}
