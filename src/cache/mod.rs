//! Cache Module
//!
//! In-memory caches with TTL expiration, LRU eviction and byte accounting.

mod entry;
mod lru;
mod manager;
mod registry;
mod stats;
mod store;
mod transform;

#[cfg(test)]
mod property_tests;

use serde::{de::DeserializeOwned, Serialize};

// Re-export public types
pub use entry::{estimate_size, CacheEntry, Payload, Recency, DEFAULT_SIZE_ESTIMATE};
pub use lru::{aggressive_target, LruIndex, AGGRESSIVE_TARGET_RATIO};
pub use manager::CacheManager;
pub use registry::{CacheRegistry, CACHE_NAMES};
pub use stats::{AccessSummary, CacheStats, MOST_ACCESSED_LIMIT};
pub use store::CacheStore;
pub use transform::{JsonTransform, ValueTransform};

// == Cache Value ==
/// Values a cache instance can hold: JSON-representable and shareable across tasks.
pub trait CacheValue: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}

impl<T> CacheValue for T where T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {}
