//! Wellness Cache - client-side caching and memory-management core
//!
//! TTL caches with LRU eviction, a priority-aware resource manager with a
//! global byte budget, and a memory-pressure monitor that drives cleanup.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod resources;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheManager, CacheRegistry, CacheStats};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use monitor::{CleanupReport, CleanupTask, MemoryMonitor};
pub use resources::{NewResource, ResourceKind, ResourceManager, ResourcePriority};
