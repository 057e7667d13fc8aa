//! Cache Manager Module
//!
//! Async handle over a [`CacheStore`] that owns the instance's timers.

use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::lru::AGGRESSIVE_TARGET_RATIO;
use crate::cache::{CacheStats, CacheStore, CacheValue};
use crate::clock::SharedClock;
use crate::config::CacheConfig;
use crate::error::Result;
use crate::monitor::{CleanupTask, SharedHeapGauge};
use crate::tasks::{spawn_pressure_task, spawn_sweep_task};

// == Cache Manager ==
/// One named cache instance.
///
/// Timers started with [`CacheManager::start`] are cancelled by
/// [`CacheManager::destroy`] or when the manager is dropped.
#[derive(Debug)]
pub struct CacheManager<V> {
    name: String,
    store: Arc<RwLock<CacheStore<V>>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl<V: CacheValue> CacheManager<V> {
    // == Constructor ==
    pub fn new(name: impl Into<String>, config: CacheConfig, clock: SharedClock) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_store(name, CacheStore::new(config, clock)))
    }

    /// Wraps an already built store, e.g. one with a custom transform.
    pub fn from_store(name: impl Into<String>, store: CacheStore<V>) -> Self {
        Self {
            name: name.into(),
            store: Arc::new(RwLock::new(store)),
            timers: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Timers ==
    /// Starts the expired-entry sweep and the memory-pressure check.
    ///
    /// Calling it again restarts both timers. Must run inside a tokio runtime.
    pub async fn start(&self, gauge: SharedHeapGauge) {
        let (sweep_ms, pressure_ms) = {
            let store = self.store.read().await;
            (
                store.config().sweep_interval_ms,
                store.config().pressure_interval_ms,
            )
        };

        let sweep = spawn_sweep_task(self.name.clone(), self.store.clone(), sweep_ms);
        let pressure =
            spawn_pressure_task(self.name.clone(), self.store.clone(), gauge, pressure_ms);

        let mut timers = self.lock_timers();
        for handle in timers.drain(..) {
            handle.abort();
        }
        timers.push(sweep);
        timers.push(pressure);
    }

    pub fn is_running(&self) -> bool {
        self.lock_timers().iter().any(|handle| !handle.is_finished())
    }

    /// Cancels the timers, then drops every entry.
    pub async fn destroy(&self) {
        self.stop_timers();
        self.store.write().await.clear();
        info!(cache = %self.name, "cache destroyed");
    }

    // == Key-Value Contract ==
    pub async fn get(&self, key: &str) -> Option<V> {
        self.store.write().await.get(key)
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl_ms: Option<u64>) {
        self.store.write().await.set(key, value, ttl_ms);
    }

    pub async fn has(&self, key: &str) -> bool {
        self.store.write().await.has(key)
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.store.write().await.delete(key)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn memory_usage(&self) -> usize {
        self.store.read().await.memory_usage()
    }

    // == Maintenance ==
    pub async fn sweep_expired(&self) -> usize {
        self.store.write().await.cleanup_expired()
    }

    pub async fn aggressive_cleanup(&self) -> usize {
        self.store.write().await.aggressive_cleanup()
    }

    /// Builds a monitor task that runs this instance's aggressive cleanup.
    pub async fn cleanup_task(&self, priority: u32) -> CleanupTask {
        let budget = self.store.read().await.config().max_memory_bytes;
        let estimated = (budget as f64 * (1.0 - AGGRESSIVE_TARGET_RATIO)) as usize;
        let store = self.store.clone();
        let name = self.name.clone();

        CleanupTask::new(format!("{}-cache", self.name), priority, estimated, move || {
            let store = store.clone();
            let name = name.clone();
            async move {
                let removed = store.write().await.aggressive_cleanup();
                info!(cache = %name, removed, "aggressive cleanup requested by monitor");
                Ok(())
            }
        })
    }

    fn stop_timers(&self) {
        for handle in self.lock_timers().drain(..) {
            handle.abort();
        }
    }

    fn lock_timers(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.timers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V> Drop for CacheManager<V> {
    fn drop(&mut self) {
        let timers = self
            .timers
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for handle in timers.drain(..) {
            handle.abort();
        }
    }
}
