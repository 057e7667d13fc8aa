//! Cache Timer Tasks
//!
//! Background tasks that keep each cache instance bounded: the expired-entry
//! sweep and the memory-pressure check.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::{CacheStore, CacheValue};
use crate::monitor::SharedHeapGauge;

/// Spawns a background task that periodically removes expired cache entries.
///
/// The task runs until its handle is aborted, sleeping `interval_ms` between
/// sweeps. Lazy expiry on `get`/`has` does not depend on it.
pub fn spawn_sweep_task<V: CacheValue>(
    name: String,
    cache: Arc<RwLock<CacheStore<V>>>,
    interval_ms: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_millis(interval_ms);

    tokio::spawn(async move {
        info!(cache = %name, interval_ms, "starting TTL sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut cache_guard = cache.write().await;
                cache_guard.cleanup_expired()
            };

            if removed > 0 {
                info!(cache = %name, removed, "TTL sweep removed expired entries");
            } else {
                debug!(cache = %name, "TTL sweep found no expired entries");
            }
        }
    })
}

/// Spawns a background task that runs aggressive cleanup when the cache is over
/// its byte budget or the shared gauge reports heap pressure.
pub fn spawn_pressure_task<V: CacheValue>(
    name: String,
    cache: Arc<RwLock<CacheStore<V>>>,
    gauge: SharedHeapGauge,
    interval_ms: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_millis(interval_ms);

    tokio::spawn(async move {
        info!(cache = %name, interval_ms, "starting memory pressure task");

        loop {
            tokio::time::sleep(interval).await;

            let host_pressure = gauge.is_under_pressure();

            let removed = {
                let mut cache_guard = cache.write().await;
                if host_pressure || cache_guard.is_over_budget() {
                    Some(cache_guard.aggressive_cleanup())
                } else {
                    None
                }
            };

            match removed {
                Some(removed) => {
                    info!(cache = %name, removed, host_pressure, "memory pressure cleanup ran")
                }
                None => debug!(cache = %name, "no memory pressure"),
            }
        }
    })
}
