//! Cache Registry Module
//!
//! The named cache instances, built once at startup and shared by handle.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::{CacheManager, CacheStats};
use crate::clock::SharedClock;
use crate::config::{CacheConfig, Config};
use crate::error::{CacheError, Result};
use crate::monitor::{CleanupTask, SharedHeapGauge};

/// Names accepted by [`CacheRegistry::stats`] and [`CacheRegistry::clear`].
pub const CACHE_NAMES: [&str; 4] = ["general", "api", "images", "user_data"];

// == Cache Registry ==
/// General-purpose, API-response, image and user-data caches. Each instance is
/// configured independently and never shares entries with another.
#[derive(Debug)]
pub struct CacheRegistry {
    pub general: Arc<CacheManager<Value>>,
    pub api: Arc<CacheManager<Value>>,
    /// Image URLs or data URIs
    pub images: Arc<CacheManager<String>>,
    pub user_data: Arc<CacheManager<Value>>,
}

impl CacheRegistry {
    pub fn new(
        general: CacheConfig,
        api: CacheConfig,
        images: CacheConfig,
        user_data: CacheConfig,
        clock: SharedClock,
    ) -> Result<Self> {
        Ok(Self {
            general: Arc::new(CacheManager::new("general", general, clock.clone())?),
            api: Arc::new(CacheManager::new("api", api, clock.clone())?),
            images: Arc::new(CacheManager::new("images", images, clock.clone())?),
            user_data: Arc::new(CacheManager::new("user_data", user_data, clock)?),
        })
    }

    pub fn from_config(config: &Config, clock: SharedClock) -> Result<Self> {
        Self::new(
            config.general.clone(),
            config.api.clone(),
            config.images.clone(),
            config.user_data.clone(),
            clock,
        )
    }

    /// Starts every instance's timers.
    pub async fn start(&self, gauge: SharedHeapGauge) {
        self.general.start(gauge.clone()).await;
        self.api.start(gauge.clone()).await;
        self.images.start(gauge.clone()).await;
        self.user_data.start(gauge).await;
    }

    pub async fn destroy(&self) {
        self.general.destroy().await;
        self.api.destroy().await;
        self.images.destroy().await;
        self.user_data.destroy().await;
    }

    pub async fn stats(&self, name: &str) -> Result<CacheStats> {
        match name {
            "general" => Ok(self.general.stats().await),
            "api" => Ok(self.api.stats().await),
            "images" => Ok(self.images.stats().await),
            "user_data" => Ok(self.user_data.stats().await),
            other => Err(unknown_cache(other)),
        }
    }

    pub async fn all_stats(&self) -> BTreeMap<String, CacheStats> {
        let mut all = BTreeMap::new();
        for name in CACHE_NAMES {
            if let Ok(stats) = self.stats(name).await {
                all.insert(name.to_string(), stats);
            }
        }
        all
    }

    pub async fn clear(&self, name: &str) -> Result<()> {
        match name {
            "general" => self.general.clear().await,
            "api" => self.api.clear().await,
            "images" => self.images.clear().await,
            "user_data" => self.user_data.clear().await,
            other => return Err(unknown_cache(other)),
        }
        Ok(())
    }

    /// Monitor tasks for every instance. API responses are the cheapest to
    /// refetch and go first; user data goes last.
    pub async fn cleanup_tasks(&self) -> Vec<CleanupTask> {
        vec![
            self.api.cleanup_task(10).await,
            self.images.cleanup_task(20).await,
            self.general.cleanup_task(30).await,
            self.user_data.cleanup_task(50).await,
        ]
    }
}

fn unknown_cache(name: &str) -> CacheError {
    CacheError::NotFound(format!("cache '{}'", name))
}
