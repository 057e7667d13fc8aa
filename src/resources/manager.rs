//! Resource Manager Module
//!
//! Async handle over a [`ResourceStore`] that owns the age sweep timer.

use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cache::AGGRESSIVE_TARGET_RATIO;
use crate::clock::SharedClock;
use crate::config::ResourceConfig;
use crate::error::Result;
use crate::monitor::CleanupTask;
use crate::resources::{HandleReleaser, NewResource, Resource, ResourceStats, ResourceStore};
use crate::tasks::spawn_resource_sweep_task;

// == Resource Manager ==
#[derive(Debug)]
pub struct ResourceManager {
    store: Arc<RwLock<ResourceStore>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ResourceManager {
    pub fn new(
        config: ResourceConfig,
        clock: SharedClock,
        releaser: Arc<dyn HandleReleaser>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(RwLock::new(ResourceStore::new(config, clock, releaser))),
            timer: Mutex::new(None),
        })
    }

    // == Timer ==
    /// Starts the periodic age sweep, replacing any running one.
    pub async fn start(&self) {
        let interval_ms = self.store.read().await.config().sweep_interval_ms;
        let handle = spawn_resource_sweep_task(self.store.clone(), interval_ms);

        if let Some(old) = self.lock_timer().replace(handle) {
            old.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.lock_timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Cancels the sweep and removes (releasing) every resource.
    pub async fn destroy(&self) {
        if let Some(handle) = self.lock_timer().take() {
            handle.abort();
        }
        self.store.write().await.clear();
        info!("resource manager destroyed");
    }

    // == Resource Operations ==
    pub async fn add_resource(&self, resource: NewResource) {
        self.store.write().await.add(resource);
    }

    pub async fn get_resource(&self, id: &str) -> Option<Resource> {
        self.store.write().await.get(id)
    }

    pub async fn has_resource(&self, id: &str) -> bool {
        self.store.read().await.has(id)
    }

    pub async fn remove_resource(&self, id: &str) -> bool {
        self.store.write().await.remove(id)
    }

    pub async fn clear(&self) {
        self.store.write().await.clear();
    }

    pub async fn stats(&self) -> ResourceStats {
        self.store.read().await.stats()
    }

    pub async fn memory_usage(&self) -> usize {
        self.store.read().await.memory_usage()
    }

    // == Maintenance ==
    pub async fn sweep_aged(&self) -> usize {
        self.store.write().await.sweep_aged()
    }

    pub async fn aggressive_cleanup(&self) -> usize {
        self.store.write().await.aggressive_cleanup()
    }

    /// Builds a monitor task that runs the resource aggressive cleanup.
    pub async fn cleanup_task(&self, priority: u32) -> CleanupTask {
        let budget = self.store.read().await.config().max_memory_bytes;
        let estimated = (budget as f64 * (1.0 - AGGRESSIVE_TARGET_RATIO)) as usize;
        let store = self.store.clone();

        CleanupTask::new("resources", priority, estimated, move || {
            let store = store.clone();
            async move {
                let removed = store.write().await.aggressive_cleanup();
                info!(removed, "resource cleanup requested by monitor");
                Ok(())
            }
        })
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for ResourceManager {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = timer.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{system_clock, ManualClock};
    use crate::error::CacheError;
    use crate::resources::test_support::RecordingReleaser;
    use crate::resources::{NoopReleaser, ResourceKind, ResourcePayload, ResourcePriority};
    use serde_json::json;
    use std::time::Duration;

    fn doc(id: &str, size: usize, priority: ResourcePriority) -> NewResource {
        NewResource::new(
            id,
            ResourceKind::Data,
            ResourcePayload::Json(json!({ "id": id })),
            priority,
        )
        .with_size(size)
    }

    #[test]
    fn test_new_rejects_zero_sweep_interval() {
        let mut config = ResourceConfig::new(1_000);
        config.sweep_interval_ms = 0;
        let result = ResourceManager::new(config, system_clock(), Arc::new(NoopReleaser));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_resource_operations() {
        let manager = ResourceManager::new(
            ResourceConfig::new(1_000),
            system_clock(),
            Arc::new(RecordingReleaser::default()),
        )
        .unwrap();

        manager
            .add_resource(doc("plan", 100, ResourcePriority::High))
            .await;
        assert!(manager.has_resource("plan").await);
        assert_eq!(manager.get_resource("plan").await.unwrap().access_count, 1);
        assert_eq!(manager.memory_usage().await, 100);

        assert!(manager.remove_resource("plan").await);
        assert!(!manager.has_resource("plan").await);
        assert_eq!(manager.stats().await.total_resources, 0);
    }

    #[tokio::test]
    async fn test_priority_exemption_scenario() {
        let manager = ResourceManager::new(
            ResourceConfig::new(200),
            system_clock(),
            Arc::new(RecordingReleaser::default()),
        )
        .unwrap();
        manager
            .add_resource(doc("A", 100, ResourcePriority::Low))
            .await;
        manager
            .add_resource(doc("B", 100, ResourcePriority::Critical))
            .await;
        manager
            .add_resource(doc("C", 100, ResourcePriority::Medium))
            .await;

        assert!(!manager.has_resource("A").await);
        assert!(manager.has_resource("B").await);
        assert!(manager.has_resource("C").await);
        assert_eq!(manager.memory_usage().await, 200);
    }

    #[tokio::test]
    async fn test_cleanup_task_drops_low_priority() {
        let manager = ResourceManager::new(
            ResourceConfig::new(1_000),
            system_clock(),
            Arc::new(RecordingReleaser::default()),
        )
        .unwrap();
        manager
            .add_resource(doc("low", 100, ResourcePriority::Low))
            .await;
        manager
            .add_resource(doc("high", 100, ResourcePriority::High))
            .await;

        let task = manager.cleanup_task(40).await;
        assert_eq!(task.name, "resources");
        assert_eq!(task.estimated_bytes_saved, 300);
        task.run().await.unwrap();

        assert!(!manager.has_resource("low").await);
        assert!(manager.has_resource("high").await);
    }

    #[tokio::test]
    async fn test_start_sweeps_and_destroy_releases() {
        let clock = Arc::new(ManualClock::new(0));
        let releaser = Arc::new(RecordingReleaser::default());
        let mut config = ResourceConfig::new(10_000);
        config.sweep_interval_ms = 10;
        let manager = ResourceManager::new(config, clock.clone(), releaser.clone()).unwrap();

        manager
            .add_resource(doc("stale", 10, ResourcePriority::Low))
            .await;
        manager
            .add_resource(
                NewResource::new(
                    "hero",
                    ResourceKind::Image,
                    ResourcePayload::Blob {
                        url: "blob:hero".to_string(),
                    },
                    ResourcePriority::Critical,
                )
                .with_size(10),
            )
            .await;

        manager.start().await;
        assert!(manager.is_running());
        clock.advance(31 * 60_000);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!manager.has_resource("stale").await);
        assert!(manager.has_resource("hero").await);

        manager.destroy().await;
        assert!(!manager.is_running());
        assert_eq!(releaser.released(), vec!["blob:hero".to_string()]);
        assert_eq!(manager.memory_usage().await, 0);
    }
}
