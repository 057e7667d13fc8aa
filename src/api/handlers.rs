//! API Handlers
//!
//! HTTP request handlers for the inspection endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheRegistry, CacheStats};
use crate::error::Result;
use crate::models::{ClearResponse, HealthResponse, OverviewResponse};
use crate::monitor::{CleanupReport, MemoryMonitor, MemoryStats};
use crate::resources::ResourceManager;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub caches: Arc<CacheRegistry>,
    pub resources: Arc<ResourceManager>,
    pub monitor: Arc<MemoryMonitor>,
}

impl AppState {
    pub fn new(
        caches: Arc<CacheRegistry>,
        resources: Arc<ResourceManager>,
        monitor: Arc<MemoryMonitor>,
    ) -> Self {
        Self {
            caches,
            resources,
            monitor,
        }
    }
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /stats
///
/// Stats for every cache instance, the resource manager and the host heap.
pub async fn overview_handler(State(state): State<AppState>) -> Json<OverviewResponse> {
    Json(OverviewResponse {
        caches: state.caches.all_stats().await,
        resources: state.resources.stats().await,
        memory: state.monitor.memory_stats(),
    })
}

/// Handler for GET /stats/:cache
pub async fn cache_stats_handler(
    State(state): State<AppState>,
    Path(cache): Path<String>,
) -> Result<Json<CacheStats>> {
    let stats = state.caches.stats(&cache).await?;
    Ok(Json(stats))
}

/// Handler for DELETE /caches/:cache
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Path(cache): Path<String>,
) -> Result<Json<ClearResponse>> {
    state.caches.clear(&cache).await?;
    Ok(Json(ClearResponse::new(cache)))
}

/// Handler for GET /memory
pub async fn memory_handler(State(state): State<AppState>) -> Json<Option<MemoryStats>> {
    Json(state.monitor.memory_stats())
}

/// Handler for POST /cleanup
///
/// Runs a cleanup pass immediately, bypassing the cooldown.
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<CleanupReport> {
    Json(state.monitor.force_cleanup().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;
    use crate::config::{Config, MonitorConfig, ResourceConfig};
    use crate::monitor::ManualHeapProbe;
    use crate::resources::NoopReleaser;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn state() -> AppState {
        let clock = system_clock();
        let caches = CacheRegistry::from_config(&Config::default(), clock.clone()).unwrap();
        AppState::new(
            Arc::new(caches),
            Arc::new(ResourceManager::new(
                ResourceConfig::default(),
                clock.clone(),
                Arc::new(NoopReleaser),
            )
            .unwrap()),
            Arc::new(MemoryMonitor::new(
                MonitorConfig::default(),
                Arc::new(ManualHeapProbe::new()),
                clock,
            )
            .unwrap()),
        )
    }

    #[tokio::test]
    async fn test_cache_stats_handler() {
        let state = state();
        state.caches.api.set("/plans", json!([1, 2]), None).await;

        let stats = assert_ok!(
            cache_stats_handler(State(state.clone()), Path("api".to_string())).await
        );
        assert_eq!(stats.size, 1);

        assert_err!(cache_stats_handler(State(state), Path("nope".to_string())).await);
    }

    #[tokio::test]
    async fn test_clear_cache_handler() {
        let state = state();
        state.caches.user_data.set("me", json!({"id": 1}), None).await;

        let response = assert_ok!(
            clear_cache_handler(State(state.clone()), Path("user_data".to_string())).await
        );
        assert_eq!(response.cache, "user_data");
        assert!(state.caches.user_data.is_empty().await);
    }

    #[tokio::test]
    async fn test_memory_handler_null_without_sample() {
        let response = memory_handler(State(state())).await;
        assert!(response.0.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_handler_forces_pass() {
        let state = state();
        for task in state.caches.cleanup_tasks().await {
            state.monitor.register_cleanup_task(task).await;
        }

        let report = cleanup_handler(State(state)).await;
        assert!(report.forced);
        assert_eq!(report.tasks_run, 4);
        assert!(report.failed.is_empty());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
