//! Response DTOs for the inspection API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::monitor::MemoryStats;
use crate::resources::ResourceStats;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct OverviewResponse {
    /// Per-instance stats keyed by cache name
    pub caches: BTreeMap<String, CacheStats>,
    pub resources: ResourceStats,
    /// `null` when the host exposes no heap introspection
    pub memory: Option<MemoryStats>,
}

/// Response body for DELETE /caches/:cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub cache: String,
}

impl ClearResponse {
    pub fn new(cache: impl Into<String>) -> Self {
        let cache = cache.into();
        Self {
            message: format!("Cache '{}' cleared", cache),
            cache,
        }
    }
}
