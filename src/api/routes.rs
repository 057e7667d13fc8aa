//! API Routes
//!
//! Configures the Axum router with the inspection endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, cleanup_handler, clear_cache_handler, health_handler, memory_handler,
    overview_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Stats for every cache, the resource manager and the heap
/// - `GET /stats/:cache` - Stats for one cache instance
/// - `DELETE /caches/:cache` - Clear one cache instance
/// - `GET /memory` - Latest heap sample, `null` when unavailable
/// - `POST /cleanup` - Force a cleanup pass
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(overview_handler))
        .route("/stats/:cache", get(cache_stats_handler))
        .route("/caches/:cache", delete(clear_cache_handler))
        .route("/memory", get(memory_handler))
        .route("/cleanup", post(cleanup_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
