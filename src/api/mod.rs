//! API Module
//!
//! Read-mostly HTTP surface for inspecting the caches, the resource manager
//! and the memory monitor.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Overview of every component
//! - `GET /stats/:cache` - One cache instance's stats
//! - `DELETE /caches/:cache` - Clear one cache instance
//! - `GET /memory` - Heap sample
//! - `POST /cleanup` - Force a cleanup pass

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
