//! Response models for the inspection API
//!
//! DTOs serialized into HTTP response bodies. Stats types from the core are
//! serialized directly.

pub mod responses;

// Re-export commonly used types
pub use responses::{ClearResponse, HealthResponse, OverviewResponse};
