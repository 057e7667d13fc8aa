//! Background Tasks Module
//!
//! Periodic tasks owned by the caches, the resource manager and the monitor.
//!
//! # Tasks
//! - TTL sweep: removes expired cache entries
//! - Pressure check: aggressive cache cleanup under memory pressure
//! - Resource sweep: removes resources past their priority's max age
//! - Heap sampler: drives the memory pressure monitor

mod cleanup;
mod resources;
mod sampler;

pub use cleanup::{spawn_pressure_task, spawn_sweep_task};
pub use resources::spawn_resource_sweep_task;
pub use sampler::spawn_sampler_task;
