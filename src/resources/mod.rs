//! Resources Module
//!
//! Tracks heavyweight resources (images, components, data, audio) against a
//! global byte budget with priority tiers and age limits.

mod manager;
mod priority;
mod resource;
mod stats;
mod store;


pub use manager::ResourceManager;
pub use priority::{ResourceKind, ResourcePriority};
pub use resource::{HandleReleaser, NewResource, NoopReleaser, Resource, ResourcePayload};
pub use stats::ResourceStats;
pub use store::ResourceStore;

#[cfg(test)]
pub(crate) use resource::test_support;
