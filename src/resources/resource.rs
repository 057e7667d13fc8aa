//! Resource Module
//!
//! Typed resources tracked against the global byte budget.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::DEFAULT_SIZE_ESTIMATE;
use crate::resources::{ResourceKind, ResourcePriority};

// == Payload ==
#[derive(Debug, Clone, PartialEq)]
pub enum ResourcePayload {
    /// Revocable object-URL style handle owned by the host
    Blob { url: String },
    Json(Value),
    Bytes(Arc<Vec<u8>>),
}

impl ResourcePayload {
    /// Byte length for raw bytes, JSON length for values, the default estimate
    /// for opaque handles or values that fail to serialize.
    pub fn estimate_size(&self) -> usize {
        match self {
            ResourcePayload::Bytes(bytes) => bytes.len(),
            ResourcePayload::Json(value) => serde_json::to_vec(value)
                .map(|encoded| encoded.len())
                .unwrap_or(DEFAULT_SIZE_ESTIMATE),
            ResourcePayload::Blob { .. } => DEFAULT_SIZE_ESTIMATE,
        }
    }
}

// == Handle Releaser ==
/// Host hook that frees a blob handle once its resource is gone.
pub trait HandleReleaser: Send + Sync + fmt::Debug {
    fn release(&self, url: &str);
}

/// Releaser for hosts whose handles need no explicit freeing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReleaser;

impl HandleReleaser for NoopReleaser {
    fn release(&self, _url: &str) {}
}

// == New Resource ==
/// Arguments to `add_resource`.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub id: String,
    pub kind: ResourceKind,
    pub payload: ResourcePayload,
    /// Declared size; estimated from the payload when absent
    pub size_bytes: Option<usize>,
    pub priority: ResourcePriority,
}

impl NewResource {
    pub fn new(
        id: impl Into<String>,
        kind: ResourceKind,
        payload: ResourcePayload,
        priority: ResourcePriority,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            payload,
            size_bytes: None,
            priority,
        }
    }

    pub fn with_size(mut self, size_bytes: usize) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}

// == Resource ==
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: String,
    pub kind: ResourceKind,
    pub payload: ResourcePayload,
    pub size_bytes: usize,
    pub priority: ResourcePriority,
    pub last_accessed_at: u64,
    pub access_count: u64,
    pub(crate) seq: u64,
}

impl Resource {
    pub(crate) fn from_new(new: NewResource, now_ms: u64, seq: u64) -> Self {
        let size_bytes = new
            .size_bytes
            .unwrap_or_else(|| new.payload.estimate_size());
        Self {
            id: new.id,
            kind: new.kind,
            payload: new.payload,
            size_bytes,
            priority: new.priority,
            last_accessed_at: now_ms,
            access_count: 0,
            seq,
        }
    }

    /// Idle time since the last access.
    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_accessed_at)
    }

    pub fn is_aged_out(&self, now_ms: u64) -> bool {
        self.idle_ms(now_ms) > self.priority.max_age_ms()
    }

    /// Space-making eviction order: priority, then recency.
    pub(crate) fn eviction_rank(&self) -> (ResourcePriority, u64, u64) {
        (self.priority, self.last_accessed_at, self.seq)
    }

    /// Blob handle to release on removal, image resources only.
    pub(crate) fn releasable_handle(&self) -> Option<&str> {
        match (&self.kind, &self.payload) {
            (ResourceKind::Image, ResourcePayload::Blob { url }) => Some(url.as_str()),
            _ => None,
        }
    }
}
