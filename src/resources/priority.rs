//! Resource classification: priority tiers and kinds.

use serde::{Deserialize, Serialize};

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 60 * MINUTE_MS;

// == Priority ==
/// Eviction tier. The derived order (`Low < Medium < High < Critical`) is the
/// order in which space-making eviction sacrifices resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourcePriority {
    Low,
    Medium,
    High,
    Critical,
}

impl ResourcePriority {
    pub const ALL: [ResourcePriority; 4] = [
        ResourcePriority::Low,
        ResourcePriority::Medium,
        ResourcePriority::High,
        ResourcePriority::Critical,
    ];

    /// Idle time after which the age sweep removes a resource of this tier.
    pub fn max_age_ms(self) -> u64 {
        match self {
            ResourcePriority::Critical => 24 * HOUR_MS,
            ResourcePriority::High => 4 * HOUR_MS,
            ResourcePriority::Medium => 2 * HOUR_MS,
            ResourcePriority::Low => 30 * MINUTE_MS,
        }
    }

    /// Critical resources are never sacrificed to make space.
    pub fn is_evictable(self) -> bool {
        self != ResourcePriority::Critical
    }
}

// == Kind ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Component,
    Data,
    Audio,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Image,
        ResourceKind::Component,
        ResourceKind::Data,
        ResourceKind::Audio,
    ];
}
