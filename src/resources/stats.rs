//! Resource Statistics Module

use std::collections::BTreeMap;

use serde::Serialize;

use crate::resources::{Resource, ResourceKind, ResourcePriority};

// == Resource Stats ==
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceStats {
    pub total_resources: usize,
    pub memory_usage: usize,
    pub max_memory_usage: usize,
    /// `memory_usage / max_memory_usage` as a percentage
    pub usage_percentage: f64,
    /// Every kind is listed, zero counts included
    pub counts_by_type: BTreeMap<ResourceKind, usize>,
    /// Every tier is listed, zero counts included
    pub counts_by_priority: BTreeMap<ResourcePriority, usize>,
}

impl ResourceStats {
    pub fn from_resources<'a>(
        resources: impl Iterator<Item = &'a Resource>,
        memory_usage: usize,
        max_memory_usage: usize,
    ) -> Self {
        let mut counts_by_type: BTreeMap<ResourceKind, usize> =
            ResourceKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut counts_by_priority: BTreeMap<ResourcePriority, usize> = ResourcePriority::ALL
            .iter()
            .map(|priority| (*priority, 0))
            .collect();
        let mut total_resources = 0;

        for resource in resources {
            total_resources += 1;
            *counts_by_type.entry(resource.kind).or_default() += 1;
            *counts_by_priority.entry(resource.priority).or_default() += 1;
        }

        let usage_percentage = if max_memory_usage == 0 {
            0.0
        } else {
            memory_usage as f64 / max_memory_usage as f64 * 100.0
        };

        Self {
            total_resources,
            memory_usage,
            max_memory_usage,
            usage_percentage,
            counts_by_type,
            counts_by_priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{NewResource, ResourcePayload};
    use serde_json::json;

    fn resource(id: &str, kind: ResourceKind, priority: ResourcePriority) -> Resource {
        Resource::from_new(
            NewResource::new(id, kind, ResourcePayload::Json(json!(null)), priority).with_size(10),
            0,
            0,
        )
    }

    #[test]
    fn test_counts_and_percentage() {
        let resources = vec![
            resource("a", ResourceKind::Image, ResourcePriority::Low),
            resource("b", ResourceKind::Image, ResourcePriority::Critical),
            resource("c", ResourceKind::Audio, ResourcePriority::Low),
        ];
        let stats = ResourceStats::from_resources(resources.iter(), 30, 120);

        assert_eq!(stats.total_resources, 3);
        assert_eq!(stats.usage_percentage, 25.0);
        assert_eq!(stats.counts_by_type[&ResourceKind::Image], 2);
        assert_eq!(stats.counts_by_type[&ResourceKind::Component], 0);
        assert_eq!(stats.counts_by_priority[&ResourcePriority::Low], 2);
    }

    #[test]
    fn test_serializes_with_lowercase_keys() {
        let stats = ResourceStats::from_resources(std::iter::empty(), 0, 0);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["counts_by_type"]["image"], 0);
        assert_eq!(json["counts_by_priority"]["critical"], 0);
        assert_eq!(json["usage_percentage"], 0.0);
    }
}
