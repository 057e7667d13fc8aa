//! Resource Store Module
//!
//! Priority-aware tracker enforcing a global byte budget.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cache::aggressive_target;
use crate::clock::SharedClock;
use crate::config::ResourceConfig;
use crate::resources::{
    HandleReleaser, NewResource, Resource, ResourcePriority, ResourceStats,
};

// == Resource Store ==
/// `memory_usage` always equals the sum of resident resources' `size_bytes`.
#[derive(Debug)]
pub struct ResourceStore {
    resources: HashMap<String, Resource>,
    memory_usage: usize,
    config: ResourceConfig,
    clock: SharedClock,
    releaser: Arc<dyn HandleReleaser>,
    next_seq: u64,
}

impl ResourceStore {
    // == Constructor ==
    pub fn new(
        config: ResourceConfig,
        clock: SharedClock,
        releaser: Arc<dyn HandleReleaser>,
    ) -> Self {
        Self {
            resources: HashMap::new(),
            memory_usage: 0,
            config,
            clock,
            releaser,
            next_seq: 0,
        }
    }

    // == Add ==
    /// Inserts a resource, replacing (and releasing) any resource with the same id.
    ///
    /// When the new size would push usage over budget, lower-priority and
    /// least-recently-used resources are evicted first. Critical resources are
    /// never evicted for space, so usage may still end up over budget.
    pub fn add(&mut self, new: NewResource) {
        if self.take(&new.id).is_some() {
            debug!(id = %new.id, "replacing existing resource");
        }

        let now = self.clock.now_ms();
        self.next_seq += 1;
        let resource = Resource::from_new(new, now, self.next_seq);

        if self.memory_usage + resource.size_bytes > self.config.max_memory_bytes {
            self.make_space(resource.size_bytes);
        }

        self.memory_usage += resource.size_bytes;
        self.resources.insert(resource.id.clone(), resource);
    }

    // == Get ==
    /// Returns a copy of the resource and records the access. Age limits are
    /// enforced only by [`ResourceStore::sweep_aged`].
    pub fn get(&mut self, id: &str) -> Option<Resource> {
        let now = self.clock.now_ms();
        self.next_seq += 1;
        let resource = self.resources.get_mut(id)?;
        resource.access_count += 1;
        resource.last_accessed_at = now;
        resource.seq = self.next_seq;
        Some(resource.clone())
    }

    pub fn has(&self, id: &str) -> bool {
        self.resources.contains_key(id)
    }

    // == Remove ==
    pub fn remove(&mut self, id: &str) -> bool {
        self.take(id).is_some()
    }

    pub fn clear(&mut self) {
        let ids: Vec<String> = self.resources.keys().cloned().collect();
        for id in ids {
            self.take(&id);
        }
    }

    // == Space-Making Eviction ==
    /// Evicts non-critical resources, lowest priority then oldest access first,
    /// until `incoming` bytes fit in the budget or no candidates remain.
    ///
    /// Returns the bytes freed.
    pub fn make_space(&mut self, incoming: usize) -> usize {
        let budget = self.config.max_memory_bytes;
        let mut candidates: Vec<(ResourcePriority, u64, u64, String)> = self
            .resources
            .values()
            .filter(|resource| resource.priority.is_evictable())
            .map(|resource| {
                let (priority, at, seq) = resource.eviction_rank();
                (priority, at, seq, resource.id.clone())
            })
            .collect();
        candidates.sort();

        let mut freed = 0;
        for (_, _, _, id) in candidates {
            if self.memory_usage + incoming <= budget {
                break;
            }
            if let Some(resource) = self.take(&id) {
                freed += resource.size_bytes;
            }
        }

        if self.memory_usage + incoming > budget {
            warn!(
                memory_usage = self.memory_usage,
                incoming,
                budget,
                "resource budget exceeded after evicting every non-critical resource"
            );
        } else if freed > 0 {
            info!(freed, incoming, "evicted resources to make space");
        }
        freed
    }

    // == Age Sweep ==
    /// Removes every resource idle longer than its priority's max age,
    /// critical included. Returns the number removed.
    pub fn sweep_aged(&mut self) -> usize {
        let now = self.clock.now_ms();
        let aged: Vec<String> = self
            .resources
            .values()
            .filter(|resource| resource.is_aged_out(now))
            .map(|resource| resource.id.clone())
            .collect();

        for id in &aged {
            self.take(id);
        }
        aged.len()
    }

    // == Aggressive Cleanup ==
    /// Drops all low-priority resources, then all medium-priority ones if usage
    /// is still above 70% of the budget. High and critical are left alone.
    pub fn aggressive_cleanup(&mut self) -> usize {
        let mut removed = self.remove_priority(ResourcePriority::Low);
        if self.memory_usage > aggressive_target(self.config.max_memory_bytes) {
            removed += self.remove_priority(ResourcePriority::Medium);
        }
        removed
    }

    pub fn stats(&self) -> ResourceStats {
        ResourceStats::from_resources(
            self.resources.values(),
            self.memory_usage,
            self.config.max_memory_bytes,
        )
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    // == Internals ==
    fn remove_priority(&mut self, priority: ResourcePriority) -> usize {
        let ids: Vec<String> = self
            .resources
            .values()
            .filter(|resource| resource.priority == priority)
            .map(|resource| resource.id.clone())
            .collect();
        for id in &ids {
            self.take(id);
        }
        ids.len()
    }

    /// Single removal path: debits the size and releases any blob handle.
    fn take(&mut self, id: &str) -> Option<Resource> {
        let resource = self.resources.remove(id)?;
        self.memory_usage = self.memory_usage.saturating_sub(resource.size_bytes);
        if let Some(url) = resource.releasable_handle() {
            self.releaser.release(url);
        }
        Some(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::resources::test_support::RecordingReleaser;
    use crate::resources::{ResourceKind, ResourcePayload};
    use serde_json::json;

    const HOUR_MS: u64 = 3_600_000;

    struct Fixture {
        store: ResourceStore,
        clock: Arc<ManualClock>,
        releaser: Arc<RecordingReleaser>,
    }

    fn fixture(budget: usize) -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let releaser = Arc::new(RecordingReleaser::default());
        let store = ResourceStore::new(
            ResourceConfig::new(budget),
            clock.clone(),
            releaser.clone(),
        );
        Fixture {
            store,
            clock,
            releaser,
        }
    }

    fn data(id: &str, size: usize, priority: ResourcePriority) -> NewResource {
        NewResource::new(
            id,
            ResourceKind::Data,
            ResourcePayload::Json(json!({ "id": id })),
            priority,
        )
        .with_size(size)
    }

    fn image_blob(id: &str, size: usize, priority: ResourcePriority) -> NewResource {
        NewResource::new(
            id,
            ResourceKind::Image,
            ResourcePayload::Blob {
                url: format!("blob:{}", id),
            },
            priority,
        )
        .with_size(size)
    }

    fn summed_sizes(store: &ResourceStore) -> usize {
        store.resources.values().map(|r| r.size_bytes).sum()
    }

    #[test]
    fn test_add_and_get_touches() {
        let mut f = fixture(1_000);
        f.store.add(data("a", 100, ResourcePriority::Medium));

        f.clock.advance(50);
        let resource = f.store.get("a").unwrap();
        assert_eq!(resource.access_count, 1);
        assert_eq!(resource.last_accessed_at, 50);
        assert_eq!(f.store.memory_usage(), 100);
        assert!(f.store.get("missing").is_none());
    }

    #[test]
    fn test_replace_releases_and_debits_old() {
        let mut f = fixture(1_000);
        f.store.add(image_blob("hero", 300, ResourcePriority::High));
        f.store.add(image_blob("hero", 200, ResourcePriority::High));

        assert_eq!(f.store.len(), 1);
        assert_eq!(f.store.memory_usage(), 200);
        assert_eq!(f.releaser.released(), vec!["blob:hero".to_string()]);
    }

    #[test]
    fn test_remove_releases_image_blob_only() {
        let mut f = fixture(1_000);
        f.store.add(image_blob("img", 10, ResourcePriority::Low));
        f.store.add(data("doc", 10, ResourcePriority::Low));

        assert!(f.store.remove("img"));
        assert!(f.store.remove("doc"));
        assert!(!f.store.remove("doc"));
        assert_eq!(f.releaser.released(), vec!["blob:img".to_string()]);
        assert_eq!(f.store.memory_usage(), 0);
    }

    #[test]
    fn test_space_eviction_orders_by_priority_then_recency() {
        let mut f = fixture(300);
        f.store.add(data("high", 100, ResourcePriority::High));
        f.clock.advance(1);
        f.store.add(data("low-old", 100, ResourcePriority::Low));
        f.clock.advance(1);
        f.store.add(data("low-new", 100, ResourcePriority::Low));

        f.store.add(data("incoming", 100, ResourcePriority::Medium));

        assert!(!f.store.has("low-old"));
        assert!(f.store.has("low-new"));
        assert!(f.store.has("high"));
        assert_eq!(f.store.memory_usage(), 300);
    }

    #[test]
    fn test_critical_is_never_evicted_for_space() {
        let mut f = fixture(200);
        f.store.add(data("B", 100, ResourcePriority::Critical));
        f.clock.advance(10);
        f.store.add(data("A", 100, ResourcePriority::Low));

        // Needs everything non-critical gone, and then some
        f.store.add(data("big", 150, ResourcePriority::High));

        assert!(!f.store.has("A"));
        assert!(f.store.has("B"));
        assert!(f.store.has("big"));
        // Over budget is allowed once only critical remains to sacrifice
        assert_eq!(f.store.memory_usage(), 250);
        assert_eq!(f.store.memory_usage(), summed_sizes(&f.store));
    }

    #[test]
    fn test_sweep_aged_by_tier_and_access_resets_clock() {
        let mut f = fixture(10_000);
        f.store.add(data("low", 10, ResourcePriority::Low));
        f.store.add(data("medium", 10, ResourcePriority::Medium));
        f.store.add(data("critical", 10, ResourcePriority::Critical));
        f.store.add(data("low-touched", 10, ResourcePriority::Low));

        f.clock.advance(20 * 60_000);
        f.store.get("low-touched");
        f.clock.advance(20 * 60_000);

        assert_eq!(f.store.sweep_aged(), 1);
        assert!(!f.store.has("low"));
        assert!(f.store.has("low-touched"));

        f.clock.advance(25 * HOUR_MS);
        assert_eq!(f.store.sweep_aged(), 3);
        assert!(f.store.is_empty());
        assert_eq!(f.store.memory_usage(), 0);
    }

    #[test]
    fn test_aggressive_cleanup_stops_after_low_when_under_target() {
        let mut f = fixture(1_000);
        f.store.add(data("low", 400, ResourcePriority::Low));
        f.store.add(data("medium", 300, ResourcePriority::Medium));
        f.store.add(data("high", 200, ResourcePriority::High));

        assert_eq!(f.store.aggressive_cleanup(), 1);
        assert!(f.store.has("medium"));
        assert_eq!(f.store.memory_usage(), 500);
    }

    #[test]
    fn test_aggressive_cleanup_drops_medium_when_still_high() {
        let mut f = fixture(1_000);
        f.store.add(data("low", 100, ResourcePriority::Low));
        f.store.add(data("medium", 100, ResourcePriority::Medium));
        f.store.add(data("high", 400, ResourcePriority::High));
        f.store.add(data("critical", 400, ResourcePriority::Critical));

        assert_eq!(f.store.aggressive_cleanup(), 2);
        assert!(f.store.has("high"));
        assert!(f.store.has("critical"));
        assert_eq!(f.store.memory_usage(), 800);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut f = fixture(1_000);
        f.store.add(image_blob("a", 10, ResourcePriority::Low));
        f.store.add(image_blob("b", 10, ResourcePriority::Critical));

        f.store.clear();
        assert!(f.store.is_empty());
        assert_eq!(f.store.memory_usage(), 0);
        assert_eq!(f.releaser.released().len(), 2);
    }

    #[test]
    fn test_stats() {
        let mut f = fixture(1_000);
        f.store.add(image_blob("a", 250, ResourcePriority::Low));
        f.store.add(data("b", 250, ResourcePriority::High));

        let stats = f.store.stats();
        assert_eq!(stats.total_resources, 2);
        assert_eq!(stats.memory_usage, 500);
        assert_eq!(stats.max_memory_usage, 1_000);
        assert_eq!(stats.usage_percentage, 50.0);
        assert_eq!(stats.counts_by_type[&ResourceKind::Image], 1);
        assert_eq!(stats.counts_by_priority[&ResourcePriority::High], 1);
    }
}
