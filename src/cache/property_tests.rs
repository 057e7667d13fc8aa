//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, byte accounting and delete semantics over
//! arbitrary operation sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{estimate_size, CacheStore};
use crate::clock::ManualClock;
use crate::config::CacheConfig;

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 20;
const TEST_DEFAULT_TTL_MS: u64 = 1_000;

fn test_store(max_entries: usize) -> (CacheStore<Value>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(0));
    let store = CacheStore::new(
        CacheConfig::new(max_entries, TEST_DEFAULT_TTL_MS),
        clock.clone(),
    );
    (store, clock)
}

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e][0-9]".prop_map(|s| s)
}

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 ]{0,64}".prop_map(|s| json!(s)),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(|v| json!(v)),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value, ttl: Option<u64> },
    Get { key: String },
    Delete { key: String },
    Advance { ms: u64 },
    Sweep,
    Aggressive,
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        6 => (key_strategy(), value_strategy(), prop::option::of(1u64..2_000))
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        4 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        2 => (0u64..700).prop_map(|ms| CacheOp::Advance { ms }),
        1 => Just(CacheOp::Sweep),
        1 => Just(CacheOp::Aggressive),
        1 => Just(CacheOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // For any operation sequence, the byte counter equals the sum of the
    // estimated sizes of the entries still present, and the entry count never
    // exceeds max_entries.
    #[test]
    fn prop_byte_counter_and_capacity(ops in prop::collection::vec(cache_op_strategy(), 1..120)) {
        let (mut store, clock) = test_store(TEST_MAX_ENTRIES);
        // Model of what is resident: key -> estimated size
        let mut sizes: HashMap<String, usize> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Set { key, value, ttl } => {
                    sizes.insert(key.clone(), estimate_size(&key, &value));
                    store.set(key, value, ttl);
                }
                CacheOp::Get { key } => { store.get(&key); }
                CacheOp::Delete { key } => { store.delete(&key); }
                CacheOp::Advance { ms } => clock.advance(ms),
                CacheOp::Sweep => { store.cleanup_expired(); }
                CacheOp::Aggressive => { store.aggressive_cleanup(); }
                CacheOp::Clear => store.clear(),
            }

            prop_assert!(store.len() <= TEST_MAX_ENTRIES);
            // Drop model keys the store no longer holds (evicted or expired)
            sizes.retain(|key, _| store.is_resident(key));
            prop_assert_eq!(sizes.len(), store.len());
            prop_assert_eq!(store.memory_usage(), sizes.values().sum::<usize>());
        }
    }

    // Inserting N + M distinct never-read keys keeps exactly the N most recent.
    #[test]
    fn prop_capacity_keeps_most_recent(max_entries in 1usize..15, extra in 1usize..15) {
        let (mut store, clock) = test_store(max_entries);
        let total = max_entries + extra;

        for i in 0..total {
            store.set(format!("key-{}", i), json!(i), None);
            clock.advance(1);
        }

        prop_assert_eq!(store.len(), max_entries);
        for i in 0..total {
            let expected = i >= extra;
            prop_assert_eq!(store.has(&format!("key-{}", i)), expected, "key-{}", i);
        }
    }

    // Reads refresh recency: a key read after every insert survives any amount of churn.
    #[test]
    fn prop_recently_read_key_survives(max_entries in 2usize..10, churn in 1usize..40) {
        let (mut store, clock) = test_store(max_entries);
        store.set("hot", json!("keep me"), Some(u64::MAX / 2));

        for i in 0..churn {
            clock.advance(1);
            store.set(format!("cold-{}", i), json!(i), None);
            prop_assert_eq!(store.get("hot"), Some(json!("keep me")));
        }
    }

    // Deleting an absent key changes nothing.
    #[test]
    fn prop_delete_absent_is_idempotent(
        keys in prop::collection::vec(key_strategy(), 0..10),
        missing in "[x-z][0-9]"
    ) {
        let (mut store, _) = test_store(TEST_MAX_ENTRIES);
        for key in keys {
            store.set(key, json!(true), None);
        }
        let len = store.len();
        let usage = store.memory_usage();

        prop_assert!(!store.delete(&missing));
        prop_assert_eq!(store.len(), len);
        prop_assert_eq!(store.memory_usage(), usage);
    }

    // No read returns an entry past its TTL, sweep or not.
    #[test]
    fn prop_ttl_enforced_on_read(ttl in 1u64..5_000, past in 1u64..5_000) {
        let (mut store, clock) = test_store(TEST_MAX_ENTRIES);
        store.set("k", json!("v"), Some(ttl));

        clock.advance(ttl);
        prop_assert!(store.has("k"));

        clock.advance(past);
        prop_assert_eq!(store.get("k"), None);
        prop_assert!(!store.has("k"));
    }

    // Round-trip through the JSON transform is exact.
    #[test]
    fn prop_json_transform_round_trip(key in key_strategy(), value in value_strategy()) {
        let clock = Arc::new(ManualClock::new(0));
        let mut store: CacheStore<Value> = CacheStore::new(
            CacheConfig::new(TEST_MAX_ENTRIES, TEST_DEFAULT_TTL_MS).with_compression(true),
            clock,
        );

        store.set(key.clone(), value.clone(), None);
        prop_assert_eq!(store.get(&key), Some(value));
    }
}

// Aggressive cleanup lands at or under 70% of the byte budget.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_aggressive_cleanup_target(
        budget in 50usize..2_000,
        values in prop::collection::vec("[a-z]{0,80}", 1..60)
    ) {
        let clock = Arc::new(ManualClock::new(0));
        let mut store: CacheStore<Value> = CacheStore::new(
            CacheConfig::new(1_000, TEST_DEFAULT_TTL_MS).with_max_memory_bytes(budget),
            clock.clone(),
        );
        for (i, value) in values.into_iter().enumerate() {
            store.set(format!("k{}", i), json!(value), None);
            clock.advance(1);
        }

        store.aggressive_cleanup();
        prop_assert!(store.is_empty() || store.memory_usage() * 10 <= budget * 7);
    }
}
