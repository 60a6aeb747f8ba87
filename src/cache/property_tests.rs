//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain HashMap model.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::cache::{BoundedStore, BoundedTtlCache};
use crate::clock::ManualClock;
use crate::persist::FreezeDried;

// == Test Configuration ==
const TEST_LIFETIME: Duration = Duration::from_secs(300);

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,8}".prop_map(|s| s)
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}".prop_map(|s| s)
}

/// A cache operation, including moving the clock forward
#[derive(Debug, Clone)]
enum CacheOp {
    Insert { key: String, value: String },
    Get { key: String },
    Remove { key: String },
    Advance { secs: u64 },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Insert { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        2 => (0u64..400).prop_map(|secs| CacheOp::Advance { secs }),
        1 => Just(CacheOp::Clear),
    ]
}

fn make_cache(count_limit: usize) -> (BoundedTtlCache<String, String>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = BoundedTtlCache::new(clock.clone(), Some(TEST_LIFETIME), count_limit);
    (cache, clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Keys never inserted are always a miss.
    #[test]
    fn prop_uninserted_keys_miss(
        inserted in prop::collection::hash_set(key_strategy(), 0..20),
        missing_key in key_strategy()
    ) {
        prop_assume!(!inserted.contains(&missing_key));
        let (cache, _) = make_cache(0);
        for key in &inserted {
            cache.insert(key.clone(), "v".to_string());
        }

        prop_assert_eq!(cache.value(&missing_key), None);
    }

    // A lookup agrees with a model that tracks insert instants.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (cache, clock) = make_cache(0);
        let mut now: u64 = 0;
        let mut model: HashMap<String, (String, u64)> = HashMap::new();

        for op in ops {
            match op {
                CacheOp::Insert { key, value } => {
                    cache.insert(key.clone(), value.clone());
                    model.insert(key, (value, now));
                }
                CacheOp::Get { key } => {
                    let expected = match model.get(&key) {
                        Some((value, at)) if now < at + TEST_LIFETIME.as_secs() => Some(value.clone()),
                        _ => None,
                    };
                    if expected.is_none() {
                        model.remove(&key);
                    }
                    prop_assert_eq!(cache.value(&key), expected);
                }
                CacheOp::Remove { key } => {
                    cache.remove_value(&key);
                    model.remove(&key);
                }
                CacheOp::Advance { secs } => {
                    clock.advance(Duration::from_secs(secs));
                    now += secs;
                }
                CacheOp::Clear => {
                    cache.clear();
                    model.clear();
                }
            }

            // Expired-but-unread entries still count, exactly like the model.
            let model_keys: HashSet<String> = model.keys().cloned().collect();
            prop_assert_eq!(cache.keys(), model_keys);
        }
    }

    // Freeze-dry then reconstruct keeps every live pair.
    #[test]
    fn prop_freeze_dry_round_trip(
        entries in prop::collection::hash_map(key_strategy(), value_strategy(), 0..40)
    ) {
        let (cache, clock) = make_cache(0);
        for (key, value) in &entries {
            cache.insert(key.clone(), value.clone());
        }

        let bytes = cache.freeze_dry().to_json().unwrap();
        let snapshot = FreezeDried::<String, String>::from_json(&bytes).unwrap();
        let thawed = BoundedTtlCache::reconstruct(snapshot, clock, Some(TEST_LIFETIME), 0);

        prop_assert_eq!(thawed.keys(), cache.keys());
        for (key, value) in &entries {
            prop_assert_eq!(thawed.value(key), Some(value.clone()));
        }
    }

    // With a capacity, the tracked keys always match what the store holds.
    #[test]
    fn prop_keys_follow_store_evictions(
        keys in prop::collection::vec(key_strategy(), 1..120),
        limit in 1usize..16
    ) {
        let (cache, _) = make_cache(limit);
        for key in keys {
            cache.insert(key, "v".to_string());
            prop_assert!(cache.count() <= limit);
            prop_assert_eq!(cache.count(), cache.with_store_mut(|store| store.len()));
        }
        for key in cache.keys() {
            prop_assert!(cache.value(&key).is_some());
        }
    }
}

// Concurrent inserts against a small capacity never leave an evicted key behind.
#[test]
fn concurrent_inserts_keep_keys_in_sync() {
    let clock = Arc::new(ManualClock::default());
    let cache: Arc<BoundedTtlCache<String, usize>> =
        Arc::new(BoundedTtlCache::new(clock, Some(TEST_LIFETIME), 8));

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..250 {
                    cache.insert(format!("{}-{}", worker, i), i);
                    if i % 7 == 0 {
                        cache.remove_value(&format!("{}-{}", worker, i / 2));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let keys = cache.keys();
    assert!(keys.len() <= 8);
    assert_eq!(keys.len(), cache.with_store_mut(|store| store.len()));
    for key in keys {
        assert!(cache.value(&key).is_some(), "tracked key {} missing from store", key);
    }
}
