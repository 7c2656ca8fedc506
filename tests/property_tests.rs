//! Property Tests
//!
//! Random operation sequences checked against the cache's structural
//! guarantees: bounded size, both internal structures in step, last write
//! wins, and a policy weight that never leaves `[0, 1]`.

use hybrid_cache::{HybridCache, HybridCacheConfig};
use proptest::prelude::*;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Op {
    Put(u8, u32),
    Get(u8),
    Remove(u8),
    Tune,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any::<u8>(), any::<u32>()).prop_map(|(k, v)| Op::Put(k % 32, v)),
        4 => any::<u8>().prop_map(|k| Op::Get(k % 32)),
        1 => any::<u8>().prop_map(|k| Op::Remove(k % 32)),
        1 => Just(Op::Tune),
    ]
}

fn make_cache(capacity: usize, weight: f64) -> HybridCache<u8, u32> {
    let config = HybridCacheConfig::new(NonZeroUsize::new(capacity).unwrap())
        .with_tune_interval(Duration::from_secs(3600))
        .with_initial_weight(weight)
        .with_segments(4);
    HybridCache::from_config(config).unwrap()
}

proptest! {
    #[test]
    fn size_bounded_and_structures_agree(
        capacity in 1usize..12,
        weight in 0.0f64..=1.0,
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let cache = make_cache(capacity, weight);
        for op in ops {
            match op {
                Op::Put(k, v) => cache.put(k, v),
                Op::Get(k) => { cache.get(&k); }
                Op::Remove(k) => { cache.remove(&k); }
                Op::Tune => { cache.tune_now(); }
            }
            prop_assert!(cache.len() <= capacity);
            prop_assert!(cache.is_consistent());
        }
    }

    #[test]
    fn cached_values_are_last_written(
        capacity in 1usize..12,
        ops in prop::collection::vec(op(), 0..200),
    ) {
        let cache = make_cache(capacity, 0.5);
        let mut written: HashMap<u8, u32> = HashMap::new();
        for op in ops {
            match op {
                Op::Put(k, v) => {
                    cache.put(k, v);
                    written.insert(k, v);
                    prop_assert_eq!(cache.get(&k), Some(v));
                }
                Op::Get(k) => {
                    // evicted keys may be absent, but a present key has its last value
                    if let Some(v) = cache.get(&k) {
                        prop_assert_eq!(Some(&v), written.get(&k));
                    }
                }
                Op::Remove(k) => {
                    cache.remove(&k);
                    written.remove(&k);
                    prop_assert!(!cache.contains_key(&k));
                }
                Op::Tune => { cache.tune_now(); }
            }
        }
    }

    #[test]
    fn overflow_put_evicts_exactly_one(
        capacity in 1usize..8,
        extra in 1usize..20,
    ) {
        let cache = make_cache(capacity, 0.5);
        for k in 0..capacity {
            cache.put(k as u8, 0);
        }
        for k in 0..extra {
            let before = cache.len();
            cache.put((capacity + k) as u8, 1);
            prop_assert_eq!(cache.len(), before);
            prop_assert!(cache.contains_key(&((capacity + k) as u8)));
        }
    }

    #[test]
    fn weight_stays_in_unit_interval(
        initial in 0.0f64..=1.0,
        reads in prop::collection::vec(0u8..8, 0..100),
        cycles in 1usize..30,
    ) {
        let cache = make_cache(8, initial);
        for k in 0..8u8 {
            cache.put(k, 0);
        }
        for k in reads {
            cache.get(&k);
        }
        let starts_inside = (0.05..=0.95).contains(&initial);
        for _ in 0..cycles {
            let w = cache.tune_now();
            prop_assert!((0.0..=1.0).contains(&w));
            // a blend of two points inside the clamp band stays inside it
            if starts_inside {
                prop_assert!((0.05 - 1e-12..=0.95 + 1e-12).contains(&w));
            }
        }
    }
}
