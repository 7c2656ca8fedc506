//! Stress Tests for Concurrent Access
//!
//! These tests verify thread safety and the capacity and consistency
//! guarantees under high contention, with the tuner running.

use hybrid_cache::{CacheMetrics, HybridCache, HybridCacheConfig};
use scoped_threadpool::Pool;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const NUM_THREADS: usize = 16;
const OPS_PER_THREAD: usize = 10_000;

fn config(capacity: usize, segments: usize) -> HybridCacheConfig {
    HybridCacheConfig::new(NonZeroUsize::new(capacity).unwrap())
        .with_segments(segments)
        .with_tune_interval(Duration::from_millis(5))
}

/// Test high contention with many threads hammering the same keys
#[test]
fn stress_high_contention() {
    let cache: Arc<HybridCache<usize, usize>> =
        Arc::new(HybridCache::from_config(config(8, 16)).unwrap());

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                let key = i % 10; // 10 keys, 8 slots
                if t % 2 == 0 {
                    cache.put(key, t * OPS_PER_THREAD + i);
                } else {
                    let _ = cache.get(&key);
                }
                assert!(cache.len() <= 8);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(cache.len() <= 8);
    assert!(cache.is_consistent());
}

/// Test capacity limits with disjoint keys per thread
#[test]
fn stress_capacity_limits() {
    let capacity = 100;
    let cache: Arc<HybridCache<usize, usize>> =
        Arc::new(HybridCache::from_config(config(capacity, 16)).unwrap());

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                cache.put(t * OPS_PER_THREAD + i, i);
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert_eq!(cache.len(), capacity);
    assert!(cache.is_consistent());

    let metrics = cache.metrics();
    let inserted = metrics["insertions"] as usize;
    let evicted = metrics["evictions"] as usize;
    assert_eq!(inserted, NUM_THREADS * OPS_PER_THREAD);
    assert_eq!(inserted - evicted, capacity);
}

/// Test with various segment counts
#[test]
fn stress_segment_counts() {
    for segments in [1, 2, 4, 8, 16, 32] {
        let cache: HybridCache<usize, usize> =
            HybridCache::from_config(config(1000, segments)).unwrap();
        let mut pool = Pool::new(8);

        pool.scoped(|scope| {
            for t in 0..8 {
                let cache = &cache;
                scope.execute(move || {
                    for i in 0..1000 {
                        cache.put(t * 1000 + i, i);
                        let _ = cache.get(&(t * 1000 + i));
                    }
                });
            }
        });

        assert_eq!(cache.segment_count(), segments);
        assert!(cache.len() <= 1000);
        assert!(cache.is_consistent());
    }
}

/// No increment is lost when many threads read one key
#[test]
fn stress_frequency_not_lost() {
    let cache: HybridCache<&str, u32> = HybridCache::from_config(config(4, 4)).unwrap();
    cache.put("shared", 0);
    let mut pool = Pool::new(NUM_THREADS as u32);

    pool.scoped(|scope| {
        for _ in 0..NUM_THREADS {
            let cache = &cache;
            scope.execute(move || {
                for _ in 0..1000 {
                    assert_eq!(cache.get("shared"), Some(0));
                }
            });
        }
    });

    let meta = cache.peek("shared").unwrap().meta();
    assert_eq!(meta.frequency, 1 + (NUM_THREADS * 1000) as u64);
    assert_eq!(cache.stats().hits, (NUM_THREADS * 1000) as u64);
}

/// Mixed get/put/remove traffic while the tuner keeps publishing weights
#[test]
fn stress_mixed_operations_with_tuner() {
    let cache: Arc<HybridCache<usize, usize>> =
        Arc::new(HybridCache::from_config(config(64, 8)).unwrap());

    let mut handles = Vec::new();
    for t in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD / 4 {
                let key = (i * 7 + t) % 200;
                match i % 4 {
                    0 | 1 => cache.put(key, i),
                    2 => {
                        let _ = cache.get(&key);
                    }
                    _ => {
                        let _ = cache.remove(&key);
                    }
                }
                let weight = cache.policy_weight();
                assert!((0.0..=1.0).contains(&weight));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(cache.len() <= 64);
    assert!(cache.is_consistent());
    let weight = cache.policy_weight();
    assert!((0.0..=1.0).contains(&weight));

    cache.shutdown();
    assert!(!cache.is_tuning());
}

/// Concurrent tuning cycles each apply exactly one smoothing step
#[test]
fn stress_concurrent_tune_cycles_compose() {
    const TUNERS: usize = 8;
    const CYCLES_PER_THREAD: usize = 4;

    let config = HybridCacheConfig::new(NonZeroUsize::new(16).unwrap())
        .with_tune_interval(Duration::from_secs(3600));
    let cache: HybridCache<usize, usize> = HybridCache::from_config(config).unwrap();
    cache.shutdown();

    let mut pool = Pool::new(TUNERS as u32);
    pool.scoped(|scope| {
        for _ in 0..TUNERS {
            let cache = &cache;
            scope.execute(move || {
                for _ in 0..CYCLES_PER_THREAD {
                    cache.tune_now();
                }
            });
        }
    });

    // empty cache: neutral stats, fixed target of 1/3
    let step = |w: f64| 0.8 * w + 0.2 * (1.0 / 3.0);
    let mut expected = 0.5;
    for _ in 0..TUNERS * CYCLES_PER_THREAD - 1 {
        expected = step(expected);
    }
    let one_short = expected;
    expected = step(expected);

    let weight = cache.policy_weight();
    assert!((weight - expected).abs() < 1e-12, "weight {weight}");
    assert!((weight - one_short).abs() > 1e-6);
    assert_eq!(
        cache.metrics()["tuning_cycles"],
        (TUNERS * CYCLES_PER_THREAD) as f64
    );
}

/// Test edge case: empty cache operations
#[test]
fn stress_empty_cache() {
    let cache: Arc<HybridCache<usize, usize>> =
        Arc::new(HybridCache::from_config(config(100, 16)).unwrap());

    let mut handles = Vec::new();
    for _ in 0..NUM_THREADS {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..1000 {
                assert!(cache.get(&i).is_none());
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    assert!(cache.is_empty());
    assert_eq!(cache.stats().misses, (NUM_THREADS * 1000) as u64);
}

/// Dropping the last handle stops the tuner thread
#[test]
fn stress_drop_while_tuning() {
    for _ in 0..20 {
        let cache: HybridCache<usize, usize> =
            HybridCache::from_config(config(16, 4)).unwrap();
        for i in 0..32 {
            cache.put(i, i);
        }
        drop(cache);
    }
}
