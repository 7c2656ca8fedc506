//! Cache Metrics
//!
//! Counters are plain atomics updated on the hot path with relaxed ordering;
//! they are monotonic tallies, not synchronization points.
//!
//! Two views are offered:
//!
//! - [`CacheStats`]: the small `{size, capacity, hits, misses}` snapshot
//!   returned by [`HybridCache::stats`](crate::HybridCache::stats).
//! - [`CacheMetrics`]: a `BTreeMap<String, f64>` report with every counter and
//!   derived rate. BTreeMap keeps the key order deterministic, which makes the
//!   output stable for logs and test comparisons.

use std::collections::BTreeMap;
use std::string::{String, ToString};
use std::sync::atomic::{AtomicU64, Ordering};

/// Read-only snapshot of the headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Live entries.
    pub size: usize,
    /// Maximum live entries.
    pub capacity: usize,
    /// `get` calls that found their key.
    pub hits: u64,
    /// `get` calls that did not.
    pub misses: u64,
}

impl CacheStats {
    /// Hits over total lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let requests = self.hits + self.misses;
        if requests > 0 {
            self.hits as f64 / requests as f64
        } else {
            0.0
        }
    }
}

/// Event counters shared by every thread using a cache.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    updates: AtomicU64,
    evictions: AtomicU64,
    fallback_evictions: AtomicU64,
    removals: AtomicU64,
    tuning_cycles: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $get:ident, $field:ident) => {
        #[doc = concat!("Increments the `", stringify!($field), "` counter.")]
        #[inline]
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }

        #[doc = concat!("Current value of the `", stringify!($field), "` counter.")]
        #[inline]
        pub fn $get(&self) -> u64 {
            self.$field.load(Ordering::Relaxed)
        }
    };
}

impl CacheCounters {
    counter!(record_hit, hits, hits);
    counter!(record_miss, misses, misses);
    counter!(record_insertion, insertions, insertions);
    counter!(record_update, updates, updates);
    counter!(record_eviction, evictions, evictions);
    counter!(record_fallback_eviction, fallback_evictions, fallback_evictions);
    counter!(record_removal, removals, removals);
    counter!(record_tuning_cycle, tuning_cycles, tuning_cycles);

    /// Writes every counter plus derived rates into `metrics`.
    pub fn fill(&self, metrics: &mut BTreeMap<String, f64>) {
        let hits = self.hits();
        let misses = self.misses();
        let requests = hits + misses;

        metrics.insert("cache_hits".to_string(), hits as f64);
        metrics.insert("cache_misses".to_string(), misses as f64);
        metrics.insert("requests".to_string(), requests as f64);
        metrics.insert("insertions".to_string(), self.insertions() as f64);
        metrics.insert("updates".to_string(), self.updates() as f64);
        metrics.insert("evictions".to_string(), self.evictions() as f64);
        metrics.insert(
            "fallback_evictions".to_string(),
            self.fallback_evictions() as f64,
        );
        metrics.insert("removals".to_string(), self.removals() as f64);
        metrics.insert("tuning_cycles".to_string(), self.tuning_cycles() as f64);

        if requests > 0 {
            metrics.insert("hit_rate".to_string(), hits as f64 / requests as f64);
            metrics.insert("miss_rate".to_string(), misses as f64 / requests as f64);
        } else {
            metrics.insert("hit_rate".to_string(), 0.0);
            metrics.insert("miss_rate".to_string(), 0.0);
        }
    }

    /// Zeroes the request counters (hits and misses).
    pub fn reset_requests(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

/// Uniform metrics reporting.
pub trait CacheMetrics {
    /// All metrics as name/value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Short identifier of the eviction algorithm.
    fn algorithm_name(&self) -> &'static str;
}
