//! Hybrid LFU/LRU Cache
//!
//! [`HybridCache`] ties the pieces together:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          HybridCache                             │
//! │                                                                  │
//! │   get / put / remove ──▶ Mutex<RecencyIndex> ──▶ EntryStore      │
//! │                               │                  (striped)       │
//! │                     overflow  ▼                      ▲           │
//! │                        evict_one ── score(w) ────────┘           │
//! │                                        ▲                         │
//! │                                  PolicyWeight                    │
//! │                                        ▲                         │
//! │   tuner thread ── snapshot_all ── tune ┘   (every tune_interval) │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Consistency
//!
//! The entry store and the recency index are two facets of one logical map.
//! Every operation that changes either facet holds the recency mutex for its
//! whole duration and takes the store stripe lock inside it, so a key is
//! never left in one facet without the other. The tuner only read-locks store
//! stripes, one at a time, and never touches the recency index; it cannot
//! stall `get` or `put` for longer than one stripe scan.
//!
//! # Example
//!
//! ```
//! use hybrid_cache::HybridCache;
//! use std::time::Duration;
//!
//! let cache = HybridCache::new(2, Duration::from_secs(5)).unwrap();
//! cache.put(1, "a");
//! cache.put(2, "b");
//! cache.get(&1);      // 1 is now hotter and more recent than 2
//! cache.put(3, "c");  // evicts 2
//!
//! assert_eq!(cache.get(&2), None);
//! assert_eq!(cache.get(&1), Some("a"));
//! assert_eq!(cache.get(&3), Some("c"));
//! cache.shutdown();
//! ```

use crate::config::HybridCacheConfig;
use crate::entry::{CacheEntry, Clock};
use crate::error::Result;
use crate::eviction::{self, EvictionPath};
use crate::metrics::{CacheCounters, CacheMetrics, CacheStats};
use crate::policy::PolicyWeight;
use crate::recency::RecencyIndex;
use crate::store::{EntryStore, Upsert};
use crate::tuner::{self, Tuner};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::num::NonZeroUsize;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::string::{String, ToString};
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;

/// State shared between the cache handle and the tuner thread.
struct Shared<K, V, S> {
    store: EntryStore<K, V, S>,
    recency: Mutex<RecencyIndex<K, S>>,
    weight: PolicyWeight,
    counters: CacheCounters,
    clock: Clock,
    capacity: NonZeroUsize,
}

impl<K, V, S> Shared<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    fn tune_once(&self) -> f64 {
        let metas = self.store.snapshot_all();
        let (_, weight) = tuner::tune(&metas, self.clock.now(), &self.weight);
        self.counters.record_tuning_cycle();
        weight
    }
}

/// A thread-safe, size-bounded cache with sampled hybrid LFU/LRU eviction
/// and a self-tuning policy weight.
pub struct HybridCache<K, V, S = DefaultHashBuilder> {
    shared: Arc<Shared<K, V, S>>,
    tuner: Mutex<Option<Tuner>>,
}

impl<K, V> HybridCache<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache holding at most `capacity` entries and re-tuning its
    /// policy weight every `tune_interval`.
    ///
    /// A `capacity` of zero is treated as one.
    pub fn new(capacity: usize, tune_interval: Duration) -> Result<Self> {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self::from_config(HybridCacheConfig::new(capacity).with_tune_interval(tune_interval))
    }

    /// Creates a cache from a configuration using the default hasher.
    pub fn from_config(config: HybridCacheConfig) -> Result<Self> {
        Self::init(config, None)
    }
}

impl<K, V, S> HybridCache<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: BuildHasher + Clone + Default + Send + Sync + 'static,
{
    /// Creates a cache from a configuration and an optional hasher.
    ///
    /// Validates the configuration, builds the store and recency index, and
    /// starts the tuner thread.
    pub fn init(config: HybridCacheConfig, hasher: Option<S>) -> Result<Self> {
        config.validate()?;
        let hash_builder = hasher.unwrap_or_default();

        let shared = Arc::new(Shared {
            store: EntryStore::with_hasher(config.segments, hash_builder.clone()),
            recency: Mutex::new(RecencyIndex::with_hasher(hash_builder)),
            weight: PolicyWeight::new(config.initial_weight),
            counters: CacheCounters::default(),
            clock: Clock::new(),
            capacity: config.capacity,
        });

        let tuner_shared = Arc::clone(&shared);
        let tuner = Tuner::spawn(config.tune_interval, move || {
            tuner_shared.tune_once();
        })?;

        Ok(Self {
            shared,
            tuner: Mutex::new(Some(tuner)),
        })
    }
}

impl<K, V, S> HybridCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Returns a clone of the value for `key`, recording the access.
    ///
    /// A hit bumps the entry's frequency, refreshes its access time and moves
    /// it to the hot end of the recency order. A miss only counts the miss.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_with(key, V::clone)
    }

    /// Like [`get`](Self::get), but applies `f` to the value instead of
    /// cloning it.
    ///
    /// `f` runs while the cache lock is held; keep it short.
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        let shared = &*self.shared;
        let mut recency = shared.recency.lock();
        let now = shared.clock.now();

        match shared.store.record_access(key, now, f) {
            Some(result) => {
                if !recency.promote(key) {
                    error!("live key missing from the recency index");
                }
                shared.counters.record_hit();
                Some(result)
            }
            None => {
                shared.counters.record_miss();
                None
            }
        }
    }

    /// Inserts or updates `key`.
    ///
    /// Updating an existing key never evicts. Inserting a new key into a full
    /// cache first evicts exactly one entry chosen by sampled hybrid scoring.
    pub fn put(&self, key: K, value: V) {
        let shared = &*self.shared;
        let mut recency = shared.recency.lock();
        let now = shared.clock.now();

        if !shared.store.contains(&key) && shared.store.len() >= shared.capacity.get() {
            match eviction::evict_one(&shared.store, &mut recency, now, shared.weight.load()) {
                Some(eviction) => {
                    shared.counters.record_eviction();
                    if eviction.path == EvictionPath::Fallback {
                        shared.counters.record_fallback_eviction();
                    }
                }
                None => debug_assert!(false, "full cache had nothing to evict"),
            }
        }

        recency.touch(key.clone());
        match shared.store.upsert(key, value, now) {
            Upsert::Inserted => shared.counters.record_insertion(),
            Upsert::Updated { .. } => shared.counters.record_update(),
        }
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let shared = &*self.shared;
        let mut recency = shared.recency.lock();
        recency.remove(key);
        let entry = shared.store.remove(key)?;
        shared.counters.record_removal();
        Some(entry.value)
    }

    /// Returns `true` if `key` is cached. Does not count as an access.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.shared.store.contains(key)
    }

    /// Returns a copy of the entry for `key`, value and metadata, without
    /// recording an access.
    pub fn peek<Q>(&self, key: &Q) -> Option<CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.shared.store.lookup(key)
    }

    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        let shared = &*self.shared;
        let mut recency = shared.recency.lock();
        recency.clear();
        shared.store.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.shared.capacity.get()
    }

    /// Number of lock stripes in the entry store.
    pub fn segment_count(&self) -> usize {
        self.shared.store.segment_count()
    }

    /// `{size, capacity, hits, misses}` snapshot.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            capacity: self.capacity(),
            hits: self.shared.counters.hits(),
            misses: self.shared.counters.misses(),
        }
    }

    /// Zeroes the hit and miss counters.
    pub fn reset_stats(&self) {
        self.shared.counters.reset_requests();
    }

    /// Current LFU/LRU blend used for eviction scoring.
    pub fn policy_weight(&self) -> f64 {
        self.shared.weight.load()
    }

    /// Runs one tuning cycle on the calling thread and returns the new weight.
    ///
    /// The background tuner keeps running on its own schedule. Cycles that
    /// overlap still apply one smoothing step each.
    pub fn tune_now(&self) -> f64 {
        self.shared.tune_once()
    }

    /// Checks that the entry store and recency index hold the same key set.
    ///
    /// Takes the cache lock, so the answer reflects a quiescent moment.
    pub fn is_consistent(&self) -> bool {
        let shared = &*self.shared;
        let recency = shared.recency.lock();
        if recency.len() != shared.store.len() {
            return false;
        }
        let mut consistent = true;
        shared.store.for_each_key(|key| {
            consistent &= recency.contains(key);
        });
        consistent
    }

    /// Returns `true` while the background tuner is running.
    pub fn is_tuning(&self) -> bool {
        self.tuner.lock().as_ref().is_some_and(Tuner::is_running)
    }

    /// Stops the background tuner. Idempotent.
    ///
    /// The cache stays fully usable; the policy weight simply stops changing
    /// unless [`tune_now`](Self::tune_now) is called.
    pub fn shutdown(&self) {
        let tuner = self.tuner.lock().take();
        if let Some(mut tuner) = tuner {
            tuner.stop();
        }
    }
}

impl<K, V, S> Drop for HybridCache<K, V, S> {
    fn drop(&mut self) {
        if let Some(mut tuner) = self.tuner.get_mut().take() {
            tuner.stop();
        }
    }
}

impl<K, V, S> CacheMetrics for HybridCache<K, V, S>
where
    K: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        self.shared.counters.fill(&mut metrics);
        metrics.insert("size".to_string(), self.len() as f64);
        metrics.insert("capacity".to_string(), self.capacity() as f64);
        metrics.insert("policy_weight".to_string(), self.policy_weight());
        metrics
    }

    fn algorithm_name(&self) -> &'static str {
        "HybridLFU-LRU"
    }
}

impl<K, V, S> fmt::Debug for HybridCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridCache")
            .field("capacity", &self.shared.capacity)
            .field("store", &self.shared.store)
            .field("weight", &self.shared.weight)
            .finish()
    }
}
