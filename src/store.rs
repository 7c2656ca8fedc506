//! Entry Store
//!
//! The authoritative `key -> CacheEntry` mapping. Keys are partitioned across
//! a fixed number of stripes by hash, each stripe protected by its own
//! `parking_lot::RwLock`:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         EntryStore                            │
//! │                                                               │
//! │  hash(key) % N  ──▶  stripe selection                         │
//! │                                                               │
//! │  ┌───────────┐ ┌───────────┐           ┌───────────┐          │
//! │  │ Stripe 0  │ │ Stripe 1  │    ...    │ Stripe N-1│          │
//! │  │ [RwLock]  │ │ [RwLock]  │           │ [RwLock]  │          │
//! │  │ HashMap   │ │ HashMap   │           │ HashMap   │          │
//! │  └───────────┘ └───────────┘           └───────────┘          │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every per-key mutation (`upsert`, `record_access`, `remove`) runs under the
//! stripe's write lock, so concurrent callers can never lose a frequency
//! increment. The tuner's [`EntryStore::snapshot_all`] read-locks one stripe at
//! a time: the result is consistent per stripe but not across the whole map.
//!
//! The store knows nothing about recency order. Keeping it in step with the
//! [`RecencyIndex`](crate::recency::RecencyIndex) is the job of the
//! [`HybridCache`](crate::HybridCache) façade.

use crate::entry::{CacheEntry, EntryMeta};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicUsize, Ordering};
use parking_lot::RwLock;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Outcome of [`EntryStore::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<V> {
    /// The key was absent; a new entry with frequency 1 was created.
    Inserted,
    /// The key was present; its value was replaced.
    Updated {
        /// The value that was replaced.
        previous: V,
        /// Frequency after the increment.
        frequency: u64,
    },
}

/// Striped concurrent map from key to [`CacheEntry`].
pub struct EntryStore<K, V, S = DefaultHashBuilder> {
    stripes: Box<[RwLock<HashMap<K, CacheEntry<V>, S>>]>,
    hash_builder: S,
    len: AtomicUsize,
}

impl<K, V> EntryStore<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    /// Creates a store with `segments` stripes and the default hasher.
    ///
    /// # Panics
    ///
    /// Panics if `segments` is zero.
    pub fn new(segments: usize) -> Self {
        Self::with_hasher(segments, DefaultHashBuilder::default())
    }
}

impl<K, V, S> EntryStore<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Clone,
{
    /// Creates a store with `segments` stripes sharing `hash_builder`.
    ///
    /// # Panics
    ///
    /// Panics if `segments` is zero.
    pub fn with_hasher(segments: usize, hash_builder: S) -> Self {
        assert!(segments > 0, "segments must be greater than 0");

        let stripes: Vec<_> = (0..segments)
            .map(|_| RwLock::new(HashMap::with_hasher(hash_builder.clone())))
            .collect();

        Self {
            stripes: stripes.into_boxed_slice(),
            hash_builder,
            len: AtomicUsize::new(0),
        }
    }

    #[inline]
    fn stripe<Q>(&self, key: &Q) -> &RwLock<HashMap<K, CacheEntry<V>, S>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let idx = (self.hash_builder.hash_one(key) as usize) % self.stripes.len();
        &self.stripes[idx]
    }

    /// Number of stripes.
    pub fn segment_count(&self) -> usize {
        self.stripes.len()
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    /// Returns `true` if the store holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if `key` has an entry.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.stripe(key).read().contains_key(key)
    }

    /// Returns a copy of the entry for `key` without touching its metadata.
    pub fn lookup<Q>(&self, key: &Q) -> Option<CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.stripe(key).read().get(key).cloned()
    }

    /// Returns the access metadata for `key` without cloning the value.
    pub fn meta<Q>(&self, key: &Q) -> Option<EntryMeta>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.stripe(key).read().get(key).map(CacheEntry::meta)
    }

    /// Records a read of `key` and applies `f` to the value under the stripe lock.
    ///
    /// Returns `None` if the key is absent.
    pub fn record_access<Q, F, R>(&self, key: &Q, now: u64, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        let mut stripe = self.stripe(key).write();
        let entry = stripe.get_mut(key)?;
        entry.record_access(now);
        Some(f(&entry.value))
    }

    /// Inserts `key` with frequency 1, or replaces its value and bumps the frequency.
    pub fn upsert(&self, key: K, value: V, now: u64) -> Upsert<V> {
        let mut stripe = self.stripe(&key).write();
        if let Some(entry) = stripe.get_mut(&key) {
            let previous = entry.replace(value, now);
            return Upsert::Updated {
                previous,
                frequency: entry.meta().frequency,
            };
        }
        stripe.insert(key, CacheEntry::new(value, now));
        self.len.fetch_add(1, Ordering::AcqRel);
        Upsert::Inserted
    }

    /// Removes `key`, returning its entry. No-op if absent.
    pub fn remove<Q>(&self, key: &Q) -> Option<CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let removed = self.stripe(key).write().remove(key);
        if removed.is_some() {
            self.len.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    /// Copies the metadata of every entry, one stripe at a time.
    pub fn snapshot_all(&self) -> Vec<EntryMeta> {
        let mut out = Vec::with_capacity(self.len());
        for stripe in self.stripes.iter() {
            out.extend(stripe.read().values().map(CacheEntry::meta));
        }
        out
    }

    /// Calls `f` with every key, one stripe at a time.
    pub fn for_each_key<F>(&self, mut f: F)
    where
        F: FnMut(&K),
    {
        for stripe in self.stripes.iter() {
            stripe.read().keys().for_each(&mut f);
        }
    }

    /// Removes every entry.
    pub fn clear(&self) {
        for stripe in self.stripes.iter() {
            let mut stripe = stripe.write();
            let dropped = stripe.len();
            stripe.clear();
            self.len.fetch_sub(dropped, Ordering::AcqRel);
        }
    }
}

impl<K, V, S> core::fmt::Debug for EntryStore<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EntryStore")
            .field("segments", &self.stripes.len())
            .field("len", &self.len.load(Ordering::Relaxed))
            .finish()
    }
}
