//! Recency Index
//!
//! Keys ordered by last touch, most recent at the head. Eviction samples
//! candidates from the tail (the cold end) and falls back to popping the tail
//! when none of the sampled candidates can be scored.
//!
//! ```text
//!  head (hot)                                              tail (cold)
//!   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐   ┌───┐
//!   │ k7│◀─▶│ k2│◀─▶│ k9│◀─▶│ ...│◀─▶│ k4│◀─▶│ k1│◀─▶│ k5│◀─▶│ k3│
//!   └───┘   └───┘   └───┘   └───┘   └───┘   └───┘   └───┘   └───┘
//!                                    ◀──── sample_cold(n) ────┘
//! ```
//!
//! A `key -> node` map gives O(1) `touch` and `remove`, and guarantees that
//! a key is linked at most once.
//!
//! # Thread Safety
//!
//! `RecencyIndex` is not synchronized on its own. The cache façade keeps it
//! behind a `parking_lot::Mutex`, and that mutex doubles as the boundary for
//! every operation that must change the index and the entry store together.

use crate::list::{List, Node};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::ptr::NonNull;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

/// Upper bound on the number of keys returned by [`RecencyIndex::sample_cold`].
pub const MAX_SAMPLE_SIZE: usize = 50;

/// Recency-ordered set of keys.
///
/// # Safety
///
/// `nodes` holds raw pointers into `list`. A pointer is valid exactly as long
/// as its key is present in `nodes`: every path that unlinks a node removes
/// the map entry in the same call.
pub struct RecencyIndex<K, S = DefaultHashBuilder> {
    list: List<K>,
    nodes: HashMap<K, NonNull<Node<K>>, S>,
}

// SAFETY: the index owns every node its pointers refer to; moving it to
// another thread moves that ownership along with it.
unsafe impl<K: Send, S: Send> Send for RecencyIndex<K, S> {}

// SAFETY: all mutation requires `&mut self`; shared references only read.
unsafe impl<K: Sync, S: Sync> Sync for RecencyIndex<K, S> {}

impl<K: Hash + Eq + Clone> RecencyIndex<K, DefaultHashBuilder> {
    /// Creates an empty index with the default hasher.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }
}

impl<K: Hash + Eq + Clone> Default for RecencyIndex<K, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S> RecencyIndex<K, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Creates an empty index using `hash_builder` for its node map.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            list: List::new(),
            nodes: HashMap::with_hasher(hash_builder),
        }
    }

    /// Number of keys in the index.
    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Returns `true` if `key` is indexed.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.nodes.contains_key(key)
    }

    /// Moves `key` to the head, inserting it if absent.
    pub fn touch(&mut self, key: K) {
        if let Some(&node) = self.nodes.get(&key) {
            // SAFETY: node is in `nodes`, so it is linked into `list`.
            unsafe { self.list.move_to_front(node) };
            return;
        }
        let node = self.list.push_front(key.clone());
        self.nodes.insert(key, node);
    }

    /// Moves an already indexed `key` to the head.
    ///
    /// Returns `false` if the key is not indexed.
    pub fn promote<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.nodes.get(key) {
            Some(&node) => {
                // SAFETY: node is in `nodes`, so it is linked into `list`.
                unsafe { self.list.move_to_front(node) };
                true
            }
            None => false,
        }
    }

    /// Up to `min(n, MAX_SAMPLE_SIZE)` keys from the cold end, coldest first.
    ///
    /// Nothing is removed.
    pub fn sample_cold(&self, n: usize) -> impl Iterator<Item = &K> + '_ {
        self.list.iter_back().take(n.min(MAX_SAMPLE_SIZE))
    }

    /// Removes and returns the coldest key.
    pub fn evict_tail_fallback(&mut self) -> Option<K> {
        let key = self.list.pop_back()?;
        self.nodes.remove(&key);
        Some(key)
    }

    /// Removes `key` wherever it sits. Returns `false` if it was absent.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.nodes.remove(key) {
            Some(node) => {
                // SAFETY: the pointer came out of `nodes`, so the node is still
                // linked and is unlinked exactly once here.
                drop(unsafe { self.list.unlink(node) });
                true
            }
            None => false,
        }
    }

    /// Keys from hottest to coldest.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.list.iter()
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.list.clear();
    }
}

impl<K, S> core::fmt::Debug for RecencyIndex<K, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecencyIndex")
            .field("len", &self.list.len())
            .finish()
    }
}
