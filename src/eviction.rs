//! Sampled Eviction
//!
//! When a new key arrives at a full cache, one victim is chosen from a bounded
//! sample of the coldest keys instead of scanning the whole store. Eviction
//! cost is therefore O(sample size), independent of capacity.
//!
//! # Algorithm
//!
//! 1. Take up to [`MAX_SAMPLE_SIZE`] keys from the cold end of the
//!    [`RecencyIndex`].
//! 2. Score every candidate still present in the [`EntryStore`] with the
//!    current policy weight. Candidates that vanished are skipped.
//! 3. Pick the highest score; ties go to the first candidate in sampled
//!    (coldest-first) order.
//! 4. If nothing could be scored, pop the tail of the recency index instead.
//! 5. Remove the victim from both structures.
//!
//! The caller must hold the recency index exclusively for the whole call; that
//! is what keeps the two structures in step.

use crate::entry::EntryMeta;
use crate::policy::score;
use crate::recency::{RecencyIndex, MAX_SAMPLE_SIZE};
use crate::store::EntryStore;
use core::hash::{BuildHasher, Hash};
use tracing::{error, trace};

/// How a victim was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPath {
    /// The victim won the scored sample.
    Scored,
    /// No sampled candidate could be scored; the coldest key was taken.
    Fallback,
}

/// Result of a successful eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction<K> {
    /// Key that was removed from the cache.
    pub key: K,
    /// Which path selected it.
    pub path: EvictionPath,
}

/// Returns the index of the candidate with the highest score.
///
/// Candidates are metadata snapshots in sampled order; `None` entries (keys
/// that disappeared before scoring) are skipped. Ties resolve to the
/// earliest candidate.
pub fn select_victim<I>(candidates: I, now: u64, weight: f64) -> Option<usize>
where
    I: IntoIterator<Item = Option<EntryMeta>>,
{
    best_candidate(candidates, now, weight).map(|(idx, _)| idx)
}

fn best_candidate<I>(candidates: I, now: u64, weight: f64) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = Option<EntryMeta>>,
{
    let mut best: Option<(usize, f64)> = None;
    for (idx, meta) in candidates.into_iter().enumerate() {
        let Some(meta) = meta else { continue };
        let candidate_score = score(&meta, now, weight);
        match best {
            Some((_, best_score)) if candidate_score <= best_score => {}
            _ => best = Some((idx, candidate_score)),
        }
    }
    best
}

/// Evicts exactly one entry from a non-empty cache.
///
/// Returns `None` only if both structures turned out to be empty, which the
/// caller treats as an invariant violation.
pub fn evict_one<K, V, S>(
    store: &EntryStore<K, V, S>,
    recency: &mut RecencyIndex<K, S>,
    now: u64,
    weight: f64,
) -> Option<Eviction<K>>
where
    K: Hash + Eq + Clone,
    S: BuildHasher + Clone,
{
    let chosen = {
        let sample: Vec<&K> = recency.sample_cold(MAX_SAMPLE_SIZE).collect();
        best_candidate(sample.iter().map(|key| store.meta(*key)), now, weight)
            .map(|(idx, score)| (sample[idx].clone(), score))
    };

    let mut victim_score = None;
    let eviction = match chosen {
        Some((key, score)) => {
            victim_score = Some(score);
            recency.remove(&key);
            Eviction {
                key,
                path: EvictionPath::Scored,
            }
        }
        None => match recency.evict_tail_fallback() {
            Some(key) => Eviction {
                key,
                path: EvictionPath::Fallback,
            },
            None => {
                error!(
                    store_len = store.len(),
                    "eviction requested but the recency index is empty"
                );
                return None;
            }
        },
    };

    if store.remove(&eviction.key).is_none() {
        error!(path = ?eviction.path, "evicted key had no entry in the store");
    }
    trace!(path = ?eviction.path, score = ?victim_score, weight, "evicted entry");
    Some(eviction)
}
