//! Hybrid Scoring Policy
//!
//! Ranks eviction candidates by blending an LFU term and an LRU term:
//!
//! ```text
//! recency_secs = (now - last_access) / 1e9
//! score        = w * 1 / (1 + frequency) + (1 - w) * recency_secs
//! ```
//!
//! The score is an eviction priority: rarely used entries and stale entries
//! both push it up, and the engine evicts the highest-scoring candidate.
//! Scores are only compared within one sampled candidate set, so the two
//! terms are deliberately left unnormalized.
//!
//! | weight | behaviour                     |
//! |--------|-------------------------------|
//! | 1.0    | pure frequency (LFU-like)     |
//! | 0.5    | even blend (initial value)    |
//! | 0.0    | pure age (LRU-like)           |
//!
//! The weight itself lives in a [`PolicyWeight`] cell with a single writer
//! (the tuner) and any number of readers.

use crate::entry::EntryMeta;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Computes the eviction score of an entry. Higher means evict sooner.
///
/// # Examples
///
/// ```
/// use hybrid_cache::entry::EntryMeta;
/// use hybrid_cache::policy::score;
///
/// let hot = EntryMeta { frequency: 9, last_access: 0, create_time: 0 };
/// let cold = EntryMeta { frequency: 1, last_access: 0, create_time: 0 };
///
/// // pure LFU: the rarely used entry scores higher
/// assert!(score(&cold, 0, 1.0) > score(&hot, 0, 1.0));
/// ```
#[inline]
pub fn score(meta: &EntryMeta, now: u64, weight: f64) -> f64 {
    let frequency_term = 1.0 / (1.0 + meta.frequency as f64);
    let recency_term = meta.recency_secs(now);
    weight * frequency_term + (1.0 - weight) * recency_term
}

/// Shared LFU/LRU blend factor in `[0, 1]`.
///
/// Stored as the bit pattern of an `f64` in an `AtomicU64`, so reads and
/// writes are single atomic operations. Readers may observe a slightly stale
/// value; scoring tolerates that.
pub struct PolicyWeight {
    bits: AtomicU64,
}

impl PolicyWeight {
    /// Creates a cell holding `weight`, clamped to `[0, 1]`.
    ///
    /// A NaN weight is replaced by the neutral 0.5.
    pub fn new(weight: f64) -> Self {
        Self {
            bits: AtomicU64::new(Self::sanitize(weight).to_bits()),
        }
    }

    /// Current weight.
    #[inline]
    pub fn load(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Publishes a new weight, clamped to `[0, 1]`.
    #[inline]
    pub fn store(&self, weight: f64) {
        self.bits
            .store(Self::sanitize(weight).to_bits(), Ordering::Release);
    }

    /// Applies `f` to the current weight as one atomic read-modify-write.
    ///
    /// `f` may run more than once if another writer races in between.
    /// Returns the `(old, new)` pair that was actually committed.
    pub fn update<F>(&self, mut f: F) -> (f64, f64)
    where
        F: FnMut(f64) -> f64,
    {
        let mut new = 0.0;
        let previous = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                new = Self::sanitize(f(f64::from_bits(bits)));
                Some(new.to_bits())
            });
        let (Ok(old) | Err(old)) = previous;
        (f64::from_bits(old), new)
    }

    fn sanitize(weight: f64) -> f64 {
        if weight.is_nan() {
            0.5
        } else {
            weight.clamp(0.0, 1.0)
        }
    }
}

impl Default for PolicyWeight {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl fmt::Debug for PolicyWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PolicyWeight").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: u64 = 1_000_000_000;

    fn meta(frequency: u64, last_access: u64) -> EntryMeta {
        EntryMeta {
            frequency,
            last_access,
            create_time: 0,
        }
    }

    #[test]
    fn test_score_formula() {
        // w=0.5, f=1, 4s idle: 0.5 * 0.5 + 0.5 * 4
        let s = score(&meta(1, SEC), 5 * SEC, 0.5);
        assert!((s - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_pure_lfu_ignores_age() {
        let fresh = meta(1, 10 * SEC);
        let stale = meta(1, 0);
        assert_eq!(score(&fresh, 10 * SEC, 1.0), score(&stale, 10 * SEC, 1.0));
        assert_eq!(score(&fresh, 10 * SEC, 1.0), 0.5);
    }

    #[test]
    fn test_pure_lru_ignores_frequency() {
        let hot = meta(100, 2 * SEC);
        let cold = meta(1, 2 * SEC);
        assert_eq!(score(&hot, 3 * SEC, 0.0), score(&cold, 3 * SEC, 0.0));
        assert_eq!(score(&hot, 3 * SEC, 0.0), 1.0);
    }

    #[test]
    fn test_score_non_increasing_in_frequency() {
        let now = 3 * SEC;
        let mut last = f64::INFINITY;
        for frequency in 1..50 {
            let s = score(&meta(frequency, SEC), now, 0.7);
            assert!(s <= last);
            last = s;
        }
    }

    #[test]
    fn test_score_increasing_in_staleness() {
        let now = 100 * SEC;
        let mut last = f64::NEG_INFINITY;
        for idle in 0..50 {
            let s = score(&meta(3, now - idle * SEC), now, 0.3);
            assert!(s > last);
            last = s;
        }
    }

    #[test]
    fn test_policy_weight_roundtrip() {
        let weight = PolicyWeight::default();
        assert_eq!(weight.load(), 0.5);

        weight.store(0.582);
        assert_eq!(weight.load(), 0.582);
    }

    #[test]
    fn test_policy_weight_update_from_many_threads() {
        let weight = PolicyWeight::new(0.0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..100 {
                        weight.update(|old| old + 0.001);
                    }
                });
            }
        });
        // 800 increments of 0.001, none lost
        assert!((weight.load() - 0.8).abs() < 1e-9);

        let (old, new) = weight.update(|old| old * 2.0);
        assert!((old - 0.8).abs() < 1e-9);
        assert_eq!(new, 1.0);
    }

    #[test]
    fn test_policy_weight_clamps() {
        let weight = PolicyWeight::new(3.0);
        assert_eq!(weight.load(), 1.0);

        weight.store(-1.0);
        assert_eq!(weight.load(), 0.0);

        weight.store(f64::NAN);
        assert_eq!(weight.load(), 0.5);
    }
}
