//! Cache Entry Type
//!
//! Every live key owns exactly one [`CacheEntry`] inside the
//! [`EntryStore`](crate::store::EntryStore). The entry carries the value plus
//! the access metadata ([`EntryMeta`]) that the scoring policy and the tuner
//! consume.
//!
//! # Timestamps
//!
//! Timestamps are monotonic nanoseconds measured from a per-cache [`Clock`]
//! epoch. They never go backwards and are unaffected by wall-clock changes,
//! which keeps `now - last_access` non-negative for scoring.
//!
//! # Examples
//!
//! ```
//! use hybrid_cache::entry::CacheEntry;
//!
//! let mut entry = CacheEntry::new("value", 1_000);
//! assert_eq!(entry.meta().frequency, 1);
//!
//! entry.record_access(2_000);
//! assert_eq!(entry.meta().frequency, 2);
//! assert_eq!(entry.meta().last_access, 2_000);
//! assert_eq!(entry.meta().create_time, 1_000);
//! ```

use core::fmt;
use std::time::Instant;

/// Nanoseconds per second, used to convert timestamps for scoring.
pub(crate) const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Access metadata tracked for each entry.
///
/// This is a small `Copy` struct so that eviction scoring and tuner snapshots
/// never need to clone the cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// Number of accesses since creation. Starts at 1.
    pub frequency: u64,
    /// Monotonic timestamp of the last `get` or `put` (nanoseconds).
    pub last_access: u64,
    /// Monotonic timestamp of creation (nanoseconds).
    pub create_time: u64,
}

impl EntryMeta {
    /// Metadata for an entry created at `now`.
    #[inline]
    pub fn new(now: u64) -> Self {
        Self {
            frequency: 1,
            last_access: now,
            create_time: now,
        }
    }

    /// Seconds elapsed since the last access, measured at `now`.
    ///
    /// Saturates at zero if `now` precedes the recorded access.
    #[inline]
    pub fn recency_secs(&self, now: u64) -> f64 {
        now.saturating_sub(self.last_access) as f64 / NANOS_PER_SEC
    }

    /// Bumps the frequency and refreshes the access time.
    #[inline]
    fn touch(&mut self, now: u64) {
        self.frequency = self.frequency.saturating_add(1);
        self.last_access = self.last_access.max(now);
    }
}

/// A cached value together with its access metadata.
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,
    meta: EntryMeta,
}

impl<V> CacheEntry<V> {
    /// Creates an entry with frequency 1 accessed at `now`.
    #[inline]
    pub fn new(value: V, now: u64) -> Self {
        Self {
            value,
            meta: EntryMeta::new(now),
        }
    }

    /// Returns a copy of the access metadata.
    #[inline]
    pub fn meta(&self) -> EntryMeta {
        self.meta
    }

    /// Records a read: frequency + 1, last access refreshed.
    #[inline]
    pub fn record_access(&mut self, now: u64) {
        self.meta.touch(now);
    }

    /// Replaces the value in place and records the write as an access.
    ///
    /// Returns the previous value.
    #[inline]
    pub fn replace(&mut self, value: V, now: u64) -> V {
        self.meta.touch(now);
        core::mem::replace(&mut self.value, value)
    }
}

impl<V: Clone> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            meta: self.meta,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("value", &self.value)
            .field("frequency", &self.meta.frequency)
            .field("last_access", &self.meta.last_access)
            .finish()
    }
}

/// Monotonic clock shared by one cache instance.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    /// Starts a clock whose epoch is the current instant.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Nanoseconds elapsed since the epoch.
    #[inline]
    pub fn now(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
