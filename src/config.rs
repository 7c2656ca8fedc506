//! Cache Configuration
//!
//! [`HybridCacheConfig`] has public fields for direct instantiation plus
//! `with_*` helpers for the common case of tweaking a default.
//!
//! # Sizing Guidelines
//!
//! - **`capacity`**: maximum number of live entries. Eviction starts once the
//!   store holds `capacity` entries and a new key arrives.
//! - **`segments`**: number of lock stripes in the entry store. More stripes
//!   means the tuner's statistics scan holds each stripe for a shorter time.
//!   The default follows available parallelism, clamped to `[4, 64]`.
//! - **`tune_interval`**: how often the background tuner recomputes the
//!   policy weight. Shorter intervals react faster but scan the store more
//!   often.
//! - **`initial_weight`**: starting LFU/LRU blend. `1.0` scores purely by
//!   frequency, `0.0` purely by age.
//!
//! # Examples
//!
//! ```
//! use hybrid_cache::config::HybridCacheConfig;
//! use core::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! let config = HybridCacheConfig::new(NonZeroUsize::new(10_000).unwrap())
//!     .with_tune_interval(Duration::from_secs(1))
//!     .with_initial_weight(0.7);
//!
//! assert_eq!(config.capacity.get(), 10_000);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{CacheError, Result};
use core::fmt;
use core::num::NonZeroUsize;
use std::time::Duration;

/// Default tuning period.
pub const DEFAULT_TUNE_INTERVAL: Duration = Duration::from_secs(5);

/// Default LFU/LRU blend.
pub const DEFAULT_POLICY_WEIGHT: f64 = 0.5;

/// Returns the default number of store segments based on available parallelism.
pub fn default_segment_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(16)
        .clamp(4, 64)
}

/// Configuration for a [`HybridCache`](crate::HybridCache).
#[derive(Clone, Copy)]
pub struct HybridCacheConfig {
    /// Maximum number of entries the cache holds.
    pub capacity: NonZeroUsize,
    /// Period of the background tuning loop.
    pub tune_interval: Duration,
    /// Policy weight before the first tuning cycle.
    pub initial_weight: f64,
    /// Number of lock stripes in the entry store.
    pub segments: usize,
}

impl HybridCacheConfig {
    /// Creates a configuration with default tuning parameters.
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity,
            tune_interval: DEFAULT_TUNE_INTERVAL,
            initial_weight: DEFAULT_POLICY_WEIGHT,
            segments: default_segment_count(),
        }
    }

    /// Sets the tuning period.
    #[must_use]
    pub fn with_tune_interval(mut self, tune_interval: Duration) -> Self {
        self.tune_interval = tune_interval;
        self
    }

    /// Sets the starting policy weight.
    #[must_use]
    pub fn with_initial_weight(mut self, weight: f64) -> Self {
        self.initial_weight = weight;
        self
    }

    /// Sets the number of entry store segments.
    #[must_use]
    pub fn with_segments(mut self, segments: usize) -> Self {
        self.segments = segments;
        self
    }

    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<()> {
        if self.tune_interval.is_zero() {
            return Err(CacheError::InvalidTuneInterval);
        }
        if !(0.0..=1.0).contains(&self.initial_weight) {
            // NaN fails the range check as well
            return Err(CacheError::InvalidPolicyWeight(self.initial_weight));
        }
        if self.segments == 0 {
            return Err(CacheError::InvalidSegmentCount);
        }
        Ok(())
    }
}

impl fmt::Debug for HybridCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridCacheConfig")
            .field("capacity", &self.capacity)
            .field("tune_interval", &self.tune_interval)
            .field("initial_weight", &self.initial_weight)
            .field("segments", &self.segments)
            .finish()
    }
}
