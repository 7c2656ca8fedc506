//! Error types.
//!
//! Cache operations themselves are infallible: a miss is `None`, and eviction
//! never fails a `put`. Errors only arise while building a cache.

use thiserror::Error;

/// Errors returned when constructing a [`HybridCache`](crate::HybridCache).
#[derive(Debug, Error)]
pub enum CacheError {
    /// The tuning interval was zero.
    #[error("tune interval must be greater than zero")]
    InvalidTuneInterval,

    /// The initial policy weight was not a finite value in `[0, 1]`.
    #[error("policy weight must be within [0, 1], got {0}")]
    InvalidPolicyWeight(f64),

    /// The entry store was configured with zero segments.
    #[error("segment count must be greater than zero")]
    InvalidSegmentCount,

    /// The operating system refused to start the tuner thread.
    #[error("failed to spawn tuner thread: {0}")]
    TunerSpawn(#[source] std::io::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CacheError>;
