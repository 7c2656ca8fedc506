#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────────┐
//! │                             HybridCache                                │
//! │                                                                        │
//! │  ┌──────────────────────┐      ┌─────────────────────────────────────┐ │
//! │  │ Mutex<RecencyIndex>  │      │ EntryStore (N RwLock stripes)       │ │
//! │  │                      │      │                                     │ │
//! │  │ hot ─▶ k3 ─ k1 ─ k7  │ ───▶ │ k1 → {value, freq, last, created}   │ │
//! │  │        ◀─ cold       │      │ k3 → {...}   k7 → {...}             │ │
//! │  └──────────┬───────────┘      └──────────────────▲──────────────────┘ │
//! │             │ sample ≤ 50 cold keys               │ snapshot_all       │
//! │             ▼                                     │                    │
//! │  ┌──────────────────────┐      ┌──────────────────┴──────────────────┐ │
//! │  │ evict_one            │ ◀─── │ PolicyWeight ◀── tuner thread       │ │
//! │  │ max score(meta, w)   │      │ (AtomicU64)      every interval     │ │
//! │  └──────────────────────┘      └─────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Operation | Effect | Cost |
//! |-----------|--------|------|
//! | [`HybridCache::get`] | hit: bump frequency, refresh access time, move to hot end | O(1) |
//! | [`HybridCache::put`] | insert or update; a new key into a full cache evicts one entry | O(1) + O(sample) |
//! | [`HybridCache::remove`] | drop from both structures | O(1) |
//! | [`HybridCache::stats`] | `{size, capacity, hits, misses}` | O(1) |
//! | [`HybridCache::tune_now`] | one tuning cycle on the caller's thread | O(n) |
//!
//! ## Example
//!
//! ```rust
//! use hybrid_cache::{HybridCache, HybridCacheConfig};
//! use core::num::NonZeroUsize;
//! use std::time::Duration;
//!
//! let config = HybridCacheConfig::new(NonZeroUsize::new(2).unwrap())
//!     .with_tune_interval(Duration::from_secs(60))
//!     .with_initial_weight(1.0);
//! let cache = HybridCache::from_config(config).unwrap();
//!
//! cache.put("hot", 1);
//! for _ in 0..4 {
//!     cache.get("hot");
//! }
//! cache.put("cold", 2);
//! cache.put("new", 3); // pure LFU: "cold" goes, even though it is the most recent
//!
//! assert!(cache.contains_key("hot"));
//! assert!(!cache.contains_key("cold"));
//! ```

/// Entry values, access metadata and the monotonic clock.
pub mod entry;

/// Doubly linked list implementation with in-place editing capabilities.
///
/// **Note**: This module is internal infrastructure. It exposes unsafe raw
/// pointer operations that require careful invariant maintenance.
pub(crate) mod list;

/// Cache configuration.
pub mod config;

/// Error type.
pub mod error;

/// Striped key to entry map.
///
/// Holds values and their access metadata behind `parking_lot::RwLock`
/// stripes so the tuner can scan while requests proceed.
pub mod store;

/// Recency order of live keys, coldest first when sampling.
pub mod recency;

/// Hybrid LFU/LRU scoring and the shared policy weight.
pub mod policy;

/// Sampled victim selection.
pub mod eviction;

/// Background tuning of the policy weight.
pub mod tuner;

/// Cache metrics system.
///
/// Provides counters and a uniform `BTreeMap` report.
pub mod metrics;

/// The cache façade.
pub mod cache;

pub use cache::HybridCache;
pub use config::HybridCacheConfig;
pub use entry::{CacheEntry, EntryMeta};
pub use error::{CacheError, Result};
pub use metrics::{CacheMetrics, CacheStats};
pub use policy::PolicyWeight;
