//! Adaptive Policy Tuner
//!
//! A background control loop that periodically re-derives the LFU/LRU blend
//! from what the cache currently holds.
//!
//! # Control Law
//!
//! Each cycle scans the entry store and computes:
//!
//! ```text
//! target     = clamp(avg_frequency / (avg_frequency + avg_recency_secs + 1), 0.05, 0.95)
//! new_weight = 0.8 * old_weight + 0.2 * target
//! ```
//!
//! A live set dominated by frequently hit keys pushes the weight towards LFU;
//! a live set of stale keys pushes it towards LRU. The clamp keeps both terms
//! in play, and the exponential smoothing damps single-cycle noise.
//!
//! # Threading
//!
//! [`Tuner::spawn`] starts a named OS thread that sleeps on a
//! `parking_lot::Condvar` between cycles. [`Tuner::stop`] flips the stop flag,
//! wakes the thread and joins it, so shutdown does not wait out the interval.

use crate::entry::EntryMeta;
use crate::error::{CacheError, Result};
use crate::policy::PolicyWeight;
use core::fmt;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Lower bound for the target weight.
pub const MIN_TARGET_WEIGHT: f64 = 0.05;

/// Upper bound for the target weight.
pub const MAX_TARGET_WEIGHT: f64 = 0.95;

/// Share of the previous weight kept by each cycle.
pub const SMOOTHING: f64 = 0.8;

/// Name given to the tuner thread.
pub const TUNER_THREAD_NAME: &str = "hybrid-cache-tuner";

/// Aggregate statistics over the live entries at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateStats {
    /// Number of entries scanned.
    pub entries: usize,
    /// Mean access frequency. 1.0 for an empty store.
    pub avg_frequency: f64,
    /// Mean seconds since last access. 1.0 for an empty store.
    pub avg_recency_secs: f64,
}

impl AggregateStats {
    /// Computes averages over `metas`, measuring recency at `now`.
    pub fn collect<'a, I>(metas: I, now: u64) -> Self
    where
        I: IntoIterator<Item = &'a EntryMeta>,
    {
        let mut entries = 0usize;
        let mut total_frequency = 0.0;
        let mut total_recency = 0.0;
        for meta in metas {
            entries += 1;
            total_frequency += meta.frequency as f64;
            total_recency += meta.recency_secs(now);
        }

        if entries == 0 {
            return Self {
                entries,
                avg_frequency: 1.0,
                avg_recency_secs: 1.0,
            };
        }

        let n = entries as f64;
        Self {
            entries,
            avg_frequency: total_frequency / n,
            avg_recency_secs: total_recency / n,
        }
    }

    /// The clamped weight these statistics argue for.
    pub fn target_weight(&self) -> f64 {
        let raw = self.avg_frequency / (self.avg_frequency + self.avg_recency_secs + 1.0);
        raw.clamp(MIN_TARGET_WEIGHT, MAX_TARGET_WEIGHT)
    }

    /// The smoothed weight to publish after `old_weight`.
    pub fn next_weight(&self, old_weight: f64) -> f64 {
        SMOOTHING * old_weight + (1.0 - SMOOTHING) * self.target_weight()
    }
}

/// Runs one tuning cycle: aggregate, compute, publish.
///
/// The smoothing step is applied atomically, so concurrent cycles each move
/// the weight by one step.
///
/// Returns the statistics used and the published weight.
pub fn tune(metas: &[EntryMeta], now: u64, weight: &PolicyWeight) -> (AggregateStats, f64) {
    let stats = AggregateStats::collect(metas, now);
    let (old_weight, new_weight) = weight.update(|old| stats.next_weight(old));

    debug!(
        entries = stats.entries,
        avg_frequency = stats.avg_frequency,
        avg_recency_secs = stats.avg_recency_secs,
        target = stats.target_weight(),
        old_weight,
        new_weight,
        "policy weight tuned"
    );
    (stats, new_weight)
}

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    cv: Condvar,
}

impl StopSignal {
    /// Sleeps until `deadline` or until stopped. Returns `true` if stopped.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.cv.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.cv.notify_all();
    }
}

/// Handle to the background tuning thread.
pub struct Tuner {
    signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl Tuner {
    /// Starts a thread that calls `cycle` once every `interval`.
    ///
    /// The first call happens one full interval after spawning.
    pub fn spawn<F>(interval: Duration, mut cycle: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if interval.is_zero() {
            return Err(CacheError::InvalidTuneInterval);
        }

        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);
        let handle = thread::Builder::new()
            .name(TUNER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + interval;
                while !thread_signal.wait_until(deadline) {
                    cycle();
                    deadline += interval;
                    // don't try to catch up after a long stall
                    let now = Instant::now();
                    if deadline < now {
                        deadline = now + interval;
                    }
                }
            })
            .map_err(CacheError::TunerSpawn)?;

        info!(?interval, thread = TUNER_THREAD_NAME, "tuner started");
        Ok(Self {
            signal,
            handle: Some(handle),
            interval,
        })
    }

    /// Tuning period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` while the thread has not been stopped.
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stops and joins the thread. Safe to call more than once.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.signal.stop();
        if handle.join().is_err() {
            error!(thread = TUNER_THREAD_NAME, "tuner thread panicked");
        }
        info!(thread = TUNER_THREAD_NAME, "tuner stopped");
    }
}

impl Drop for Tuner {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for Tuner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tuner")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish()
    }
}
