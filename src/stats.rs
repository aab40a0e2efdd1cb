//! Sinc instrumentation counters.
//!
//! All counters use `Relaxed` ordering — they are observational only and not
//! used as synchronization primitives. The sinc's own release/acquire pair
//! on the participant counter provides the ordering guarantees for
//! correctness; these counters are purely for monitoring.
//!
//! # Usage
//!
//! ```ignore
//! let snap = sinc::stats::snapshot();
//! println!("submits: {}", snap.submit_count);
//! ```
//!
//! Obtain a [`Snapshot`] with [`snapshot()`]. Individual counter loads are
//! individually atomic but not globally consistent with each other.

use core::sync::atomic::{AtomicU64, Ordering};

pub(crate) struct Stats {
    /// Total calls to `willspawn`.
    pub willspawn_count: AtomicU64,
    /// Sum of `n` across all `willspawn` calls.
    pub willspawn_total: AtomicU64,
    /// Total calls to `submit`.
    pub submit_count: AtomicU64,
    /// Total collation passes run (one per `Armed -> Complete` transition).
    pub collate_count: AtomicU64,
    /// Total calls to `wait`.
    pub wait_count: AtomicU64,
    /// Calls to `wait` that observed an already-full latch (no blocking).
    pub wait_uncontended: AtomicU64,
    /// Total calls to `reset`.
    pub reset_count: AtomicU64,
}

impl Stats {
    const fn new() -> Self {
        Self {
            willspawn_count: AtomicU64::new(0),
            willspawn_total: AtomicU64::new(0),
            submit_count: AtomicU64::new(0),
            collate_count: AtomicU64::new(0),
            wait_count: AtomicU64::new(0),
            wait_uncontended: AtomicU64::new(0),
            reset_count: AtomicU64::new(0),
        }
    }
}

pub(crate) static STATS: Stats = Stats::new();

/// A point-in-time snapshot of all instrumentation counters.
///
/// Fields are plain `u64` values loaded from the global atomic counters.
/// Individual fields are each atomically read, but the snapshot as a whole
/// is not globally consistent — concurrent sincs may race between loads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub willspawn_count: u64,
    pub willspawn_total: u64,
    pub submit_count: u64,
    pub collate_count: u64,
    pub wait_count: u64,
    pub wait_uncontended: u64,
    pub reset_count: u64,
}

/// Take a snapshot of all counters.
pub fn snapshot() -> Snapshot {
    Snapshot {
        willspawn_count: STATS.willspawn_count.load(Ordering::Relaxed),
        willspawn_total: STATS.willspawn_total.load(Ordering::Relaxed),
        submit_count: STATS.submit_count.load(Ordering::Relaxed),
        collate_count: STATS.collate_count.load(Ordering::Relaxed),
        wait_count: STATS.wait_count.load(Ordering::Relaxed),
        wait_uncontended: STATS.wait_uncontended.load(Ordering::Relaxed),
        reset_count: STATS.reset_count.load(Ordering::Relaxed),
    }
}
