//! Runtime-constant topology snapshot.
//!
//! Populated lazily on first sinc creation: first caller wins, every
//! subsequent caller observes the same values. Modeled as a once-initialized
//! immutable singleton, the same `AtomicPtr`-as-publish-flag-plus-`SpinLock`
//! pattern the teacher crate uses to lazily initialize its per-CPU slab
//! (`cpu_cache::ensure_init`/`init_slow`).

use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::sync::{SpinLock, SpinMutex};

/// The host collaborator this crate consumes instead of calling into an
/// external task runtime directly (spec §6, "host runtime contract").
///
/// A real many-core task runtime implements this trait once and installs it
/// with [`set_runtime`] before creating any sinc. Every method must be
/// answerable in constant time from the calling worker's own context; none
/// of them may block.
pub trait Runtime: Send + Sync {
    /// Total number of shepherds (locality domains), constant for the
    /// process lifetime.
    fn total_shepherds(&self) -> usize;
    /// Total number of workers across all shepherds, constant for the
    /// process lifetime. Must be an exact multiple of `total_shepherds()`.
    fn total_workers(&self) -> usize;
    /// The calling context's shepherd id, in `[0, total_shepherds())`.
    fn current_shepherd(&self) -> usize;
    /// The calling context's worker id local to its shepherd, in
    /// `[0, total_workers()/total_shepherds())`.
    fn current_worker(&self) -> usize;
    /// Cache line size in bytes; must be a power of two (typically 64).
    fn cacheline_bytes(&self) -> usize;
}

static RUNTIME: SpinMutex<Option<&'static dyn Runtime>> = SpinMutex::new(None);

/// Install the host runtime collaborator. Must be called at most once, and
/// before the first sinc is created — the topology snapshot below reads
/// through this exactly once and then never again.
///
/// # Panics
/// Panics if a runtime has already been installed (either explicitly, or
/// implicitly via the `std` reference pool on first use).
pub fn set_runtime(runtime: &'static dyn Runtime) {
    let mut slot = RUNTIME.lock();
    assert!(slot.is_none(), "sinc: Runtime already installed");
    *slot = Some(runtime);
}

fn runtime() -> &'static dyn Runtime {
    if let Some(r) = *RUNTIME.lock() {
        return r;
    }
    cfg_if::cfg_if! {
        if #[cfg(feature = "std")] {
            let r = crate::runtime_std::default_runtime();
            let mut slot = RUNTIME.lock();
            if slot.is_none() {
                *slot = Some(r);
            }
            let installed = *slot;
            drop(slot);
            installed.unwrap()
        } else {
            panic!(
                "sinc: no Runtime installed and the `std` reference pool is disabled; \
                 call sinc::topology::set_runtime() first"
            )
        }
    }
}

/// Process-lifetime topology constants (spec §4.1).
#[derive(Debug, Clone, Copy)]
pub struct Topology {
    pub shepherds: usize,
    pub workers: usize,
    pub workers_per_shepherd: usize,
    pub cacheline: usize,
}

static POPULATED: AtomicBool = AtomicBool::new(false);
static SHEPHERDS: AtomicUsize = AtomicUsize::new(0);
static WORKERS: AtomicUsize = AtomicUsize::new(0);
static WORKERS_PER_SHEPHERD: AtomicUsize = AtomicUsize::new(0);
static CACHELINE: AtomicUsize = AtomicUsize::new(0);
static TOPOLOGY_LOCK: SpinLock = SpinLock::new();

/// Return the process-wide topology snapshot, populating it from the
/// installed [`Runtime`] on first call.
pub fn topology() -> Topology {
    if !POPULATED.load(Ordering::Acquire) {
        populate_slow();
    }
    Topology {
        shepherds: SHEPHERDS.load(Ordering::Relaxed),
        workers: WORKERS.load(Ordering::Relaxed),
        workers_per_shepherd: WORKERS_PER_SHEPHERD.load(Ordering::Relaxed),
        cacheline: CACHELINE.load(Ordering::Relaxed),
    }
}

#[cold]
fn populate_slow() {
    let _guard = TOPOLOGY_LOCK.lock();
    if POPULATED.load(Ordering::Relaxed) {
        return;
    }

    let rt = runtime();
    let shepherds = rt.total_shepherds();
    let workers = rt.total_workers();
    let cacheline = rt.cacheline_bytes();

    assert!(shepherds > 0, "sinc: total_shepherds() must be > 0");
    assert!(workers > 0, "sinc: total_workers() must be > 0");
    assert!(
        workers % shepherds == 0,
        "sinc: total_workers() ({workers}) must be an exact multiple of total_shepherds() ({shepherds})"
    );
    assert!(
        cacheline.is_power_of_two(),
        "sinc: cacheline_bytes() ({cacheline}) must be a power of two"
    );

    SHEPHERDS.store(shepherds, Ordering::Relaxed);
    WORKERS.store(workers, Ordering::Relaxed);
    WORKERS_PER_SHEPHERD.store(workers / shepherds, Ordering::Relaxed);
    CACHELINE.store(cacheline, Ordering::Relaxed);
    POPULATED.store(true, Ordering::Release);
}

/// The calling context's (shepherd, worker) identity, read fresh on every
/// call (workers may migrate between calls in some runtimes; the spec does
/// not promise otherwise beyond "stable while running").
pub(crate) fn current_identity() -> (usize, usize) {
    let rt = runtime();
    (rt.current_shepherd(), rt.current_worker())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRuntime;
    impl Runtime for FixedRuntime {
        fn total_shepherds(&self) -> usize {
            2
        }
        fn total_workers(&self) -> usize {
            4
        }
        fn current_shepherd(&self) -> usize {
            0
        }
        fn current_worker(&self) -> usize {
            0
        }
        fn cacheline_bytes(&self) -> usize {
            64
        }
    }

    // Note: topology/runtime are process-wide singletons, so this can only
    // be exercised once per test binary without a real Runtime installed
    // elsewhere. We rely on the default `std` pool in the integration tests
    // and keep this as a compile-time sanity check of the trait shape only.
    #[test]
    fn fixed_runtime_reports_expected_shape() {
        let rt = FixedRuntime;
        assert_eq!(rt.total_workers() % rt.total_shepherds(), 0);
    }
}
