//! The safe, generic sinc handle (spec §3 "Sinc", §4 public operations).
//!
//! `T` stands in for the spec's `(V, op)` pair: `V = size_of::<T>()`. Set
//! `T = ()` (or use [`Sinc::barrier`]) for the spec's barrier-only mode
//! (`V == 0`).

use alloc::boxed::Box;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::latch::Latch;
use crate::reduction::Reduction;
use crate::topology::{self, current_identity};
use crate::{stat_add, stat_inc};

/// A scalable termination-detecting reduction barrier.
///
/// See the crate-level docs for the full contract. In short: an unknown
/// number of participants are announced with [`Sinc::willspawn`], each
/// eventually calls [`Sinc::submit`] exactly once, and [`Sinc::wait`]
/// blocks until every announced participant has submitted, at which point
/// it returns the fold of every submitted value over `initial` (or nothing,
/// in barrier mode).
pub struct Sinc<T> {
    counter: AtomicU64,
    latch: Latch,
    rdata: Option<Reduction<T>>,
}

impl<T: Copy + Send + 'static> Sinc<T> {
    /// Spec §4.2 `init` with a reduction descriptor (`V > 0`).
    ///
    /// `op` must be associative and commutative (spec §9 O3); this is not
    /// checked.
    pub fn reduce(initial: T, op: fn(&mut T, &T), expect: u64) -> Self {
        let topo = topology::topology();
        let rdata = Reduction::new(initial, op, topo.shepherds, topo.workers_per_shepherd, topo.cacheline);
        Self {
            counter: AtomicU64::new(expect),
            latch: Latch::new(expect == 0),
            rdata: Some(rdata),
        }
    }

    /// Spec §4.3 `create`: heap-allocate a handle and initialize it.
    pub fn create(initial: T, op: fn(&mut T, &T), expect: u64) -> Box<Self> {
        Box::new(Self::reduce(initial, op, expect))
    }

    /// Spec §4.9 `reset`. Precondition: the sinc is `Complete` (`C == 0`).
    ///
    /// # Panics
    /// Panics if the counter is not currently zero (spec §7, "invalid
    /// reset" is a precondition failure).
    pub fn reset(&self, expect: u64) {
        let prev = self.counter.load(Ordering::Acquire);
        assert_eq!(
            prev, 0,
            "sinc: reset() requires the sinc to be Complete (counter == 0), was {prev}"
        );
        if let Some(rdata) = &self.rdata {
            rdata.reset();
        }
        self.counter.store(expect, Ordering::Release);
        if expect != 0 {
            self.latch.empty();
        } else {
            self.latch.fill();
        }
        stat_inc!(reset_count);
    }

    /// Spec §4.4 `willspawn`: atomically add `n` to the participant count.
    /// If the sinc had already completed, it is re-armed as part of the
    /// same step.
    pub fn willspawn(&self, n: u64) {
        if n == 0 {
            return;
        }
        let prev = self.counter.fetch_add(n, Ordering::AcqRel);
        if prev == 0 {
            self.latch.empty();
        }
        stat_inc!(willspawn_count);
        stat_add!(willspawn_total, n);
    }

    /// Spec §4.5 `tmpdata`: the calling worker's exclusive scratch slot, or
    /// `None` in barrier mode.
    ///
    /// # Safety
    /// The returned reference is exclusive only by the runtime's contract
    /// that no two callers share a (shepherd, worker) identity
    /// concurrently; the borrow checker cannot verify this, so this method
    /// is unsafe.
    pub unsafe fn tmpdata(&self) -> Option<&mut T> {
        let rdata = self.rdata.as_ref()?;
        let (s, w) = current_identity();
        Some(rdata.slot(s, w))
    }

    /// Spec §4.6 `submit`. If `value` is `Some`, it is folded into the
    /// caller's slot via `op` before the participant count is decremented.
    ///
    /// # Panics
    /// Panics if the sinc has no reduction descriptor but `value` is
    /// `Some`, or if called when the counter is already zero
    /// (over-submission, spec §7).
    pub fn submit(&self, value: Option<&T>) {
        if let Some(value) = value {
            let rdata = self
                .rdata
                .as_ref()
                .expect("sinc: submit() given a value but this sinc has no reduction descriptor");
            let (s, w) = current_identity();
            rdata.fold_into_slot(s, w, value);
        }

        let prev = self.counter.fetch_sub(1, Ordering::AcqRel);
        assert!(prev >= 1, "sinc: submit() called with counter already at 0");
        stat_inc!(submit_count);
        if prev == 1 {
            if let Some(rdata) = &self.rdata {
                rdata.collate();
            }
            self.latch.fill();
        }
    }

    /// Spec §4.7 `wait`: block until every announced participant has
    /// submitted, then return the collated result (`None` in barrier mode).
    pub fn wait(&self) -> Option<T> {
        let uncontended = self.latch.wait();
        stat_inc!(wait_count);
        if uncontended {
            stat_inc!(wait_uncontended);
        }
        self.rdata.as_ref().map(Reduction::result)
    }

    /// Current participant count, for diagnostics/tests (not part of the
    /// spec's public API table, but useful for asserting P2 "counter
    /// conservation").
    pub fn outstanding(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }
}

impl Sinc<()> {
    /// Spec §4.2 `init` without a reduction descriptor (`V == 0`,
    /// barrier-only mode).
    pub fn barrier(expect: u64) -> Self {
        // Topology population is unconditional in `init` (spec §4.2 step
        // 2), run before the `V == 0` branch; barrier mode must trigger
        // "first caller wins" the same as the reduction-carrying path.
        let _ = topology::topology();
        Self {
            counter: AtomicU64::new(expect),
            latch: Latch::new(expect == 0),
            rdata: None,
        }
    }
}

// Spec §4.10: `fini`/`destroy` free the owned reduction scratch and (for
// `destroy`) the handle itself. In Rust these collapse into `Drop` (for the
// scratch, via `Reduction`/`AlignedBytes`) and ordinary ownership (for the
// handle, via `Box<Sinc<T>>` going out of scope) — there is nothing left to
// implement here. Per spec §9 O1, this crate does not add a waiter-count
// barrier: the original's own comment acknowledges that with many waiters
// and few cores, the first waiter to unblock may race a concurrent
// `destroy`/drop while others are still dereferencing the sinc. Callers
// that need many-waiter safety must supply their own join point (e.g. have
// exactly one designated thread own the `Sinc<T>` and broadcast the result
// to the rest, rather than handing out shared references to all waiters).

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrier_with_zero_expect_completes_immediately() {
        let sinc = Sinc::barrier(0);
        assert_eq!(sinc.wait(), None);
    }

    #[test]
    fn reduce_with_zero_expect_yields_initial() {
        fn add(acc: &mut i64, v: &i64) {
            *acc += v;
        }
        let sinc = Sinc::reduce(0i64, add, 0);
        assert_eq!(sinc.wait(), Some(0));
    }
}
