//! Reduction descriptor: the per-worker scratch, operator, and result cell
//! (spec §3, "reduction descriptor"; §4.1–4.3, §4.8 collation).

use core::cell::UnsafeCell;
use core::mem::size_of;
use core::ptr;

use crate::alloc_util::AlignedBytes;
use crate::stat_inc;

/// Owns the per-worker reduction scratch, operator, and seed/result values
/// for one sinc.
///
/// `op` is contractually associative and commutative (spec §3, §9 O3); if a
/// caller supplies a non-commutative operator, collation still runs (it
/// does not detect the violation), but the result becomes an
/// unspecified-but-deterministic-per-topology value, since collation order
/// is fixed (shepherd-major, worker-minor) while submit interleaving is
/// not.
pub(crate) struct Reduction<T> {
    op: fn(&mut T, &T),
    initial: T,
    result: UnsafeCell<T>,
    /// `shepherds * stride` bytes, `cacheline`-aligned; worker `(s, w)`'s
    /// slot lives at byte offset `s * stride + w * size_of::<T>()`.
    values: AlignedBytes,
    stride: usize,
    shepherds: usize,
    workers_per_shepherd: usize,
}

// SAFETY: `values` is logically partitioned by (shepherd, worker); the
// sinc's release/acquire pair on its participant counter is the only
// synchronization edge required between a worker's `op` write and the
// finalizer's read (spec §5). `result`/`initial` are read only after the
// latch transitions to full and written only by the single finalizing
// thread.
unsafe impl<T: Send> Send for Reduction<T> {}
unsafe impl<T: Send> Sync for Reduction<T> {}

impl<T: Copy> Reduction<T> {
    pub(crate) fn new(
        initial: T,
        op: fn(&mut T, &T),
        shepherds: usize,
        workers_per_shepherd: usize,
        cacheline: usize,
    ) -> Self {
        let value_size = size_of::<T>();
        assert!(value_size > 0, "sinc: reduction value type must be non-zero-sized");
        let raw = workers_per_shepherd * value_size;
        let lines = raw.div_ceil(cacheline);
        let stride = lines * cacheline;

        let values = AlignedBytes::new(shepherds * stride, cacheline);

        let rdata = Self {
            op,
            initial,
            result: UnsafeCell::new(initial),
            values,
            stride,
            shepherds,
            workers_per_shepherd,
        };
        rdata.reset_slots();
        rdata
    }

    /// I4: every worker slot equals `initial` byte-for-byte after init/reset.
    fn reset_slots(&self) {
        for s in 0..self.shepherds {
            for w in 0..self.workers_per_shepherd {
                unsafe { ptr::write(self.slot_ptr(s, w), self.initial) };
            }
        }
    }

    /// Restore every slot to `initial` (spec §4.9 `reset`).
    pub(crate) fn reset(&self) {
        self.reset_slots();
    }

    #[inline]
    fn slot_ptr(&self, shepherd: usize, worker: usize) -> *mut T {
        debug_assert!(shepherd < self.shepherds);
        debug_assert!(worker < self.workers_per_shepherd);
        let offset = shepherd * self.stride + worker * size_of::<T>();
        unsafe { self.values.as_ptr().add(offset) as *mut T }
    }

    /// Spec §4.5 `tmpdata`: the calling worker's exclusive scratch slot.
    /// No synchronization is required for reads/writes by that worker since
    /// no other worker addresses the same slot.
    #[inline]
    pub(crate) fn slot(&self, shepherd: usize, worker: usize) -> &mut T {
        unsafe { &mut *self.slot_ptr(shepherd, worker) }
    }

    /// Fold `value` into the calling worker's slot (spec §4.6 step 1).
    #[inline]
    pub(crate) fn fold_into_slot(&self, shepherd: usize, worker: usize, value: &T) {
        let slot = self.slot(shepherd, worker);
        (self.op)(slot, value);
    }

    /// Spec §4.8 collate-and-release step 1: seed `result` with `initial`,
    /// then fold every worker slot into it in shepherd-major, worker-minor
    /// order. Must run exactly once, by the caller that drove the
    /// participant counter from 1 to 0.
    pub(crate) fn collate(&self) {
        let result = unsafe { &mut *self.result.get() };
        *result = self.initial;
        for s in 0..self.shepherds {
            for w in 0..self.workers_per_shepherd {
                let slot = self.slot(s, w);
                (self.op)(result, slot);
            }
        }
        stat_inc!(collate_count);
    }

    /// Spec §4.7 `wait`: copy the collated result out. Only valid to call
    /// once the latch has transitioned to full.
    pub(crate) fn result(&self) -> T {
        unsafe { *self.result.get() }
    }
}
