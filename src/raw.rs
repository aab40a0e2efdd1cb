//! Byte-level sinc engine, mirroring the original `qt_sinc_t` ABI almost
//! verbatim (see `examples/original_source/src/sincs/donecount.c`). This is
//! the layer a non-Rust host runtime actually links against (via the `ffi`
//! module); the safe, generic `sinc::Sinc<T>` is the idiomatic Rust surface
//! and does not use this type at all — it builds directly on
//! `reduction::Reduction<T>` instead.
//!
//! Kept deliberately close to the C original's layout and naming (one
//! `2*value_size` block holding `initial` then `result`, one
//! `shepherds*stride` scratch buffer) because FFI consumers will have
//! pointer-level expectations shaped by that original.

use core::ptr;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::alloc_util::AlignedBytes;
use crate::latch::Latch;
use crate::topology;
use crate::{stat_add, stat_inc};

/// Binary, in-place, associative-and-commutative-by-contract reduction
/// operator: `acc = acc OP incoming`, operating on `value_size`-byte
/// buffers.
///
/// # Safety
/// Both pointers must be valid for reads/writes of `value_size` bytes.
pub type RawOp = unsafe extern "C" fn(acc: *mut u8, incoming: *const u8);

struct RawReduction {
    value_size: usize,
    op: RawOp,
    /// `2 * value_size` bytes: `initial` at offset 0, `result` at offset
    /// `value_size` (spec §3, "colocated with `initial` in a single `2*V`
    /// allocation").
    initial_result: AlignedBytes,
    values: AlignedBytes,
    stride: usize,
    shepherds: usize,
    workers_per_shepherd: usize,
}

impl RawReduction {
    fn initial_ptr(&self) -> *mut u8 {
        self.initial_result.as_ptr()
    }

    fn result_ptr(&self) -> *mut u8 {
        unsafe { self.initial_result.as_ptr().add(self.value_size) }
    }

    fn slot_ptr(&self, shepherd: usize, worker: usize) -> *mut u8 {
        let offset = shepherd * self.stride + worker * self.value_size;
        unsafe { self.values.as_ptr().add(offset) }
    }

    fn reset_slots(&self) {
        for s in 0..self.shepherds {
            for w in 0..self.workers_per_shepherd {
                unsafe {
                    ptr::copy_nonoverlapping(self.initial_ptr(), self.slot_ptr(s, w), self.value_size);
                }
            }
        }
    }

    fn collate(&self) {
        unsafe {
            ptr::copy_nonoverlapping(self.initial_ptr(), self.result_ptr(), self.value_size);
            for s in 0..self.shepherds {
                for w in 0..self.workers_per_shepherd {
                    (self.op)(self.result_ptr(), self.slot_ptr(s, w));
                }
            }
        }
        stat_inc!(collate_count);
    }
}

/// The byte-level handle. `rdata` is `None` iff `value_size == 0`
/// (spec I3, barrier-only mode).
pub struct RawSinc {
    counter: AtomicU64,
    latch: Latch,
    rdata: Option<RawReduction>,
}

impl RawSinc {
    /// Spec §4.2 `init`. `initial`/`op` must both be null (barrier-only) or
    /// both non-null.
    ///
    /// # Safety
    /// If `value_size > 0`, `initial` must point to `value_size` readable
    /// bytes and `op` must be callable with two `value_size`-byte buffers.
    pub unsafe fn new(value_size: usize, initial: *const u8, op: Option<RawOp>, expect: u64) -> Self {
        assert!(
            (value_size == 0 && initial.is_null() && op.is_none())
                || (value_size > 0 && !initial.is_null() && op.is_some()),
            "sinc: value_size and (initial, op) must agree on presence"
        );

        let topo = topology::topology();

        let rdata = if value_size > 0 {
            let op = op.unwrap();
            let raw = topo.workers_per_shepherd * value_size;
            let lines = raw.div_ceil(topo.cacheline);
            let stride = lines * topo.cacheline;

            let initial_result = AlignedBytes::new(2 * value_size, topo.cacheline.max(1));
            unsafe { ptr::copy_nonoverlapping(initial, initial_result.as_ptr(), value_size) };

            let values = AlignedBytes::new(topo.shepherds * stride, topo.cacheline);

            let rdata = RawReduction {
                value_size,
                op,
                initial_result,
                values,
                stride,
                shepherds: topo.shepherds,
                workers_per_shepherd: topo.workers_per_shepherd,
            };
            rdata.reset_slots();
            Some(rdata)
        } else {
            None
        };

        Self {
            counter: AtomicU64::new(expect),
            latch: Latch::new(expect == 0),
            rdata,
        }
    }

    pub fn reset(&self, expect: u64) {
        let prev = self.counter.load(Ordering::Acquire);
        assert_eq!(prev, 0, "sinc: reset requires the sinc to be Complete (C == 0)");
        if let Some(rdata) = &self.rdata {
            rdata.reset_slots();
        }
        self.counter.store(expect, Ordering::Release);
        if expect != 0 {
            self.latch.empty();
        } else {
            self.latch.fill();
        }
        stat_inc!(reset_count);
    }

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

    /// # Safety
    /// Returns null iff this sinc has no reduction descriptor.
    pub fn tmpdata(&self) -> *mut u8 {
        match &self.rdata {
            Some(rdata) => {
                let (s, w) = topology::current_identity();
                rdata.slot_ptr(s, w)
            }
            None => ptr::null_mut(),
        }
    }

    /// # Safety
    /// If non-null, `value` must point to `value_size` readable bytes and
    /// this sinc must have a reduction descriptor.
    pub unsafe fn submit(&self, value: *const u8) {
        if !value.is_null() {
            let rdata = self
                .rdata
                .as_ref()
                .expect("sinc: submit() given a value but this sinc has no reduction descriptor");
            let (s, w) = topology::current_identity();
            unsafe { (rdata.op)(rdata.slot_ptr(s, w), value) };
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

    /// # Safety
    /// If non-null, `target` must point to `value_size` writable bytes and
    /// this sinc must have a reduction descriptor.
    pub unsafe fn wait(&self, target: *mut u8) {
        let uncontended = self.latch.wait();
        stat_inc!(wait_count);
        if uncontended {
            stat_inc!(wait_uncontended);
        }
        if !target.is_null() {
            let rdata = self
                .rdata
                .as_ref()
                .expect("sinc: wait() given a target but this sinc has no reduction descriptor");
            unsafe { ptr::copy_nonoverlapping(rdata.result_ptr(), target, rdata.value_size) };
        }
    }
}
