//! C-ABI exports for non-Rust host runtimes (spec §6 public API table).
//!
//! Gated behind `features = ["ffi"]` (or `"c-abi"`, its alias). Operates on
//! the byte-level [`crate::raw::RawSinc`] engine, since C has no generics —
//! callers pass an explicit `value_size` and an `extern "C"` operator
//! function pointer, exactly as `qt_sinc_t` does in the original source.
//!
//! All functions take/return `*mut sinc_t`, an opaque handle. None of them
//! validate that the pointer actually came from `sinc_create`; as with the
//! original, misuse is a precondition failure (spec §7), not a recoverable
//! error.

use alloc::boxed::Box;
use core::ptr;

use crate::raw::RawSinc;
pub use crate::raw::RawOp;

/// Opaque handle type for C callers. Never constructed on the Rust side
/// except via [`sinc_create`]/[`sinc_init`].
#[repr(C)]
pub struct sinc_t {
    _private: [u8; 0],
}

#[inline]
unsafe fn as_raw<'a>(sinc: *mut sinc_t) -> &'a RawSinc {
    assert!(!sinc.is_null(), "sinc: null handle passed to FFI call");
    unsafe { &*(sinc as *const RawSinc) }
}

/// Spec §4.3 `create`: allocate a handle and initialize it. Returns an
/// owning pointer; the caller must eventually pass it to
/// [`sinc_destroy`].
///
/// # Safety
/// If `value_size > 0`, `initial` must point to `value_size` readable bytes
/// and `op` must be `Some` and callable with two `value_size`-byte buffers;
/// if `value_size == 0`, both `initial` and `op` must be null/`None`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_create(
    value_size: usize,
    initial: *const u8,
    op: Option<RawOp>,
    expect: u64,
) -> *mut sinc_t {
    let raw = unsafe { RawSinc::new(value_size, initial, op, expect) };
    Box::into_raw(Box::new(raw)) as *mut sinc_t
}

/// Size in bytes of a `sinc_t`, for callers that embed a sinc inline in
/// their own storage via [`sinc_init`]/[`sinc_fini`] instead of going
/// through [`sinc_create`]/[`sinc_destroy`].
#[unsafe(no_mangle)]
pub extern "C" fn sinc_sizeof() -> usize {
    core::mem::size_of::<RawSinc>()
}

/// Required alignment in bytes of a `sinc_t`, for use alongside
/// [`sinc_sizeof`].
#[unsafe(no_mangle)]
pub extern "C" fn sinc_alignof() -> usize {
    core::mem::align_of::<RawSinc>()
}

/// Spec §4.2 `init`: initialize a sinc in caller-owned storage, mirroring
/// the original `qt_sinc_init(qt_sinc_t*, ...)`, which writes into storage
/// the caller already owns rather than allocating a handle. The reduction
/// scratch (if any) is still heap-allocated; only the handle itself is
/// caller-owned.
///
/// # Safety
/// `sinc` must point to at least [`sinc_sizeof`] bytes, aligned to
/// [`sinc_alignof`], not currently holding a live sinc. If `value_size > 0`,
/// `initial` must point to `value_size` readable bytes and `op` must be
/// `Some` and callable with two `value_size`-byte buffers; if
/// `value_size == 0`, both `initial` and `op` must be null/`None`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_init(
    sinc: *mut sinc_t,
    value_size: usize,
    initial: *const u8,
    op: Option<RawOp>,
    expect: u64,
) {
    assert!(!sinc.is_null(), "sinc: null storage passed to sinc_init");
    let raw = unsafe { RawSinc::new(value_size, initial, op, expect) };
    unsafe { ptr::write(sinc as *mut RawSinc, raw) };
}

/// Spec §4.9 `reset`. Precondition: the sinc is `Complete` (outstanding
/// count is zero); violating this aborts the process (spec §7).
///
/// # Safety
/// `sinc` must be a live pointer returned by [`sinc_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_reset(sinc: *mut sinc_t, expect: u64) {
    unsafe { as_raw(sinc) }.reset(expect);
}

/// Spec §4.4 `willspawn`.
///
/// # Safety
/// `sinc` must be a live pointer returned by [`sinc_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_willspawn(sinc: *mut sinc_t, n: u64) {
    unsafe { as_raw(sinc) }.willspawn(n);
}

/// Spec §4.5 `tmpdata`. Returns null iff the sinc has no reduction
/// descriptor (`value_size == 0`).
///
/// # Safety
/// `sinc` must be a live pointer returned by [`sinc_create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_tmpdata(sinc: *mut sinc_t) -> *mut u8 {
    unsafe { as_raw(sinc) }.tmpdata()
}

/// Spec §4.6 `submit`. `value` may be null (no fold; just decrements the
/// participant count).
///
/// # Safety
/// `sinc` must be a live pointer returned by [`sinc_create`]; if non-null,
/// `value` must point to `value_size` readable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_submit(sinc: *mut sinc_t, value: *const u8) {
    unsafe { as_raw(sinc).submit(value) };
}

/// Spec §4.7 `wait`. `target` may be null (wait without copying a result
/// out).
///
/// # Safety
/// `sinc` must be a live pointer returned by [`sinc_create`]; if non-null,
/// `target` must point to `value_size` writable bytes.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_wait(sinc: *mut sinc_t, target: *mut u8) {
    unsafe { as_raw(sinc).wait(target) };
}

/// Spec §4.10 `destroy`: frees the reduction scratch (if any) and the
/// handle itself.
///
/// # Safety
/// `sinc` must be a live pointer returned by [`sinc_create`], not
/// previously destroyed, and have no concurrent waiters (spec §9 O1 — this
/// crate does not guard against that race).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_destroy(sinc: *mut sinc_t) {
    if sinc.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(sinc as *mut RawSinc) });
}

/// Spec §4.10 `fini`: tear down a sinc previously set up with
/// [`sinc_init`], freeing the reduction scratch but leaving the
/// caller-owned storage itself untouched (the counterpart to
/// [`sinc_destroy`] for the caller-owned-storage path).
///
/// # Safety
/// `sinc` must point to a live sinc previously initialized by [`sinc_init`],
/// not previously finalized, with no concurrent waiters (spec §9 O1 — this
/// crate does not guard against that race).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sinc_fini(sinc: *mut sinc_t) {
    assert!(!sinc.is_null(), "sinc: null handle passed to sinc_fini");
    unsafe { ptr::drop_in_place(sinc as *mut RawSinc) };
}
