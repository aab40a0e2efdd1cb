//! Cache-line-aligned heap buffers.
//!
//! Replaces the spec's "one of: aligned-alloc, posix-memalign, valloc"
//! platform call with the `alloc` crate's own aligned-allocation support —
//! `Layout` already carries an alignment, so we don't need to shell out to a
//! platform-specific API the way a C host would.

use alloc::alloc::{alloc_zeroed, dealloc, handle_alloc_error};
use core::alloc::Layout;
use core::ptr::NonNull;

/// An owned, zero-initialized, `align`-aligned byte buffer.
///
/// Used for the reduction scratch (`values`): the shepherd-slab stride is
/// computed to be a multiple of the cache line size, and the whole buffer
/// must start on a cache-line boundary so the first shepherd's slab doesn't
/// share a line with unrelated allocator metadata.
pub(crate) struct AlignedBytes {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl AlignedBytes {
    /// Allocate `len` zeroed bytes aligned to `align` (which must be a power
    /// of two, as required by the spec's cache-line-size query).
    pub(crate) fn new(len: usize, align: usize) -> Self {
        debug_assert!(align.is_power_of_two(), "alignment must be a power of two");
        // `Layout` requires a non-zero size for our purposes (a zero-length
        // scratch buffer only arises when S*stride == 0, which cannot
        // happen once a reduction descriptor exists — P >= 1, V >= 1).
        let size = len.max(align);
        let layout = Layout::from_size_align(size, align).expect("invalid scratch buffer layout");
        let ptr = unsafe { alloc_zeroed(layout) };
        let ptr = match NonNull::new(ptr) {
            Some(p) => p,
            None => handle_alloc_error(layout),
        };
        Self { ptr, layout }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }
}

impl Drop for AlignedBytes {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) };
    }
}

// SAFETY: `AlignedBytes` owns its allocation exclusively; sharing across
// threads is the caller's responsibility (the reduction scratch is
// partitioned per (shepherd, worker) slot, see `reduction::Reduction`).
unsafe impl Send for AlignedBytes {}
unsafe impl Sync for AlignedBytes {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_aligned_and_zeroed() {
        let buf = AlignedBytes::new(256, 64);
        let addr = buf.as_ptr() as usize;
        assert_eq!(addr % 64, 0);
        let slice = unsafe { core::slice::from_raw_parts(buf.as_ptr(), 256) };
        assert!(slice.iter().all(|&b| b == 0));
    }
}
