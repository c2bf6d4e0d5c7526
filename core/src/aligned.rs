//! Zeroed, over-aligned heap buffers
//!
//! IOS requires request buffers on a 0x40 boundary and the USB stack wants
//! the same for sector buffers. The buffer is zero-filled at allocation so
//! stale heap bytes never reach the device or the service.

use alloc::alloc::{alloc_zeroed, dealloc};
use core::alloc::Layout;
use core::ops::{Deref, DerefMut};
use core::ptr::NonNull;

/// IOS buffer alignment (0x40).
pub const IOS_ALIGN: usize = 0x40;

/// A scoped heap buffer that frees on drop
pub struct AlignedBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
    len: usize,
}

impl AlignedBuffer {
    /// Allocate `len` zeroed bytes aligned to `align`.
    ///
    /// Returns `None` if the layout is invalid or the allocator is out of
    /// memory; unlike `Vec` this never aborts the process.
    pub fn zeroed(len: usize, align: usize) -> Option<Self> {
        // Zero-sized allocations are UB for the global allocator
        let size = len.max(1);
        let layout = Layout::from_size_align(size, align).ok()?;
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw)?;
        Some(Self { ptr, layout, len })
    }

    /// Allocate with the IOS alignment.
    pub fn ios(len: usize) -> Option<Self> {
        Self::zeroed(len, IOS_ALIGN)
    }

    pub fn align(&self) -> usize {
        self.layout.align()
    }

    /// Re-zero the whole buffer.
    pub fn clear(&mut self) {
        self.fill(0);
    }
}

impl Deref for AlignedBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl core::fmt::Debug for AlignedBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("len", &self.len)
            .field("align", &self.layout.align())
            .finish()
    }
}

// Owned, exclusively borrowed through &mut
unsafe impl Send for AlignedBuffer {}
unsafe impl Sync for AlignedBuffer {}

impl Drop for AlignedBuffer {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}
