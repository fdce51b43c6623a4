//! Host allocator capability.
//!
//! The boundary never manages memory itself. It forwards to a
//! [`HostAllocator`] passed in at construction, which keeps tests free of
//! hidden global state and lets a sandbox cap its heap with a
//! [`BoundedAllocator`](crate::BoundedAllocator).

use std::alloc::{self, Layout};
use std::num::NonZeroUsize;

/// An `allocate(size) -> address-or-null` / `deallocate(address)` pair.
///
/// Implementations decide their own failure modes; the only requirement is
/// that `allocate` reports failure with `None` rather than panicking.
pub trait HostAllocator {
    /// Reserve a region of at least `size` bytes.
    ///
    /// Returns the region's address, or `None` if the request cannot be
    /// satisfied.
    fn allocate(&mut self, size: usize) -> Option<NonZeroUsize>;

    /// Release a region.
    ///
    /// # Safety
    ///
    /// `addr` must have been returned by [`allocate`](Self::allocate) on this
    /// same allocator and must not have been released since.
    #[allow(unsafe_code)]
    unsafe fn deallocate(&mut self, addr: NonZeroUsize);
}

impl<A: HostAllocator + ?Sized> HostAllocator for &mut A {
    fn allocate(&mut self, size: usize) -> Option<NonZeroUsize> {
        (**self).allocate(size)
    }

    #[allow(unsafe_code)]
    unsafe fn deallocate(&mut self, addr: NonZeroUsize) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).deallocate(addr) }
    }
}

impl<A: HostAllocator + ?Sized> HostAllocator for Box<A> {
    fn allocate(&mut self, size: usize) -> Option<NonZeroUsize> {
        (**self).allocate(size)
    }

    #[allow(unsafe_code)]
    unsafe fn deallocate(&mut self, addr: NonZeroUsize) {
        // SAFETY: forwarded caller contract.
        unsafe { (**self).deallocate(addr) }
    }
}

/// Alignment of every region handed out by [`SystemAllocator`].
pub const SYSTEM_ALIGN: usize = 16;

/// Size prefix stored in front of each region. Kept at the alignment so the
/// payload stays 16-byte aligned.
const HEADER_SIZE: usize = SYSTEM_ALIGN;

/// Host allocator backed by the Rust global allocator.
///
/// Each region is laid out as:
///
/// ```text
/// [ size: usize, padded to 16 bytes ][ payload (size bytes) ]
///                                     ^ returned address
/// ```
///
/// The header lets `deallocate` rebuild the `Layout` from the address alone.
/// On wasm32 the returned address is the offset into linear memory.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl SystemAllocator {
    /// Create a system allocator.
    pub const fn new() -> Self {
        SystemAllocator
    }

    /// Layout for a payload of `size` bytes, or `None` if the total
    /// overflows or exceeds `isize::MAX`.
    fn layout_for(size: usize) -> Option<Layout> {
        let total = size.checked_add(HEADER_SIZE)?;
        Layout::from_size_align(total, SYSTEM_ALIGN).ok()
    }
}

impl HostAllocator for SystemAllocator {
    #[allow(unsafe_code)]
    fn allocate(&mut self, size: usize) -> Option<NonZeroUsize> {
        let layout = Self::layout_for(size)?;
        // SAFETY: the layout always includes the header, so it is never zero-sized.
        let base = unsafe { alloc::alloc(layout) };
        if base.is_null() {
            return None;
        }
        // SAFETY: `base` is valid for `layout.size()` bytes and aligned to 16,
        // which covers the usize write and the header offset.
        let payload = unsafe {
            base.cast::<usize>().write(size);
            base.add(HEADER_SIZE)
        };
        NonZeroUsize::new(payload.expose_provenance())
    }

    #[allow(unsafe_code)]
    unsafe fn deallocate(&mut self, addr: NonZeroUsize) {
        let payload = std::ptr::with_exposed_provenance_mut::<u8>(addr.get());
        // SAFETY: per the trait contract `addr` came from `allocate`, so the
        // header sits `HEADER_SIZE` bytes before it and holds the payload size
        // that produced a valid layout.
        unsafe {
            let base = payload.sub(HEADER_SIZE);
            let size = base.cast::<usize>().read();
            let layout = Layout::from_size_align_unchecked(size + HEADER_SIZE, SYSTEM_ALIGN);
            alloc::dealloc(base, layout);
        }
    }
}
