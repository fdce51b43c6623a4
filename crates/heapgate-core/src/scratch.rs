//! Downward-growing scratch stack exposed as `stack_save` / `stack_restore`
//! / `stack_alloc`.
//!
//! Guest code compiled for a C-style toolchain expects a shadow stack it can
//! bump for temporaries and rewind by restoring a saved pointer. The region
//! is reserved once from the host allocator; the stack itself is pure
//! pointer bookkeeping and never touches the memory it hands out.

use std::num::NonZeroUsize;

use crate::error::BoundaryError;
use crate::host::HostAllocator;

/// Alignment of every pointer the scratch stack hands out.
pub const STACK_ALIGN: usize = 16;

const fn align_down(value: usize) -> usize {
    value & !(STACK_ALIGN - 1)
}

/// Bump-down stack over a region reserved from a host allocator.
///
/// ```text
/// base                      sp                    top
///  |   free (grows down) -> |  in use (saved)      |
/// ```
#[derive(Debug)]
pub struct ScratchStack {
    /// Address returned by the host; released on [`release`](Self::release).
    region: NonZeroUsize,
    /// Lowest usable aligned address.
    base: usize,
    /// One past the highest usable aligned address; the initial pointer.
    top: usize,
    /// Current stack pointer.
    sp: usize,
}

impl ScratchStack {
    /// Reserve `size` bytes from `host` for a new stack.
    ///
    /// The usable range is shrunk inward to [`STACK_ALIGN`] boundaries if the
    /// host returns an unaligned region.
    pub fn reserve<A: HostAllocator + ?Sized>(
        host: &mut A,
        size: usize,
    ) -> Result<Self, BoundaryError> {
        let region = host
            .allocate(size)
            .ok_or(BoundaryError::AllocationFailed { requested: size })?;
        let start = region.get();
        let base = align_down(start.saturating_add(STACK_ALIGN - 1));
        let top = align_down(start.saturating_add(size)).max(base);
        Ok(Self {
            region,
            base,
            top,
            sp: top,
        })
    }

    /// Return the region to `host`.
    ///
    /// `host` must be the allocator the stack was reserved from.
    #[allow(unsafe_code)]
    pub fn release<A: HostAllocator + ?Sized>(self, host: &mut A) {
        // SAFETY: `region` came from `host.allocate` in `reserve` and is
        // released exactly once because `self` is consumed.
        unsafe { host.deallocate(self.region) }
    }

    /// Push `size` bytes, returning the new (aligned) stack pointer.
    ///
    /// Returns `None` without moving the pointer if the stack would pass
    /// below its base.
    pub fn alloc(&mut self, size: usize) -> Option<usize> {
        let lowered = self.sp.checked_sub(size)?;
        let sp = align_down(lowered);
        if sp < self.base {
            return None;
        }
        self.sp = sp;
        Some(sp)
    }

    /// Current stack pointer.
    pub fn save(&self) -> usize {
        self.sp
    }

    /// Rewind (or advance) the stack pointer to a previously saved value.
    ///
    /// Only aligned pointers within `[base, top]` are accepted.
    pub fn restore(&mut self, pointer: usize) -> Result<(), BoundaryError> {
        if pointer % STACK_ALIGN != 0 || pointer < self.base || pointer > self.top {
            return Err(BoundaryError::InvalidStackPointer { pointer });
        }
        self.sp = pointer;
        Ok(())
    }

    /// Lowest usable address.
    pub fn base(&self) -> usize {
        self.base
    }

    /// Initial stack pointer.
    pub fn top(&self) -> usize {
        self.top
    }

    /// Bytes currently pushed.
    pub fn used(&self) -> usize {
        self.top - self.sp
    }

    /// Bytes still available below the stack pointer.
    pub fn free(&self) -> usize {
        self.sp - self.base
    }

    /// Usable bytes in total.
    pub fn capacity(&self) -> usize {
        self.top - self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::SystemAllocator;

    fn stack(size: usize) -> (SystemAllocator, ScratchStack) {
        let mut host = SystemAllocator::new();
        let stack = ScratchStack::reserve(&mut host, size).expect("reserve");
        (host, stack)
    }

    #[test]
    fn starts_empty_at_top() {
        let (mut host, stack) = stack(256);
        assert_eq!(stack.save(), stack.top());
        assert_eq!(stack.used(), 0);
        assert_eq!(stack.capacity(), 256);
        stack.release(&mut host);
    }

    #[test]
    fn alloc_rounds_to_sixteen() {
        let (mut host, mut stack) = stack(256);
        let top = stack.top();
        let p = stack.alloc(1).unwrap();
        assert_eq!(p, top - 16);
        let q = stack.alloc(17).unwrap();
        assert_eq!(q, top - 48);
        assert_eq!(q % STACK_ALIGN, 0);
        assert_eq!(stack.used(), 48);
        assert_eq!(stack.free(), 256 - 48);
        stack.release(&mut host);
    }

    #[test]
    fn exhaustion_returns_none_and_keeps_pointer() {
        let (mut host, mut stack) = stack(64);
        assert!(stack.alloc(48).is_some());
        let before = stack.save();
        assert_eq!(stack.alloc(32), None);
        assert_eq!(stack.save(), before);
        assert!(stack.alloc(16).is_some());
        assert_eq!(stack.alloc(1), None);
        stack.release(&mut host);
    }

    #[test]
    fn huge_request_does_not_underflow() {
        let (mut host, mut stack) = stack(64);
        assert_eq!(stack.alloc(usize::MAX), None);
        stack.release(&mut host);
    }

    #[test]
    fn save_restore_rewinds() {
        let (mut host, mut stack) = stack(256);
        let saved = stack.save();
        stack.alloc(100).unwrap();
        stack.restore(saved).unwrap();
        assert_eq!(stack.used(), 0);
        stack.release(&mut host);
    }

    #[test]
    fn restore_rejects_out_of_range_and_misaligned() {
        let (mut host, mut stack) = stack(256);
        let top = stack.top();
        let base = stack.base();
        for bad in [top + 16, base - 16, base + 1, 0] {
            assert_eq!(
                stack.restore(bad),
                Err(BoundaryError::InvalidStackPointer { pointer: bad })
            );
        }
        assert!(stack.restore(base).is_ok());
        assert_eq!(stack.used(), 256);
        stack.release(&mut host);
    }
}
