//! Capacity-capped host allocator.

use std::num::NonZeroUsize;

use indexmap::IndexMap;

use crate::host::HostAllocator;

/// Wraps a host allocator with a byte ceiling.
///
/// Requests that would push outstanding bytes past `capacity` fail with
/// `None` before reaching the inner allocator. In-use and peak byte counts
/// are tracked per request size (not including inner-allocator overhead).
pub struct BoundedAllocator<A> {
    inner: A,
    capacity: usize,
    in_use: usize,
    peak: usize,
    /// Outstanding region sizes keyed by address.
    regions: IndexMap<usize, usize>,
}

impl<A: HostAllocator> BoundedAllocator<A> {
    /// Wrap `inner` with a ceiling of `capacity` bytes.
    pub fn new(inner: A, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            in_use: 0,
            peak: 0,
            regions: IndexMap::new(),
        }
    }

    /// The configured ceiling in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently outstanding.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Highest value `in_use` has reached.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Bytes still available under the ceiling.
    pub fn remaining(&self) -> usize {
        self.capacity - self.in_use
    }

    /// Number of outstanding regions.
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// The wrapped allocator.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: HostAllocator> HostAllocator for BoundedAllocator<A> {
    fn allocate(&mut self, size: usize) -> Option<NonZeroUsize> {
        let new_in_use = self.in_use.checked_add(size)?;
        if new_in_use > self.capacity {
            return None;
        }
        let addr = self.inner.allocate(size)?;
        self.regions.insert(addr.get(), size);
        self.in_use = new_in_use;
        self.peak = self.peak.max(new_in_use);
        Some(addr)
    }

    #[allow(unsafe_code)]
    unsafe fn deallocate(&mut self, addr: NonZeroUsize) {
        if let Some(size) = self.regions.swap_remove(&addr.get()) {
            self.in_use -= size;
        }
        // SAFETY: forwarded caller contract.
        unsafe { self.inner.deallocate(addr) }
    }
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::host::SystemAllocator;

    #[test]
    fn request_within_capacity_succeeds() {
        let mut host = BoundedAllocator::new(SystemAllocator::new(), 128);
        let a = host.allocate(100).expect("fits");
        assert_eq!(host.in_use(), 100);
        assert_eq!(host.remaining(), 28);
        unsafe { host.deallocate(a) };
        assert_eq!(host.in_use(), 0);
        assert_eq!(host.region_count(), 0);
    }

    #[test]
    fn request_past_capacity_fails() {
        let mut host = BoundedAllocator::new(SystemAllocator::new(), 128);
        assert_eq!(host.allocate(129), None);
        let a = host.allocate(100).expect("fits");
        assert_eq!(host.allocate(29), None);
        assert_eq!(host.in_use(), 100);
        unsafe { host.deallocate(a) };
    }

    #[test]
    fn exact_capacity_is_allowed() {
        let mut host = BoundedAllocator::new(SystemAllocator::new(), 64);
        let a = host.allocate(64).expect("exact fit");
        assert_eq!(host.remaining(), 0);
        unsafe { host.deallocate(a) };
    }

    #[test]
    fn overflowing_request_fails() {
        let mut host = BoundedAllocator::new(SystemAllocator::new(), usize::MAX);
        let a = host.allocate(1).expect("fits");
        assert_eq!(host.allocate(usize::MAX), None);
        unsafe { host.deallocate(a) };
    }

    #[test]
    fn peak_tracks_high_water_mark() {
        let mut host = BoundedAllocator::new(SystemAllocator::new(), 1024);
        let a = host.allocate(300).unwrap();
        let b = host.allocate(200).unwrap();
        unsafe { host.deallocate(a) };
        let c = host.allocate(100).unwrap();
        assert_eq!(host.peak(), 500);
        assert_eq!(host.in_use(), 300);
        unsafe {
            host.deallocate(b);
            host.deallocate(c);
        }
        assert_eq!(host.peak(), 500);
    }
}
