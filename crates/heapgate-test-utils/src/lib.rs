//! Test utilities and mock host allocators for heapgate development.
//!
//! [`MockAllocator`] hands out addresses from a simulated address space
//! without touching real memory, records every call it receives, and panics
//! if it is ever asked to release an address it does not consider live. The
//! boundary's job is to make that panic impossible.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::collections::HashMap;
use std::num::NonZeroUsize;

use heapgate_core::HostAllocator;

/// First address handed out by a [`MockAllocator`].
pub const MOCK_BASE: usize = 0x1_0000;

/// Alignment of mock addresses.
pub const MOCK_ALIGN: usize = 16;

/// One call observed by a [`MockAllocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCall {
    /// `allocate(size)` and what it returned.
    Allocate {
        size: usize,
        result: Option<NonZeroUsize>,
    },
    /// `deallocate(addr)`.
    Deallocate { addr: NonZeroUsize },
}

/// Simulated host allocator with a byte capacity and a call log.
///
/// Released addresses are reused LIFO for requests of the same rounded
/// size, the way real size-class allocators reissue recently freed blocks.
pub struct MockAllocator {
    capacity: usize,
    next: usize,
    in_use: usize,
    live: HashMap<usize, usize>,
    recycled: HashMap<usize, Vec<usize>>,
    calls: Vec<HostCall>,
}

fn round_up(size: usize) -> Option<usize> {
    size.max(1)
        .checked_add(MOCK_ALIGN - 1)
        .map(|s| s & !(MOCK_ALIGN - 1))
}

impl MockAllocator {
    /// A mock that refuses requests beyond `capacity` outstanding bytes
    /// (counted after rounding to [`MOCK_ALIGN`]).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            next: MOCK_BASE,
            in_use: 0,
            live: HashMap::new(),
            recycled: HashMap::new(),
            calls: Vec::new(),
        }
    }

    /// A mock with effectively unlimited capacity.
    pub fn new() -> Self {
        Self::with_capacity(usize::MAX / 2)
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Number of `deallocate` calls received.
    pub fn deallocate_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Deallocate { .. }))
            .count()
    }

    /// Number of `allocate` calls received.
    pub fn allocate_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, HostCall::Allocate { .. }))
            .count()
    }

    /// Outstanding bytes (rounded).
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Number of outstanding regions.
    pub fn live_regions(&self) -> usize {
        self.live.len()
    }

    /// Whether `addr` is outstanding.
    pub fn is_live(&self, addr: usize) -> bool {
        self.live.contains_key(&addr)
    }

    /// Forget the call log.
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl Default for MockAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl HostAllocator for MockAllocator {
    fn allocate(&mut self, size: usize) -> Option<NonZeroUsize> {
        let result = self.place(size);
        self.calls.push(HostCall::Allocate { size, result });
        result
    }

    #[allow(unsafe_code)]
    unsafe fn deallocate(&mut self, addr: NonZeroUsize) {
        self.calls.push(HostCall::Deallocate { addr });
        let Some(rounded) = self.live.remove(&addr.get()) else {
            panic!("mock host asked to release {:#x}, which is not live", addr.get());
        };
        self.in_use -= rounded;
        self.recycled.entry(rounded).or_default().push(addr.get());
    }
}

impl MockAllocator {
    fn place(&mut self, size: usize) -> Option<NonZeroUsize> {
        let rounded = round_up(size)?;
        let in_use = self.in_use.checked_add(rounded)?;
        if in_use > self.capacity {
            return None;
        }
        let addr = match self.recycled.get_mut(&rounded).and_then(Vec::pop) {
            Some(addr) => addr,
            None => {
                let addr = self.next;
                self.next = self.next.checked_add(rounded)?;
                addr
            }
        };
        self.live.insert(addr, rounded);
        self.in_use = in_use;
        NonZeroUsize::new(addr)
    }
}
