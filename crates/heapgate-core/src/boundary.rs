//! The allocation boundary: validated forwarding to a host allocator.
//!
//! Every handle returned by [`Boundary::allocate`] is recorded in a live
//! index together with its requested size. [`Boundary::deallocate`] checks
//! the index before anything reaches the host, so a null, foreign, or
//! already-released handle is caught here instead of corrupting the host's
//! heap. What happens next is decided by
//! [`InvalidFreePolicy`](crate::InvalidFreePolicy).

use indexmap::IndexMap;

use crate::config::{BoundaryConfig, ConfigError, InvalidFreePolicy, ZeroSizePolicy};
use crate::error::BoundaryError;
use crate::fault::{self, FaultReason};
use crate::handle::Handle;
use crate::host::HostAllocator;
use crate::scratch::ScratchStack;

/// Value returned by [`probe`].
pub const PROBE_VALUE: i32 = 42;

/// Link check for foreign callers. Always returns [`PROBE_VALUE`].
pub const fn probe() -> i32 {
    PROBE_VALUE
}

/// Counters and live-set figures for a [`Boundary`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundaryStats {
    /// Successful allocations, including zero-size minimal regions.
    pub allocations: u64,
    /// Successful deallocations, including those done by `release_all`.
    pub deallocations: u64,
    /// Allocations the host allocator refused.
    pub failed_allocations: u64,
    /// Deallocations rejected because the handle was not live.
    pub rejected_deallocations: u64,
    /// Handles currently live.
    pub live_count: usize,
    /// Requested bytes currently live.
    pub live_bytes: usize,
    /// Highest value `live_bytes` has reached.
    pub peak_live_bytes: usize,
}

/// Allocation boundary over an injected host allocator.
///
/// See the [crate docs](crate) for the thread-safety contract.
pub struct Boundary<A: HostAllocator> {
    host: A,
    config: BoundaryConfig,
    /// Live handles and their requested sizes.
    live: IndexMap<Handle, usize>,
    /// Reserved on first use of a stack operation.
    stack: Option<ScratchStack>,
    stats: BoundaryStats,
}

impl<A: HostAllocator> Boundary<A> {
    /// Create a boundary with the default configuration.
    pub fn new(host: A) -> Self {
        Self {
            host,
            config: BoundaryConfig::default(),
            live: IndexMap::new(),
            stack: None,
            stats: BoundaryStats::default(),
        }
    }

    /// Create a boundary with a validated configuration.
    pub fn with_config(host: A, config: BoundaryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut boundary = Self::new(host);
        boundary.config = config;
        Ok(boundary)
    }

    /// The active configuration.
    pub fn config(&self) -> &BoundaryConfig {
        &self.config
    }

    /// The host allocator.
    pub fn host(&self) -> &A {
        &self.host
    }

    /// Replace both policies.
    ///
    /// Refused while any handle is live, so a handle is always released
    /// under the policy it was allocated under.
    pub fn set_policies(
        &mut self,
        zero_size: ZeroSizePolicy,
        invalid_free: InvalidFreePolicy,
    ) -> Result<(), BoundaryError> {
        if !self.live.is_empty() {
            return Err(BoundaryError::HandlesOutstanding {
                live: self.live.len(),
            });
        }
        self.config.zero_size = zero_size;
        self.config.invalid_free = invalid_free;
        Ok(())
    }

    // ── Allocation ─────────────────────────────────────────────────

    /// Allocate `size` bytes, returning [`Handle::NULL`] on failure.
    ///
    /// Never panics and never faults. `allocate(0)` follows the configured
    /// [`ZeroSizePolicy`].
    pub fn allocate(&mut self, size: usize) -> Handle {
        self.try_allocate(size).unwrap_or(Handle::NULL)
    }

    /// Allocate `size` bytes, reporting why a request failed.
    pub fn try_allocate(&mut self, size: usize) -> Result<Handle, BoundaryError> {
        let (request, recorded) = match (size, self.config.zero_size) {
            (0, ZeroSizePolicy::Null) => return Err(BoundaryError::ZeroSize),
            (0, ZeroSizePolicy::MinimalRegion) => (1, 0),
            (n, _) => (n, n),
        };

        let Some(addr) = self.host.allocate(request) else {
            self.stats.failed_allocations += 1;
            log::trace!("allocate({size}) refused by host");
            return Err(BoundaryError::AllocationFailed { requested: size });
        };

        let handle = Handle::from(addr);
        let previous = self.live.insert(handle, recorded);
        debug_assert!(
            previous.is_none(),
            "host allocator returned live address {handle}"
        );
        self.stats.allocations += 1;
        self.stats.live_bytes += recorded;
        self.stats.peak_live_bytes = self.stats.peak_live_bytes.max(self.stats.live_bytes);
        log::trace!("allocate({size}) -> {handle}");
        Ok(handle)
    }

    // ── Deallocation ───────────────────────────────────────────────

    /// Release `handle` back to the host allocator.
    ///
    /// A null, unknown, or already-released handle never reaches the host.
    /// Under [`InvalidFreePolicy::Fault`] it raises a fault (this call does
    /// not return); under [`InvalidFreePolicy::Report`] it is logged and
    /// counted.
    pub fn deallocate(&mut self, handle: Handle) {
        if let Err(error) = self.try_deallocate(handle) {
            match self.config.invalid_free {
                InvalidFreePolicy::Fault => {
                    fault::raise(FaultReason::InvalidDeallocation { error })
                }
                InvalidFreePolicy::Report => log::warn!("deallocate rejected: {error}"),
            }
        }
    }

    /// Release `handle`, returning the size it was allocated with.
    ///
    /// Rejections are counted but never fault.
    #[allow(unsafe_code)]
    pub fn try_deallocate(&mut self, handle: Handle) -> Result<usize, BoundaryError> {
        let checked = handle
            .addr()
            .ok_or(BoundaryError::NullHandle)
            .and_then(|addr| {
                self.live
                    .swap_remove(&handle)
                    .map(|size| (addr, size))
                    .ok_or(BoundaryError::UnknownHandle { handle })
            });
        let (addr, size) = match checked {
            Ok(found) => found,
            Err(error) => {
                self.stats.rejected_deallocations += 1;
                return Err(error);
            }
        };

        // SAFETY: `addr` was in the live index, so it came from
        // `self.host.allocate` and has not been released since; it has just
        // been removed so it cannot be released twice.
        unsafe { self.host.deallocate(addr) };
        self.stats.deallocations += 1;
        self.stats.live_bytes -= size;
        log::trace!("deallocate({handle}) released {size} bytes");
        Ok(size)
    }

    /// Release every live handle back to the host. Returns how many there
    /// were.
    #[allow(unsafe_code)]
    pub fn release_all(&mut self) -> usize {
        let count = self.live.len();
        for (handle, _) in self.live.drain(..) {
            if let Some(addr) = handle.addr() {
                // SAFETY: every live handle came from `self.host.allocate`
                // and is drained from the index exactly once.
                unsafe { self.host.deallocate(addr) };
            }
        }
        self.stats.deallocations += count as u64;
        self.stats.live_bytes = 0;
        count
    }

    // ── Introspection ──────────────────────────────────────────────

    /// Whether `handle` is currently live.
    pub fn is_live(&self, handle: Handle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Size `handle` was allocated with, if it is live.
    pub fn size_of(&self, handle: Handle) -> Option<usize> {
        self.live.get(&handle).copied()
    }

    /// Number of live handles.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Requested bytes across all live handles.
    pub fn live_bytes(&self) -> usize {
        self.stats.live_bytes
    }

    /// Snapshot of the boundary's counters.
    pub fn stats(&self) -> BoundaryStats {
        BoundaryStats {
            live_count: self.live.len(),
            ..self.stats
        }
    }

    // ── Scratch stack ──────────────────────────────────────────────

    fn scratch(&mut self) -> Result<&mut ScratchStack, BoundaryError> {
        let stack = match self.stack.take() {
            Some(stack) => stack,
            None => ScratchStack::reserve(&mut self.host, self.config.stack_size)?,
        };
        Ok(self.stack.insert(stack))
    }

    /// Current scratch stack pointer, reserving the stack on first use.
    pub fn stack_save(&mut self) -> Result<usize, BoundaryError> {
        Ok(self.scratch()?.save())
    }

    /// Push `size` bytes onto the scratch stack.
    pub fn stack_alloc(&mut self, size: usize) -> Result<usize, BoundaryError> {
        self.scratch()?
            .alloc(size)
            .ok_or(BoundaryError::AllocationFailed { requested: size })
    }

    /// Restore a saved scratch stack pointer.
    pub fn stack_restore(&mut self, pointer: usize) -> Result<(), BoundaryError> {
        self.scratch()?.restore(pointer)
    }

    /// Address the scratch stack starts from. The stack grows down, so this
    /// is its highest address ([`ScratchStack::top`]).
    pub fn stack_base(&mut self) -> Result<usize, BoundaryError> {
        Ok(self.scratch()?.top())
    }

    /// Lowest address the scratch stack may reach ([`ScratchStack::base`]).
    pub fn stack_end(&mut self) -> Result<usize, BoundaryError> {
        Ok(self.scratch()?.base())
    }

    /// Bytes left between the stack pointer and [`stack_end`](Self::stack_end).
    pub fn stack_free(&mut self) -> Result<usize, BoundaryError> {
        Ok(self.scratch()?.free())
    }
}

impl<A: HostAllocator> Drop for Boundary<A> {
    fn drop(&mut self) {
        let leaked = self.release_all();
        if leaked > 0 {
            log::warn!("boundary dropped with {leaked} live handle(s); released to host");
        }
        if let Some(stack) = self.stack.take() {
            stack.release(&mut self.host);
        }
    }
}
