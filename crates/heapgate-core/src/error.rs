//! Boundary error types.

use std::error::Error;
use std::fmt;

use crate::handle::Handle;

/// Errors reported by [`Boundary`](crate::Boundary) and
/// [`ScratchStack`](crate::ScratchStack) operations.
///
/// All of these are recoverable from the caller's point of view; whether an
/// invalid deallocation becomes a fault is decided by
/// [`InvalidFreePolicy`](crate::InvalidFreePolicy).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryError {
    /// A zero-byte request under [`ZeroSizePolicy::Null`](crate::ZeroSizePolicy::Null).
    ZeroSize,
    /// The host allocator could not satisfy the request.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
    /// Deallocation of the null handle.
    NullHandle,
    /// Deallocation of a handle that is not live: never returned by
    /// `allocate`, or already released.
    UnknownHandle {
        /// The rejected handle.
        handle: Handle,
    },
    /// A scratch-stack pointer that is misaligned or outside the stack.
    InvalidStackPointer {
        /// The rejected pointer.
        pointer: usize,
    },
    /// An operation that requires no live handles found some.
    HandlesOutstanding {
        /// Number of live handles.
        live: usize,
    },
}

impl fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => write!(f, "zero-size allocation refused"),
            Self::AllocationFailed { requested } => {
                write!(f, "host allocator could not provide {requested} bytes")
            }
            Self::NullHandle => write!(f, "null handle"),
            Self::UnknownHandle { handle } => {
                write!(f, "handle {handle} is not live")
            }
            Self::InvalidStackPointer { pointer } => {
                write!(f, "stack pointer {pointer:#x} is outside the scratch stack or misaligned")
            }
            Self::HandlesOutstanding { live } => {
                write!(f, "{live} handle(s) still live")
            }
        }
    }
}

impl Error for BoundaryError {}
