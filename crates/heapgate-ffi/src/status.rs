//! C-compatible status codes.
//!
//! [`HeapgateStatus`] is a `repr(i32)` enum returned by the status-returning
//! exports. Conversions from [`BoundaryError`] are provided.

use heapgate_core::BoundaryError;

/// C-compatible status code.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapgateStatus {
    /// Success.
    Ok = 0,
    /// The null handle was passed where a live handle is required.
    NullHandle = -1,
    /// The handle is not live: never allocated, or already released.
    UnknownHandle = -2,
    /// The host allocator could not satisfy a request.
    AllocationFailed = -3,
    /// An argument is out of range or names no known policy.
    InvalidArgument = -4,
    /// The operation requires that no handles are live.
    HandlesOutstanding = -5,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -6,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&BoundaryError> for HeapgateStatus {
    fn from(e: &BoundaryError) -> Self {
        match e {
            BoundaryError::ZeroSize => HeapgateStatus::InvalidArgument,
            BoundaryError::AllocationFailed { .. } => HeapgateStatus::AllocationFailed,
            BoundaryError::NullHandle => HeapgateStatus::NullHandle,
            BoundaryError::UnknownHandle { .. } => HeapgateStatus::UnknownHandle,
            BoundaryError::InvalidStackPointer { .. } => HeapgateStatus::InvalidArgument,
            BoundaryError::HandlesOutstanding { .. } => HeapgateStatus::HandlesOutstanding,
        }
    }
}
