//! C and wasm ABI exports for the heapgate allocation boundary.
//!
//! A foreign loader binds these entry points by symbol name after the build,
//! so every one is `#[no_mangle]` and also referenced from the `#[used]`
//! [`KEEPALIVE`](keepalive::KEEPALIVE) table so no optimisation pass can
//! strip it. This crate is one of two that may contain `unsafe` code (along
//! with `heapgate-core`).
//!
//! All exports share one process-wide [`Boundary`](heapgate_core::Boundary)
//! over the [`SystemAllocator`](heapgate_core::SystemAllocator), guarded by
//! a `Mutex`.
//!
//! # Failure model
//!
//! - Recoverable failures travel as return values: a `0` handle or a
//!   negative [`HeapgateStatus`].
//! - Ordinary panics are contained by `ffi_guard!`; the message is kept for
//!   [`last_fault_message`].
//! - A fault never returns to the caller: the process aborts (a trap on
//!   wasm).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::any::Any;
use std::ffi::c_char;

use heapgate_core::fault as faults;

/// Run `$body` under `catch_unwind`, returning `$fallback` if it panics.
///
/// A [`Fault`](heapgate_core::Fault) payload is not contained: it aborts.
macro_rules! ffi_guard_or {
    ($fallback:expr, $body:block) => {
        match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| $body)) {
            Ok(value) => value,
            Err(payload) => $crate::contain_panic(payload, $fallback),
        }
    };
}

/// [`ffi_guard_or!`] for status-returning exports.
macro_rules! ffi_guard {
    ($body:block) => {
        ffi_guard_or!($crate::status::HeapgateStatus::Panicked as i32, $body)
    };
}

/// Lock a global, returning `$fallback` from the enclosing guard body if the
/// mutex is poisoned.
macro_rules! ffi_lock {
    ($mutex:expr) => {
        ffi_lock!($mutex, $crate::status::HeapgateStatus::InternalError as i32)
    };
    ($mutex:expr, $fallback:expr) => {
        match $mutex.lock() {
            Ok(guard) => guard,
            Err(_) => return $fallback,
        }
    };
}

pub mod exports;
pub mod keepalive;
pub mod runtime;
pub mod stack;
pub mod status;

pub use exports::{allocate, configure, deallocate, fault, module_main, probe, try_deallocate};
pub use keepalive::{ENTRY_POINT_NAME, EXPORT_NAMES, KEEPALIVE};
pub use runtime::{call_ctors, flush_output, stack_init};
pub use stack::{
    stack_alloc, stack_get_base, stack_get_end, stack_get_free, stack_restore, stack_save,
};
pub use status::HeapgateStatus;

/// Handle a panic caught at the boundary.
///
/// Faults abort the process. Anything else is logged, recorded for
/// [`last_fault_message`], and replaced by `fallback`.
pub(crate) fn contain_panic<T>(payload: Box<dyn Any + Send>, fallback: T) -> T {
    if faults::from_payload(payload.as_ref()).is_some() {
        std::process::abort();
    }
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_owned());
    log::error!("panic contained at ffi boundary: {message}");
    faults::record_message(&message);
    fallback
}

/// Copy the last fault or contained-panic message on this thread into `buf`.
///
/// Returns the full message length in bytes (0 if none). If `buf` is
/// non-null and `cap > 0`, writes at most `cap - 1` bytes followed by a NUL.
/// Pass a null `buf` to query the length.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn last_fault_message(buf: *mut c_char, cap: usize) -> i32 {
    let message = faults::last_fault_message();
    let bytes = message.as_bytes();
    if !buf.is_null() && cap > 0 {
        let n = bytes.len().min(cap - 1);
        // SAFETY: caller guarantees `buf` is valid for `cap` bytes and
        // `n + 1 <= cap`.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf.cast::<u8>(), n);
            *buf.add(n) = 0;
        }
    }
    i32::try_from(bytes.len()).unwrap_or(i32::MAX)
}
