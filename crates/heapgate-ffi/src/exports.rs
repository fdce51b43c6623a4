//! Allocation entry points: `allocate`, `deallocate`, `fault`, `probe`, the
//! module entry point, and the status-returning variants.
//!
//! Handles cross the ABI as pointer-width integers: `u32` on wasm32, where a
//! handle is an offset into linear memory, and `u64` on 64-bit hosts.

use std::ffi::c_char;
use std::panic;
use std::process;
use std::sync::{LazyLock, Mutex};

use heapgate_core::fault::FaultReason;
use heapgate_core::{Boundary, Handle, InvalidFreePolicy, SystemAllocator, ZeroSizePolicy};

use crate::status::HeapgateStatus;

type GlobalBoundary = Boundary<SystemAllocator>;

static BOUNDARY: LazyLock<Mutex<GlobalBoundary>> =
    LazyLock::new(|| Mutex::new(Boundary::new(SystemAllocator::new())));

pub(crate) fn boundary() -> &'static Mutex<GlobalBoundary> {
    &BOUNDARY
}

// ── FFI functions ───────────────────────────────────────────────

/// Allocate `size` bytes. Returns the handle, or 0 on failure.
///
/// `allocate(0)` follows the configured zero-size policy (0 by default).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn allocate(size: usize) -> usize {
    ffi_guard_or!(0, { ffi_lock!(BOUNDARY, 0).allocate(size).raw() })
}

/// Release a handle returned by [`allocate`].
///
/// With the default policy a null, unknown, or already-released handle
/// faults and this call does not return.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn deallocate(handle: usize) {
    ffi_guard_or!((), { ffi_lock!(BOUNDARY, ()).deallocate(Handle(handle)) })
}

/// Release a handle, reporting invalid handles as a status instead of
/// faulting.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn try_deallocate(handle: usize) -> i32 {
    ffi_guard!({
        match ffi_lock!(BOUNDARY).try_deallocate(Handle(handle)) {
            Ok(_) => HeapgateStatus::Ok as i32,
            Err(e) => HeapgateStatus::from(&e) as i32,
        }
    })
}

/// Terminate unconditionally. Never returns.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn fault() -> ! {
    let outcome = panic::catch_unwind(|| {
        heapgate_core::fault::raise(FaultReason::Requested);
    });
    drop(outcome);
    process::abort()
}

/// Link check. Always returns 42.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn probe() -> i32 {
    heapgate_core::probe()
}

/// Module entry point required by the host toolchain. Does no work.
///
/// Exported as `main` on wasm32, where the loader looks for it.
#[cfg_attr(target_arch = "wasm32", export_name = "main")]
#[cfg_attr(not(target_arch = "wasm32"), no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn module_main(_argc: i32, _argv: *const *const c_char) -> i32 {
    HeapgateStatus::Ok as i32
}

/// Select the zero-size and invalid-free policies by their `i32` codes.
///
/// Returns `InvalidArgument` for an unknown code and `HandlesOutstanding`
/// while any handle is live.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn configure(zero_size_policy: i32, invalid_free_policy: i32) -> i32 {
    ffi_guard!({
        let policies = ZeroSizePolicy::try_from(zero_size_policy).and_then(|zero_size| {
            InvalidFreePolicy::try_from(invalid_free_policy).map(|invalid| (zero_size, invalid))
        });
        let (zero_size, invalid_free) = match policies {
            Ok(p) => p,
            Err(e) => {
                log::warn!("configure rejected: {e}");
                return HeapgateStatus::InvalidArgument as i32;
            }
        };
        match ffi_lock!(BOUNDARY).set_policies(zero_size, invalid_free) {
            Ok(()) => HeapgateStatus::Ok as i32,
            Err(e) => HeapgateStatus::from(&e) as i32,
        }
    })
}
