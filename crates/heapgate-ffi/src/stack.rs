//! Scratch-stack entry points.
//!
//! Exported under the names an emscripten-style loader binds:
//! `stackSave`, `stackRestore`, `stackAlloc`, and the
//! `emscripten_stack_get_*` bounds queries. The stack is reserved from the
//! global boundary's host allocator on first use. Pointers are 16-byte
//! aligned and the stack grows down.

use heapgate_core::fault::FaultReason;

use crate::exports::boundary;

/// Current scratch stack pointer, or 0 if the stack could not be reserved.
#[export_name = "stackSave"]
#[allow(unsafe_code)]
pub extern "C" fn stack_save() -> usize {
    ffi_guard_or!(0, { ffi_lock!(boundary(), 0).stack_save().unwrap_or(0) })
}

/// Push `size` bytes and return the new stack pointer, or 0 if the stack is
/// exhausted.
#[export_name = "stackAlloc"]
#[allow(unsafe_code)]
pub extern "C" fn stack_alloc(size: usize) -> usize {
    ffi_guard_or!(0, { ffi_lock!(boundary(), 0).stack_alloc(size).unwrap_or(0) })
}

/// Restore a pointer previously returned by [`stack_save`] or
/// [`stack_alloc`].
///
/// A pointer outside the stack or not 16-byte aligned faults.
#[export_name = "stackRestore"]
#[allow(unsafe_code)]
pub extern "C" fn stack_restore(pointer: usize) {
    ffi_guard_or!((), {
        let restored = ffi_lock!(boundary(), ()).stack_restore(pointer);
        if restored.is_err() {
            heapgate_core::fault::raise(FaultReason::InvalidStackRestore { pointer });
        }
    })
}

/// Highest stack address, where the stack starts. 0 if unavailable.
#[export_name = "emscripten_stack_get_base"]
#[allow(unsafe_code)]
pub extern "C" fn stack_get_base() -> usize {
    ffi_guard_or!(0, { ffi_lock!(boundary(), 0).stack_base().unwrap_or(0) })
}

/// Lowest address the stack may grow to. 0 if unavailable.
#[export_name = "emscripten_stack_get_end"]
#[allow(unsafe_code)]
pub extern "C" fn stack_get_end() -> usize {
    ffi_guard_or!(0, { ffi_lock!(boundary(), 0).stack_end().unwrap_or(0) })
}

/// Bytes left below the current stack pointer. 0 if unavailable.
#[export_name = "emscripten_stack_get_free"]
#[allow(unsafe_code)]
pub extern "C" fn stack_get_free() -> usize {
    ffi_guard_or!(0, { ffi_lock!(boundary(), 0).stack_free().unwrap_or(0) })
}
