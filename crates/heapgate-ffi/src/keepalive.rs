//! Keepalive table for the exported entry points.
//!
//! The loader resolves exports by symbol name after the build, so a stripped
//! symbol is a build-time defect that only shows up at load time.
//! `#[no_mangle]` / `#[export_name]` keep the symbols external; [`KEEPALIVE`]
//! additionally references every entry point from a `#[used]` static so that
//! LTO and dead-code elimination treat them as reachable.

use std::ffi::c_char;

use crate::exports::{allocate, configure, deallocate, fault, module_main, probe, try_deallocate};
use crate::last_fault_message;
use crate::runtime::{call_ctors, flush_output, stack_init};
use crate::stack::{
    stack_alloc, stack_get_base, stack_get_end, stack_get_free, stack_restore, stack_save,
};

/// Function pointers to every exported entry point.
pub struct Exports {
    /// `allocate(size) -> handle`
    pub allocate: extern "C" fn(usize) -> usize,
    /// `deallocate(handle)`
    pub deallocate: extern "C" fn(usize),
    /// `fault() -> !`
    pub fault: extern "C" fn() -> !,
    /// `probe() -> 42`
    pub probe: extern "C" fn() -> i32,
    /// Module entry point.
    pub module_main: extern "C" fn(i32, *const *const c_char) -> i32,
    /// `try_deallocate(handle) -> status`
    pub try_deallocate: extern "C" fn(usize) -> i32,
    /// `configure(zero_size_policy, invalid_free_policy) -> status`
    pub configure: extern "C" fn(i32, i32) -> i32,
    /// `stackSave() -> pointer`
    pub stack_save: extern "C" fn() -> usize,
    /// `stackRestore(pointer)`
    pub stack_restore: extern "C" fn(usize),
    /// `stackAlloc(size) -> pointer`
    pub stack_alloc: extern "C" fn(usize) -> usize,
    /// `emscripten_stack_get_base() -> pointer`
    pub stack_get_base: extern "C" fn() -> usize,
    /// `emscripten_stack_get_end() -> pointer`
    pub stack_get_end: extern "C" fn() -> usize,
    /// `emscripten_stack_get_free() -> bytes`
    pub stack_get_free: extern "C" fn() -> usize,
    /// `emscripten_stack_init()`
    pub stack_init: extern "C" fn(),
    /// `fflush(stream) -> 0`
    pub flush_output: extern "C" fn(usize) -> i32,
    /// Native constructor hook.
    pub call_ctors: extern "C" fn(),
    /// `last_fault_message(buf, cap) -> length`
    pub last_fault_message: extern "C" fn(*mut c_char, usize) -> i32,
}

/// Referenced-from-a-`#[used]`-static table of every export.
#[used]
pub static KEEPALIVE: Exports = Exports {
    allocate,
    deallocate,
    fault,
    probe,
    module_main,
    try_deallocate,
    configure,
    stack_save,
    stack_restore,
    stack_alloc,
    stack_get_base,
    stack_get_end,
    stack_get_free,
    stack_init,
    flush_output,
    call_ctors,
    last_fault_message,
};

/// Symbol of the module entry point.
#[cfg(target_arch = "wasm32")]
pub const ENTRY_POINT_NAME: &str = "main";
/// Symbol of the module entry point.
#[cfg(not(target_arch = "wasm32"))]
pub const ENTRY_POINT_NAME: &str = "module_main";

#[cfg(target_arch = "wasm32")]
const FLUSH_NAME: &str = "fflush";
#[cfg(not(target_arch = "wasm32"))]
const FLUSH_NAME: &str = "flush_output";

// On wasm32 the constructor hook is the linker's own, exported by build.rs.
#[cfg(target_arch = "wasm32")]
const CALL_CTORS_NAME: &str = "__wasm_call_ctors";
#[cfg(not(target_arch = "wasm32"))]
const CALL_CTORS_NAME: &str = "call_ctors";

/// Symbol names a loader can bind against on the current target.
pub const EXPORT_NAMES: &[&str] = &[
    "allocate",
    "deallocate",
    "fault",
    "probe",
    ENTRY_POINT_NAME,
    "try_deallocate",
    "configure",
    "stackSave",
    "stackRestore",
    "stackAlloc",
    "emscripten_stack_get_base",
    "emscripten_stack_get_end",
    "emscripten_stack_get_free",
    "emscripten_stack_init",
    FLUSH_NAME,
    CALL_CTORS_NAME,
    "last_fault_message",
];
