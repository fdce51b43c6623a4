//! Runtime hooks a loader expects to find but that have nothing to do here.
//!
//! An emscripten-style loader calls `emscripten_stack_init` and `fflush`
//! unconditionally. The scratch stack is reserved lazily and nothing is
//! buffered, so both return at once.
//!
//! `__wasm_call_ctors` is synthesized by the wasm linker; `build.rs` exports
//! it on wasm32. [`call_ctors`] is the native stand-in.

/// Stack setup hook. The scratch stack is reserved on first use instead.
#[export_name = "emscripten_stack_init"]
#[allow(unsafe_code)]
pub extern "C" fn stack_init() {}

/// Stream flush hook. Nothing is buffered; always returns 0.
#[cfg_attr(target_arch = "wasm32", export_name = "fflush")]
#[cfg_attr(not(target_arch = "wasm32"), no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn flush_output(_stream: usize) -> i32 {
    0
}

/// Static constructor hook for native loaders. No constructors to run.
#[cfg_attr(not(target_arch = "wasm32"), no_mangle)]
#[allow(unsafe_code)]
pub extern "C" fn call_ctors() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::{stack_get_base, stack_get_end};

    #[test]
    fn hooks_are_inert() {
        stack_init();
        call_ctors();
        assert_eq!(flush_output(0), 0);
        assert_eq!(flush_output(0x1000), 0);
    }

    #[test]
    fn stack_init_leaves_stack_usable() {
        stack_init();
        assert!(stack_get_base() > stack_get_end());
    }
}
