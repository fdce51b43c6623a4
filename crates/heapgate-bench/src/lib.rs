//! Benchmark workloads for the heapgate allocation boundary.
//!
//! - [`system_boundary`]: boundary over the system allocator, tolerant
//!   invalid-free policy so rejection paths can be timed
//! - [`workload_sizes`]: deterministic mixed request sizes
//! - [`churn`]: allocate a batch, then release it in reverse

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use heapgate_core::{
    Boundary, BoundaryConfig, Handle, HostAllocator, InvalidFreePolicy, SystemAllocator,
};

/// Size classes cycled through by [`workload_sizes`].
const SIZE_CLASSES: [usize; 8] = [8, 16, 24, 64, 100, 256, 1000, 4096];

/// Boundary over the system allocator that reports invalid frees instead
/// of faulting.
pub fn system_boundary() -> Boundary<SystemAllocator> {
    let config = BoundaryConfig::default().with_invalid_free(InvalidFreePolicy::Report);
    match Boundary::with_config(SystemAllocator::new(), config) {
        Ok(boundary) => boundary,
        Err(e) => panic!("benchmark config rejected: {e}"),
    }
}

/// `count` request sizes drawn round-robin from a fixed set of classes,
/// offset by `seed` so different runs interleave differently.
pub fn workload_sizes(count: usize, seed: usize) -> Vec<usize> {
    (0..count)
        .map(|i| SIZE_CLASSES[(i + seed) % SIZE_CLASSES.len()])
        .collect()
}

/// Allocate every size in `sizes`, then release the handles in reverse.
///
/// Returns the number of handles that were issued.
pub fn churn<A: HostAllocator>(boundary: &mut Boundary<A>, sizes: &[usize]) -> usize {
    let handles: Vec<Handle> = sizes.iter().map(|&size| boundary.allocate(size)).collect();
    let issued = handles.iter().filter(|h| !h.is_null()).count();
    for handle in handles.into_iter().rev().filter(|h| !h.is_null()) {
        boundary.deallocate(handle);
    }
    issued
}
