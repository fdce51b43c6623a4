//! Validated allocation boundary for foreign callers.
//!
//! A loaded module (a wasm guest, a sandboxed VM, a C host) reaches heap
//! allocation through a handful of entry points. This crate holds the
//! semantics behind those entry points; `heapgate-ffi` exports them.
//!
//! # Architecture
//!
//! ```text
//! Boundary<A: HostAllocator>
//! ├── A (injected host allocator: SystemAllocator, BoundedAllocator, mocks)
//! ├── live index (IndexMap<Handle, size>, checked on every deallocate)
//! ├── BoundaryConfig (zero-size policy, invalid-free policy, stack size)
//! └── BoundaryStats
//!
//! ScratchStack (16-byte-aligned, downward-growing, reserved from a host)
//! fault::raise (unwinds with a Fault payload; the ABI turns it into abort)
//! ```
//!
//! # Thread safety
//!
//! [`Boundary`] takes `&mut self` for every mutating operation and adds no
//! synchronization of its own. Concurrent `allocate`/`deallocate` against
//! one host allocator instance is only safe if the owner serializes access
//! (the FFI crate uses a `Mutex`) and the host allocator itself tolerates it.
//!
//! This crate is the only one besides `heapgate-ffi` that may contain
//! `unsafe` code, confined to [`host`] and the boundary's release path.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod bounded;
pub mod boundary;
pub mod config;
pub mod error;
pub mod fault;
pub mod handle;
pub mod host;
pub mod scratch;

pub use bounded::BoundedAllocator;
pub use boundary::{probe, Boundary, BoundaryStats, PROBE_VALUE};
pub use config::{BoundaryConfig, ConfigError, InvalidFreePolicy, ZeroSizePolicy};
pub use error::BoundaryError;
pub use fault::{Fault, FaultReason};
pub use handle::Handle;
pub use host::{HostAllocator, SystemAllocator};
pub use scratch::ScratchStack;
