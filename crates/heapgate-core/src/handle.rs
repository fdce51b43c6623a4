//! Handles naming regions in linear memory.
//!
//! A [`Handle`] is the integer the foreign caller sees: the address of a
//! region, pointer-width so it is `u32` on wasm32 and `u64` on 64-bit hosts.
//! It carries no identity beyond its value.

use std::fmt;
use std::num::NonZeroUsize;

/// Opaque address of an allocated region.
///
/// `Handle::NULL` is reserved for "no allocation" and is never live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle(pub usize);

impl Handle {
    /// The failure sentinel.
    pub const NULL: Handle = Handle(0);

    /// Raw integer value as passed across the ABI.
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Whether this is the failure sentinel.
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// The address as a `NonZeroUsize`, or `None` for the sentinel.
    pub const fn addr(self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.0)
    }
}

impl From<NonZeroUsize> for Handle {
    fn from(addr: NonZeroUsize) -> Self {
        Handle(addr.get())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
