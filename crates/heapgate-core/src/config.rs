//! Boundary configuration, policies, and validation.
//!
//! The zero-size and invalid-free behaviours are policy choices rather than
//! fixed semantics. [`BoundaryConfig`] makes both explicit, and each policy
//! has a stable `i32` code (decoded with `TryFrom<i32>`) so a foreign caller
//! can select it through the `configure` export.

use std::error::Error;
use std::fmt;

// ── Policies ───────────────────────────────────────────────────────

/// What `allocate(0)` returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum ZeroSizePolicy {
    /// Always return the null handle; the host allocator is not called.
    #[default]
    Null = 0,
    /// Reserve a 1-byte region and return a unique handle that must be
    /// deallocated like any other but must not be dereferenced.
    MinimalRegion = 1,
}

impl TryFrom<i32> for ZeroSizePolicy {
    type Error = ConfigError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Null),
            1 => Ok(Self::MinimalRegion),
            _ => Err(ConfigError::UnknownPolicyCode {
                policy: "zero-size",
                code,
            }),
        }
    }
}

/// What `deallocate` does with a null, unknown, or already-released handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(i32)]
pub enum InvalidFreePolicy {
    /// Raise a fault. The caller's state is assumed corrupt.
    #[default]
    Fault = 0,
    /// Log a warning, count the rejection, and return normally.
    Report = 1,
}

impl TryFrom<i32> for InvalidFreePolicy {
    type Error = ConfigError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Fault),
            1 => Ok(Self::Report),
            _ => Err(ConfigError::UnknownPolicyCode {
                policy: "invalid-free",
                code,
            }),
        }
    }
}

// ── BoundaryConfig ─────────────────────────────────────────────────

/// Configuration for a [`Boundary`](crate::Boundary).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundaryConfig {
    /// Zero-size allocation policy. Default: [`ZeroSizePolicy::Null`].
    pub zero_size: ZeroSizePolicy,
    /// Invalid deallocation policy. Default: [`InvalidFreePolicy::Fault`].
    pub invalid_free: InvalidFreePolicy,
    /// Size of the scratch stack in bytes. Default: 64 KiB.
    /// Must be a non-zero multiple of [`STACK_ALIGN`](crate::scratch::STACK_ALIGN).
    pub stack_size: usize,
}

impl BoundaryConfig {
    /// Default scratch stack size.
    pub const DEFAULT_STACK_SIZE: usize = 64 * 1024;

    /// Set the zero-size policy.
    pub fn with_zero_size(mut self, policy: ZeroSizePolicy) -> Self {
        self.zero_size = policy;
        self
    }

    /// Set the invalid-free policy.
    pub fn with_invalid_free(mut self, policy: InvalidFreePolicy) -> Self {
        self.invalid_free = policy;
        self
    }

    /// Set the scratch stack size.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let align = crate::scratch::STACK_ALIGN;
        if self.stack_size == 0 || self.stack_size % align != 0 {
            return Err(ConfigError::InvalidStackSize {
                configured: self.stack_size,
            });
        }
        Ok(())
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            zero_size: ZeroSizePolicy::default(),
            invalid_free: InvalidFreePolicy::default(),
            stack_size: Self::DEFAULT_STACK_SIZE,
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`BoundaryConfig::validate()`] or policy decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Stack size is zero or not a multiple of the stack alignment.
    InvalidStackSize {
        /// The configured size.
        configured: usize,
    },
    /// A policy code does not name a known policy.
    UnknownPolicyCode {
        /// Which policy was being decoded.
        policy: &'static str,
        /// The rejected code.
        code: i32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStackSize { configured } => write!(
                f,
                "stack size {configured} must be a non-zero multiple of {}",
                crate::scratch::STACK_ALIGN
            ),
            Self::UnknownPolicyCode { policy, code } => {
                write!(f, "unknown {policy} policy code {code}")
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_null_and_fault() {
        let config = BoundaryConfig::default();
        assert_eq!(config.zero_size, ZeroSizePolicy::Null);
        assert_eq!(config.invalid_free, InvalidFreePolicy::Fault);
        assert_eq!(config.stack_size, 64 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn builder_setters_apply() {
        let config = BoundaryConfig::default()
            .with_zero_size(ZeroSizePolicy::MinimalRegion)
            .with_invalid_free(InvalidFreePolicy::Report)
            .with_stack_size(256);
        assert_eq!(config.zero_size, ZeroSizePolicy::MinimalRegion);
        assert_eq!(config.invalid_free, InvalidFreePolicy::Report);
        assert_eq!(config.stack_size, 256);
    }

    #[test]
    fn stack_size_must_be_aligned_and_non_zero() {
        for bad in [0, 1, 15, 17, 100] {
            let config = BoundaryConfig::default().with_stack_size(bad);
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidStackSize { configured: bad })
            );
        }
        assert!(BoundaryConfig::default().with_stack_size(32).validate().is_ok());
    }

    #[test]
    fn policy_codes_are_stable() {
        assert_eq!(ZeroSizePolicy::try_from(0), Ok(ZeroSizePolicy::Null));
        assert_eq!(ZeroSizePolicy::try_from(1), Ok(ZeroSizePolicy::MinimalRegion));
        assert_eq!(InvalidFreePolicy::try_from(0), Ok(InvalidFreePolicy::Fault));
        assert_eq!(InvalidFreePolicy::try_from(1), Ok(InvalidFreePolicy::Report));
    }

    #[test]
    fn unknown_policy_code_is_rejected() {
        assert_eq!(
            ZeroSizePolicy::try_from(2),
            Err(ConfigError::UnknownPolicyCode {
                policy: "zero-size",
                code: 2
            })
        );
        let err = InvalidFreePolicy::try_from(-1).unwrap_err();
        assert_eq!(err.to_string(), "unknown invalid-free policy code -1");
    }
}
