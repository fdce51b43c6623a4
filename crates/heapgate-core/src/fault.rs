//! The unrecoverable-error primitive.
//!
//! [`raise`] never returns. It logs, records the message for later
//! retrieval, and unwinds with a [`Fault`] payload. Inside Rust a test
//! harness can intercept that with `catch_unwind` and downcast the payload;
//! at the exported ABI the unwind is turned into a process abort (a trap on
//! wasm), so a foreign caller never regains control.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic;

use crate::error::BoundaryError;

thread_local! {
    /// Message of the most recent fault or contained panic on this thread.
    static LAST_FAULT: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Why a fault was raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FaultReason {
    /// The foreign caller asked to give up.
    Requested,
    /// `deallocate` received a handle that is not live.
    InvalidDeallocation {
        /// The validation failure.
        error: BoundaryError,
    },
    /// `stack_restore` received a pointer outside the scratch stack.
    InvalidStackRestore {
        /// The rejected pointer.
        pointer: usize,
    },
}

/// Panic payload carried by a raised fault.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    /// Why the fault was raised.
    pub reason: FaultReason,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            FaultReason::Requested => write!(f, "fault requested by caller"),
            FaultReason::InvalidDeallocation { error } => {
                write!(f, "invalid deallocation: {error}")
            }
            FaultReason::InvalidStackRestore { pointer } => {
                write!(f, "invalid stack restore to {pointer:#x}")
            }
        }
    }
}

/// Raise a fault. Never returns.
pub fn raise(reason: FaultReason) -> ! {
    let fault = Fault { reason };
    let message = fault.to_string();
    log::error!("{message}");
    record_message(&message);
    panic::panic_any(fault)
}

/// Extract a [`Fault`] from a caught panic payload, if that is what it is.
pub fn from_payload(payload: &(dyn Any + Send)) -> Option<&Fault> {
    payload.downcast_ref::<Fault>()
}

/// Store `message` as this thread's last fault message.
pub fn record_message(message: &str) {
    LAST_FAULT.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.clear();
        slot.push_str(message);
    });
}

/// This thread's last fault message; empty if none was recorded.
pub fn last_fault_message() -> String {
    LAST_FAULT.with(|cell| cell.borrow().clone())
}

/// Forget this thread's last fault message.
pub fn clear_last_fault() {
    LAST_FAULT.with(|cell| cell.borrow_mut().clear());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::Handle;

    #[test]
    fn raise_unwinds_with_fault_payload() {
        clear_last_fault();
        let result = panic::catch_unwind(|| raise(FaultReason::Requested));
        let payload = result.expect_err("raise must not return");
        let fault = from_payload(payload.as_ref()).expect("payload is a Fault");
        assert_eq!(fault.reason, FaultReason::Requested);
    }

    #[test]
    fn raise_records_message() {
        clear_last_fault();
        let reason = FaultReason::InvalidDeallocation {
            error: BoundaryError::UnknownHandle { handle: Handle(0x20) },
        };
        let _ = panic::catch_unwind(|| raise(reason));
        assert_eq!(
            last_fault_message(),
            "invalid deallocation: handle 0x20 is not live"
        );
    }

    #[test]
    fn foreign_panic_is_not_a_fault() {
        let payload = panic::catch_unwind(|| panic!("ordinary")).unwrap_err();
        assert!(from_payload(payload.as_ref()).is_none());
    }

    #[test]
    fn clear_empties_the_slot() {
        record_message("something");
        clear_last_fault();
        assert!(last_fault_message().is_empty());
    }
}
