//! Recoverable access faults
//!
//! Every rejected transition surfaces as a [`BorrowError`] at the call site.
//! Registry corruption (double registration, exhausted capacity) is not an
//! error value: those are caller protocol violations and panic.

use miette::Diagnostic;
use rtborrow_registry::{Addr, BorrowState, Registry};
use thiserror::Error;

/// Alias for results of handle operations
pub type BorrowResult<T> = std::result::Result<T, BorrowError>;

/// Coarse classification of a [`BorrowError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The requested access would break "one exclusive or many shared"
    AliasingViolation,
    /// The handle no longer owns its value
    Ownership,
    /// The handle has been moved from
    Empty,
}

// ============================================================================
// Aliasing violations (E0001-E0099)
// ============================================================================

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum BorrowError {
    #[error("cannot borrow {addr} as shared, already exclusively borrowed")]
    #[diagnostic(
        code(rtborrow_E0001),
        help("the value is {state}; drop the conflicting handle before sharing it")
    )]
    SharedWhileExclusive { addr: Addr, state: BorrowState },

    #[error("cannot borrow {addr} as mutable more than once, already borrowed")]
    #[diagnostic(
        code(rtborrow_E0002),
        help("the value is {state} with {shared} shared handle(s) live")
    )]
    MutableWhileBorrowed {
        addr: Addr,
        state: BorrowState,
        shared: usize,
    },

    #[error("cannot move {addr} while it is borrowed")]
    #[diagnostic(
        code(rtborrow_E0003),
        help("the value is {state} with {shared} shared handle(s) live")
    )]
    MoveWhileBorrowed {
        addr: Addr,
        state: BorrowState,
        shared: usize,
    },

    #[error("setting owned of borrowed data at {addr}")]
    #[diagnostic(
        code(rtborrow_E0004),
        help("the value is {state} with {shared} shared handle(s) live")
    )]
    ClaimWhileBorrowed {
        addr: Addr,
        state: BorrowState,
        shared: usize,
    },

    #[error("borrow of already borrowed data at {addr}")]
    #[diagnostic(
        code(rtborrow_E0005),
        help("ownership can only be handed off while the value is untracked, but it is {state} with {shared} shared handle(s)")
    )]
    HandOffWhileBorrowed {
        addr: Addr,
        state: BorrowState,
        shared: usize,
    },

    #[error("cannot read {addr} while it is mutably borrowed")]
    #[diagnostic(code(rtborrow_E0006), help("drop the exclusive handle first"))]
    ReadWhileExclusive { addr: Addr },

    #[error("cannot mutate {addr} while it is borrowed")]
    #[diagnostic(
        code(rtborrow_E0007),
        help("the value is {state} with {shared} shared handle(s) live")
    )]
    WriteWhileBorrowed {
        addr: Addr,
        state: BorrowState,
        shared: usize,
    },

    // ========================================================================
    // Ownership and empty handles (E0101-E0199)
    // ========================================================================
    #[error("value already has an owner")]
    #[diagnostic(
        code(rtborrow_E0101),
        help("this handle was moved from and no longer owns anything")
    )]
    NotOwner,

    #[error("{handle} is empty")]
    #[diagnostic(code(rtborrow_E0102), help("the handle was moved from"))]
    Empty { handle: &'static str },
}

impl BorrowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BorrowError::SharedWhileExclusive { .. }
            | BorrowError::MutableWhileBorrowed { .. }
            | BorrowError::MoveWhileBorrowed { .. }
            | BorrowError::ClaimWhileBorrowed { .. }
            | BorrowError::HandOffWhileBorrowed { .. }
            | BorrowError::ReadWhileExclusive { .. }
            | BorrowError::WriteWhileBorrowed { .. } => ErrorKind::AliasingViolation,
            BorrowError::NotOwner => ErrorKind::Ownership,
            BorrowError::Empty { .. } => ErrorKind::Empty,
        }
    }

    pub fn is_aliasing_violation(&self) -> bool {
        self.kind() == ErrorKind::AliasingViolation
    }

    /// Address the fault was raised for, if any
    pub fn addr(&self) -> Option<Addr> {
        match self {
            BorrowError::SharedWhileExclusive { addr, .. }
            | BorrowError::MutableWhileBorrowed { addr, .. }
            | BorrowError::MoveWhileBorrowed { addr, .. }
            | BorrowError::ClaimWhileBorrowed { addr, .. }
            | BorrowError::HandOffWhileBorrowed { addr, .. }
            | BorrowError::ReadWhileExclusive { addr }
            | BorrowError::WriteWhileBorrowed { addr, .. } => Some(*addr),
            BorrowError::NotOwner | BorrowError::Empty { .. } => None,
        }
    }

    pub(crate) fn mutable_while_borrowed(registry: &dyn Registry, addr: Addr) -> Self {
        let slot = registry.slot(addr);
        BorrowError::MutableWhileBorrowed {
            addr,
            state: slot.state,
            shared: slot.shared,
        }
    }

    pub(crate) fn move_while_borrowed(registry: &dyn Registry, addr: Addr) -> Self {
        let slot = registry.slot(addr);
        BorrowError::MoveWhileBorrowed {
            addr,
            state: slot.state,
            shared: slot.shared,
        }
    }

    pub(crate) fn claim_while_borrowed(registry: &dyn Registry, addr: Addr) -> Self {
        let slot = registry.slot(addr);
        BorrowError::ClaimWhileBorrowed {
            addr,
            state: slot.state,
            shared: slot.shared,
        }
    }

    pub(crate) fn hand_off_while_borrowed(registry: &dyn Registry, addr: Addr) -> Self {
        let slot = registry.slot(addr);
        BorrowError::HandOffWhileBorrowed {
            addr,
            state: slot.state,
            shared: slot.shared,
        }
    }

    pub(crate) fn write_while_borrowed(registry: &dyn Registry, addr: Addr) -> Self {
        let slot = registry.slot(addr);
        BorrowError::WriteWhileBorrowed {
            addr,
            state: slot.state,
            shared: slot.shared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtborrow_registry::HashRegistry;

    const ADDR: Addr = Addr::from_raw(0x40);

    #[test]
    fn test_error_kinds() {
        let err = BorrowError::SharedWhileExclusive {
            addr: ADDR,
            state: BorrowState::MutableBorrowed,
        };
        assert_eq!(err.kind(), ErrorKind::AliasingViolation);
        assert!(err.is_aliasing_violation());
        assert_eq!(err.addr(), Some(ADDR));

        assert_eq!(BorrowError::NotOwner.kind(), ErrorKind::Ownership);
        assert_eq!(BorrowError::Empty { handle: "Ref" }.kind(), ErrorKind::Empty);
        assert_eq!(BorrowError::Empty { handle: "Ref" }.addr(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = BorrowError::MutableWhileBorrowed {
            addr: ADDR,
            state: BorrowState::Valid,
            shared: 2,
        };
        assert_eq!(
            err.to_string(),
            "cannot borrow 0x40 as mutable more than once, already borrowed"
        );
        assert_eq!(BorrowError::Empty { handle: "Ref" }.to_string(), "Ref is empty");
        assert_eq!(BorrowError::NotOwner.to_string(), "value already has an owner");
    }

    #[test]
    fn test_diagnostic_code_and_help() {
        let err = BorrowError::ClaimWhileBorrowed {
            addr: ADDR,
            state: BorrowState::Valid,
            shared: 1,
        };
        assert_eq!(err.code().map(|c| c.to_string()), Some("rtborrow_E0004".to_string()));
        let help = err.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("1 shared handle(s)"));
    }

    #[test]
    fn test_constructor_reads_slot() {
        let registry = HashRegistry::new();
        registry.retain_shared(ADDR);
        registry.retain_shared(ADDR);
        let err = BorrowError::mutable_while_borrowed(&registry, ADDR);
        assert_eq!(
            err,
            BorrowError::MutableWhileBorrowed {
                addr: ADDR,
                state: BorrowState::Valid,
                shared: 2,
            }
        );
    }
}
