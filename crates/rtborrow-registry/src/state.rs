use std::fmt;

/// Access state recorded for an address
///
/// Absence of an entry in a registry reads as [`BorrowState::Valid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorrowState {
    /// No exclusive alias recorded. Shared handles keep this state.
    #[default]
    Valid,
    /// Reserved marker for a consumed address. No handle produces it.
    Invalid,
    /// An exclusive-access handle holds the address
    MutableBorrowed,
    /// An owning handle has explicitly claimed the address
    Owned,
}

impl BorrowState {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn is_mutably_borrowed(&self) -> bool {
        matches!(self, Self::MutableBorrowed)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned)
    }
}

impl fmt::Display for BorrowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::Invalid => write!(f, "invalid"),
            Self::MutableBorrowed => write!(f, "mutably borrowed"),
            Self::Owned => write!(f, "owned"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(BorrowState::default(), BorrowState::Valid);
        assert!(BorrowState::default().is_valid());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(format!("{}", BorrowState::Valid), "valid");
        assert_eq!(format!("{}", BorrowState::Invalid), "invalid");
        assert_eq!(format!("{}", BorrowState::MutableBorrowed), "mutably borrowed");
        assert_eq!(format!("{}", BorrowState::Owned), "owned");
    }
}
