use std::fmt;
use std::ptr::NonNull;

/// Identity of a tracked value: the numeric address of its storage.
///
/// Two handles refer to the same value iff their `Addr`s are equal.
/// Zero-sized values all live at the same dangling address, so they
/// cannot be told apart by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Addr(usize);

impl Addr {
    /// The null address. Never used as a registry key.
    pub const NULL: Addr = Addr(0);

    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Address of the value behind a reference
    pub fn of<T: ?Sized>(value: &T) -> Self {
        Self::from_ptr(value as *const T)
    }

    pub fn from_ptr<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>() as usize)
    }

    pub const fn get(self) -> usize {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl<T: ?Sized> From<NonNull<T>> for Addr {
    fn from(ptr: NonNull<T>) -> Self {
        Addr::from_ptr(ptr.as_ptr() as *const T)
    }
}

impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_identity() {
        let a = 1u64;
        let b = 1u64;
        assert_eq!(Addr::of(&a), Addr::of(&a));
        assert_ne!(Addr::of(&a), Addr::of(&b));
        assert_eq!(Addr::of(&a), Addr::from(NonNull::from(&a)));
    }

    #[test]
    fn test_addr_display() {
        assert_eq!(format!("{}", Addr::from_raw(0x1f40)), "0x1f40");
        assert!(Addr::NULL.is_null());
        assert!(!Addr::from_raw(8).is_null());
    }
}
