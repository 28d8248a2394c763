//! Exclusive-access handle
//!
//! A [`MutRef`] is the single read/write alias of a value. It can only be
//! acquired while the address has no entry at all, so it excludes every
//! shared handle, every other exclusive handle and a claimed owner.
//! Once acquired, access through it is unchecked.

use crate::access::Access;
use crate::error::{BorrowError, BorrowResult};
use rtborrow_registry::{Addr, BorrowState, Registry};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use tracing::{debug, warn};

pub struct MutRef<'r, T> {
    ptr: NonNull<T>,
    registry: &'r dyn Registry,
    _marker: PhantomData<&'r mut T>,
}

impl<'r, T> MutRef<'r, T> {
    pub fn as_ptr(&self) -> NonNull<T> {
        self.ptr
    }
}

impl<'r, T> Access<'r> for MutRef<'r, T> {
    type Target = T;

    const KIND: &'static str = "MutRef";

    unsafe fn acquire(ptr: NonNull<T>, registry: &'r dyn Registry) -> BorrowResult<Self> {
        let addr = Addr::from(ptr);
        if registry.is_tracked(addr) {
            let err = BorrowError::mutable_while_borrowed(registry, addr);
            warn!(%addr, "rejected exclusive borrow");
            return Err(err);
        }
        registry.register(addr, BorrowState::MutableBorrowed);
        debug!(%addr, "acquire exclusive handle");
        Ok(MutRef {
            ptr,
            registry,
            _marker: PhantomData,
        })
    }

    fn observe(&self) -> BorrowResult<&T> {
        Ok(&**self)
    }

    fn addr(&self) -> Option<Addr> {
        Some(Addr::from(self.ptr))
    }
}

impl<T> Deref for MutRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the registry holds `MutableBorrowed` for this address for
        // as long as the handle lives, so no other handle can alias it.
        unsafe { self.ptr.as_ref() }
    }
}

impl<T> DerefMut for MutRef<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: see `deref`
        unsafe { self.ptr.as_mut() }
    }
}

impl<T> Drop for MutRef<'_, T> {
    fn drop(&mut self) {
        let addr = Addr::from(self.ptr);
        self.registry.unregister(addr);
        debug!(%addr, "release exclusive handle");
    }
}

impl<T: fmt::Debug> fmt::Debug for MutRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutRef").field(&**self).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Ref;
    use rtborrow_registry::{FixedRegistry, HashRegistry};

    #[test]
    fn test_second_exclusive_rejected() {
        let registry = HashRegistry::new();
        let mut value = vec![1, 2, 3];
        let ptr = NonNull::from(&mut value);

        let mut first = unsafe { MutRef::acquire(ptr, &registry) }.unwrap();
        first.push(4);
        assert_eq!(registry.query(Addr::from(ptr)), BorrowState::MutableBorrowed);

        let err = unsafe { MutRef::acquire(ptr, &registry) }.unwrap_err();
        assert_eq!(
            err,
            BorrowError::MutableWhileBorrowed {
                addr: Addr::from(ptr),
                state: BorrowState::MutableBorrowed,
                shared: 0,
            }
        );
        assert!(err.is_aliasing_violation());

        drop(first);
        assert_eq!(registry.query(Addr::from(ptr)), BorrowState::Valid);
        let second = unsafe { MutRef::acquire(ptr, &registry) }.unwrap();
        assert_eq!(second.len(), 4);
    }

    #[test]
    fn test_exclusive_rejected_while_shared() {
        let registry = HashRegistry::new();
        let mut value = 10;
        let ptr = NonNull::from(&mut value);

        let a = unsafe { Ref::acquire(ptr, &registry) }.unwrap();
        let b = a.clone();
        let err = unsafe { MutRef::acquire(ptr, &registry) }.unwrap_err();
        assert!(matches!(
            err,
            BorrowError::MutableWhileBorrowed {
                state: BorrowState::Valid,
                shared: 2,
                ..
            }
        ));

        drop(a);
        assert!(unsafe { MutRef::acquire(ptr, &registry) }.is_err());
        drop(b);
        let mut m = unsafe { MutRef::acquire(ptr, &registry) }.unwrap();
        *m += 1;
        drop(m);
        assert_eq!(value, 11);
    }

    #[test]
    fn test_exclusive_rejected_while_claimed() {
        let registry = HashRegistry::new();
        let mut value = 0u32;
        let ptr = NonNull::from(&mut value);
        registry.register(Addr::from(ptr), BorrowState::Owned);

        let err = unsafe { MutRef::acquire(ptr, &registry) }.unwrap_err();
        assert!(matches!(
            err,
            BorrowError::MutableWhileBorrowed {
                state: BorrowState::Owned,
                ..
            }
        ));
        assert!(registry.is_owned(Addr::from(ptr)));
    }

    #[test]
    fn test_mutation_is_visible_after_release() {
        let registry = FixedRegistry::with_capacity(1);
        let mut text = String::from("abc");
        {
            let mut m = unsafe { MutRef::acquire(NonNull::from(&mut text), &registry) }.unwrap();
            m.push('d');
            assert_eq!(m.observe().unwrap(), "abcd");
            assert_eq!(format!("{:?}", m), "MutRef(\"abcd\")");
        }
        assert!(registry.is_empty());
        assert_eq!(text, "abcd");
    }

    #[test]
    fn test_unwinding_releases() {
        let registry = HashRegistry::new();
        let mut value = 1;
        let ptr = NonNull::from(&mut value);

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _m = unsafe { MutRef::acquire(ptr, &registry) }.unwrap();
            panic!("boom");
        }));
        assert!(outcome.is_err());
        assert!(registry.is_empty());
        assert!(unsafe { MutRef::acquire(ptr, &registry) }.is_ok());
    }
}
