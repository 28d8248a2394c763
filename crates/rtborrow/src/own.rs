//! Exclusive-ownership handle
//!
//! [`Own`] owns a heap value outright and frees it when dropped. Ownership
//! moves at runtime through [`Own::take`]; the source is left inert and its
//! drop does nothing, the same way a moved-from value would behave.
//!
//! An owner does not register itself. Its address only gets an entry when
//! it is explicitly claimed ([`Own::claim_owned`]) or handed off
//! ([`Own::borrow_into_owned`]), or while borrowed by a [`Ref`]/[`MutRef`].
//!
//! # Example
//!
//! ```
//! use rtborrow::{HashRegistry, Own};
//!
//! let registry = HashRegistry::new();
//! let mut first = Own::new(Box::new(42), &registry);
//! let second = first.take().unwrap();
//!
//! assert!(!first.is_owner());
//! assert!(second.is_owner());
//! assert_eq!(*second, 42);
//! ```

use crate::access::Access;
use crate::error::{BorrowError, BorrowResult};
use crate::exclusive::MutRef;
use crate::shared::Ref;
use rtborrow_registry::{Addr, BorrowState, Registry};
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;
use tracing::{debug, warn};

pub struct Own<'r, T> {
    ptr: Option<NonNull<T>>,
    registry: &'r dyn Registry,
    _owns: PhantomData<T>,
}

impl<'r, T> Own<'r, T> {
    pub fn new(value: Box<T>, registry: &'r dyn Registry) -> Self {
        let ptr = NonNull::from(Box::leak(value));
        debug!(addr = %Addr::from(ptr), "new owner");
        Own {
            ptr: Some(ptr),
            registry,
            _owns: PhantomData,
        }
    }

    /// Raw address of the owned value, `None` once moved from
    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    pub fn registry(&self) -> &'r dyn Registry {
        self.registry
    }

    fn live(&self) -> BorrowResult<NonNull<T>> {
        self.ptr.ok_or(BorrowError::Empty { handle: Self::KIND })
    }

    fn is_borrowed(&self, addr: Addr) -> bool {
        self.registry.slot(addr).is_borrowed()
    }

    /// Read the value.
    ///
    /// Fails while an exclusive handle holds the address, or when moved from.
    pub fn try_get(&self) -> BorrowResult<&T> {
        let ptr = self.live()?;
        let addr = Addr::from(ptr);
        if self.registry.query(addr).is_mutably_borrowed() {
            warn!(%addr, "rejected read through owner");
            return Err(BorrowError::ReadWhileExclusive { addr });
        }
        // SAFETY: the owner keeps the value alive and no exclusive handle
        // is registered for it.
        Ok(unsafe { ptr.as_ref() })
    }

    /// Write the value.
    ///
    /// Fails while any shared or exclusive handle holds the address.
    pub fn try_get_mut(&mut self) -> BorrowResult<&mut T> {
        let mut ptr = self.live()?;
        let addr = Addr::from(ptr);
        if self.is_borrowed(addr) {
            warn!(%addr, "rejected write through owner");
            return Err(BorrowError::write_while_borrowed(self.registry, addr));
        }
        // SAFETY: `&mut self` excludes handles derived from this owner and
        // the registry shows no raw handle either.
        Ok(unsafe { ptr.as_mut() })
    }

    /// True until the handle is moved from
    pub fn is_owner(&self) -> bool {
        self.ptr.is_some()
    }

    /// Owner whose address the registry records as `Owned`
    pub fn is_claimed(&self) -> bool {
        self.addr()
            .is_some_and(|addr| self.registry.is_owned(addr))
    }

    /// Record the address as `Owned` in the registry.
    ///
    /// Claiming twice is allowed. A claimed address rejects new shared and
    /// exclusive handles until the owner is dropped.
    pub fn claim_owned(&self) -> BorrowResult<()> {
        let ptr = self.ptr.ok_or(BorrowError::NotOwner)?;
        let addr = Addr::from(ptr);
        if self.is_borrowed(addr) {
            warn!(%addr, "rejected ownership claim");
            return Err(BorrowError::claim_while_borrowed(self.registry, addr));
        }
        if self.registry.is_tracked(addr) {
            self.registry.mark_owned(addr);
        } else {
            self.registry.register(addr, BorrowState::Owned);
        }
        debug!(%addr, "claim owned");
        Ok(())
    }

    /// Move ownership out, leaving `self` inert.
    ///
    /// Fails while the value is borrowed. A claim travels with the value.
    pub fn take(&mut self) -> BorrowResult<Own<'r, T>> {
        let ptr = self.live()?;
        let addr = Addr::from(ptr);
        if self.is_borrowed(addr) {
            warn!(%addr, "rejected move of borrowed value");
            return Err(BorrowError::move_while_borrowed(self.registry, addr));
        }
        debug!(%addr, "move owner");
        Ok(Own {
            ptr: self.ptr.take(),
            registry: self.registry,
            _owns: PhantomData,
        })
    }

    /// Move-assign: free whatever `self` owns, then take over the value of
    /// `source`, leaving it inert.
    ///
    /// Fails while either value is borrowed; both handles are then left
    /// untouched.
    pub fn assign(&mut self, source: &mut Own<'r, T>) -> BorrowResult<()> {
        for (addr, registry) in [(self.addr(), self.registry), (source.addr(), source.registry)] {
            let Some(addr) = addr else { continue };
            if registry.slot(addr).is_borrowed() {
                warn!(%addr, "rejected move-assign of borrowed value");
                return Err(BorrowError::move_while_borrowed(registry, addr));
            }
        }
        self.free();
        self.ptr = source.ptr.take();
        self.registry = source.registry;
        if let Some(ptr) = self.ptr {
            debug!(addr = %Addr::from(ptr), "assign owner");
        }
        Ok(())
    }

    /// Hand ownership to a new handle through the registry.
    ///
    /// Only allowed while the address has no entry at all. The new owner
    /// is registered as `Owned` and `self` becomes inert.
    pub fn borrow_into_owned(&mut self) -> BorrowResult<Own<'r, T>> {
        let ptr = self.live()?;
        let addr = Addr::from(ptr);
        if self.registry.is_tracked(addr) {
            warn!(%addr, "rejected ownership hand-off");
            return Err(BorrowError::hand_off_while_borrowed(self.registry, addr));
        }
        self.registry.register(addr, BorrowState::Owned);
        debug!(%addr, "hand off owner");
        Ok(Own {
            ptr: self.ptr.take(),
            registry: self.registry,
            _owns: PhantomData,
        })
    }

    /// Give up tracking and return the value, leaving `self` inert.
    pub fn take_box(&mut self) -> BorrowResult<Box<T>> {
        let ptr = self.live()?;
        let addr = Addr::from(ptr);
        if self.is_borrowed(addr) {
            warn!(%addr, "rejected release of borrowed value");
            return Err(BorrowError::move_while_borrowed(self.registry, addr));
        }
        self.ptr = None;
        self.registry.unregister(addr);
        debug!(%addr, "release owner into box");
        // SAFETY: the pointer came from `Box::leak` and is no longer held
        // by this handle.
        Ok(unsafe { Box::from_raw(ptr.as_ptr()) })
    }

    /// Shared handle tied to this owner
    pub fn share(&self) -> BorrowResult<Ref<'_, T>> {
        let ptr = self.live()?;
        // SAFETY: the `Ref` borrows `self`, so the value outlives it.
        unsafe { Ref::acquire(ptr, self.registry) }
    }

    /// Exclusive handle tied to this owner
    pub fn share_mut(&mut self) -> BorrowResult<MutRef<'_, T>> {
        let ptr = self.live()?;
        // SAFETY: the `MutRef` borrows `self` mutably, so the value outlives
        // it and cannot be read through the owner meanwhile.
        unsafe { MutRef::acquire(ptr, self.registry) }
    }

    fn free(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            let addr = Addr::from(ptr);
            self.registry.unregister(addr);
            debug!(%addr, "free owned value");
            // SAFETY: the pointer came from `Box::leak` and this handle was
            // its only owner.
            drop(unsafe { Box::from_raw(ptr.as_ptr()) });
        }
    }
}

impl<'r, T> Access<'r> for Own<'r, T> {
    type Target = T;

    const KIND: &'static str = "Own";

    /// Take ownership of a value previously leaked from a `Box`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from [`Box::into_raw`] or [`Box::leak`] and must not
    /// be owned by any other handle: it is freed when the `Own` drops.
    unsafe fn acquire(ptr: NonNull<T>, registry: &'r dyn Registry) -> BorrowResult<Self> {
        debug!(addr = %Addr::from(ptr), "acquire owner");
        Ok(Own {
            ptr: Some(ptr),
            registry,
            _owns: PhantomData,
        })
    }

    fn observe(&self) -> BorrowResult<&T> {
        self.try_get()
    }

    fn addr(&self) -> Option<Addr> {
        self.ptr.map(Addr::from)
    }
}

impl<T> Deref for Own<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T> DerefMut for Own<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self.try_get_mut() {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T> Drop for Own<'_, T> {
    fn drop(&mut self) {
        self.free();
    }
}

impl<T: fmt::Debug> fmt::Debug for Own<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Ok(value) => f.debug_tuple("Own").field(value).finish(),
            Err(BorrowError::Empty { .. }) => write!(f, "Own(<moved>)"),
            Err(_) => write!(f, "Own(<mutably borrowed>)"),
        }
    }
}
