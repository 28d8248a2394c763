//! Shared-access handle
//!
//! A [`Ref`] is a read-only alias. Any number may coexist over one value,
//! as long as no exclusive handle holds it. Each live `Ref`, clones
//! included, counts once in the registry.

use crate::access::Access;
use crate::error::{BorrowError, BorrowResult};
use rtborrow_registry::{Addr, Registry};
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use tracing::{debug, warn};

pub struct Ref<'r, T> {
    ptr: Option<NonNull<T>>,
    registry: &'r dyn Registry,
    _marker: PhantomData<&'r T>,
}

impl<'r, T> Ref<'r, T> {
    /// Try to read the value. Fails on a moved-from handle.
    pub fn try_get(&self) -> BorrowResult<&T> {
        match self.ptr {
            // SAFETY: the pointer was valid at acquire time and the registry
            // rejects exclusive handles while this share is counted.
            Some(ptr) => Ok(unsafe { ptr.as_ref() }),
            None => Err(BorrowError::Empty { handle: Self::KIND }),
        }
    }

    /// Move the share out, leaving `self` empty.
    ///
    /// The registry is untouched: the share changes holder, not count.
    pub fn take(&mut self) -> Ref<'r, T> {
        if let Some(ptr) = self.ptr {
            debug!(addr = %Addr::from(ptr), "move shared handle");
        }
        Ref {
            ptr: self.ptr.take(),
            registry: self.registry,
            _marker: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    pub fn as_ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }
}

impl<'r, T> Access<'r> for Ref<'r, T> {
    type Target = T;

    const KIND: &'static str = "Ref";

    unsafe fn acquire(ptr: NonNull<T>, registry: &'r dyn Registry) -> BorrowResult<Self> {
        let addr = Addr::from(ptr);
        let state = registry.query(addr);
        if !state.is_valid() {
            warn!(%addr, %state, "rejected shared borrow");
            return Err(BorrowError::SharedWhileExclusive { addr, state });
        }
        let count = registry.retain_shared(addr);
        debug!(%addr, count, "acquire shared handle");
        Ok(Ref {
            ptr: Some(ptr),
            registry,
            _marker: PhantomData,
        })
    }

    fn observe(&self) -> BorrowResult<&T> {
        self.try_get()
    }

    fn addr(&self) -> Option<Addr> {
        self.ptr.map(Addr::from)
    }
}

impl<T> Clone for Ref<'_, T> {
    fn clone(&self) -> Self {
        if let Some(ptr) = self.ptr {
            let count = self.registry.retain_shared(Addr::from(ptr));
            debug!(addr = %Addr::from(ptr), count, "clone shared handle");
        }
        Ref {
            ptr: self.ptr,
            registry: self.registry,
            _marker: PhantomData,
        }
    }
}

impl<T> Deref for Ref<'_, T> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the handle is empty. Use [`Ref::try_get`] to check first.
    fn deref(&self) -> &T {
        match self.try_get() {
            Ok(value) => value,
            Err(err) => panic!("{}", err),
        }
    }
}

impl<T> Drop for Ref<'_, T> {
    fn drop(&mut self) {
        if let Some(ptr) = self.ptr.take() {
            let addr = Addr::from(ptr);
            let left = self.registry.release_shared(addr);
            debug!(%addr, left, "release shared handle");
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Ref<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.try_get() {
            Ok(value) => f.debug_tuple("Ref").field(value).finish(),
            Err(_) => write!(f, "Ref(<empty>)"),
        }
    }
}
