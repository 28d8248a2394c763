use crate::error::BorrowResult;
use rtborrow_registry::{Addr, Registry};
use std::ptr::NonNull;

/// Capabilities shared by all handles: acquire, observe, release
///
/// A handle that has been moved from is *inert*: it reports no address,
/// observing it fails with [`BorrowError::Empty`](crate::BorrowError::Empty)
/// and releasing it touches nothing.
pub trait Access<'r>: Sized {
    type Target;

    /// Handle kind used in messages
    const KIND: &'static str;

    /// Bind a new handle to `ptr`, checking and updating `registry`.
    ///
    /// # Safety
    ///
    /// The registry tracks aliasing, not liveness. The caller guarantees
    /// that `ptr` points to a live, properly aligned `Target` for as long
    /// as the handle exists, and that no reference obtained outside the
    /// registry conflicts with the access the handle grants.
    unsafe fn acquire(ptr: NonNull<Self::Target>, registry: &'r dyn Registry) -> BorrowResult<Self>;

    /// Read access to the target
    fn observe(&self) -> BorrowResult<&Self::Target>;

    /// Address the handle is bound to, `None` once inert
    fn addr(&self) -> Option<Addr>;

    fn is_live(&self) -> bool {
        self.addr().is_some()
    }

    /// Give the access right back now instead of at end of scope
    fn release(self) {
        drop(self)
    }
}
