//! Runtime ownership and aliasing enforcement
//!
//! Emulates at run time the "one exclusive or many shared" discipline a
//! borrow checker enforces statically. Three handle types check and update
//! a caller-owned [`Registry`]:
//!
//! 1. [`Own`]: owns a heap value, frees it on drop, moves at runtime
//! 2. [`Ref`]: read-only alias; many may coexist
//! 3. [`MutRef`]: read/write alias; excludes every other borrow
//!
//! Rejected transitions return a [`BorrowError`]. Corrupting the registry
//! (registering an address twice, overflowing a fixed registry) panics.
//!
//! ```
//! use rtborrow::{Access, HashRegistry, MutRef, Own, Ref};
//!
//! let registry = HashRegistry::new();
//! let owner = Own::new(Box::new(42), &registry);
//! let ptr = owner.as_ptr().unwrap();
//!
//! let shared = unsafe { Ref::acquire(ptr, &registry) }.unwrap();
//! assert_eq!(*shared, 42);
//! assert!(unsafe { MutRef::acquire(ptr, &registry) }.is_err());
//!
//! drop(shared);
//! let exclusive = unsafe { MutRef::acquire(ptr, &registry) }.unwrap();
//! assert!(unsafe { MutRef::acquire(ptr, &registry) }.is_err());
//! drop(exclusive);
//! ```

pub mod access;
pub mod error;
pub mod exclusive;
pub mod own;
pub mod shared;

pub use access::Access;
pub use error::{BorrowError, BorrowResult, ErrorKind};
pub use exclusive::MutRef;
pub use own::Own;
pub use shared::Ref;

pub use rtborrow_registry::{
    config, Addr, BorrowState, ConfigError, Entry, FixedRegistry, HashRegistry, Registry,
    RegistryConfig, Slot, Strategy,
};
