//! Borrow-state registry
//!
//! Tracks, per storage address, whether a value is free, shared,
//! exclusively borrowed or explicitly owned. Two storage strategies
//! implement the same [`Registry`] contract:
//!
//! - [`HashRegistry`]: unbounded, hash lookup
//! - [`FixedRegistry`]: a fixed number of cells, linear lookup, no growth
//!
//! ```
//! use rtborrow_registry::{Addr, BorrowState, HashRegistry, Registry};
//!
//! let registry = HashRegistry::new();
//! let value = 42;
//! let addr = Addr::of(&value);
//!
//! registry.register(addr, BorrowState::MutableBorrowed);
//! assert_eq!(registry.query(addr), BorrowState::MutableBorrowed);
//!
//! registry.unregister(addr);
//! assert_eq!(registry.query(addr), BorrowState::Valid);
//! ```

mod addr;
pub use addr::*;

mod state;
pub use state::*;

mod registry;
pub use registry::*;

mod hashed;
pub use hashed::*;

mod fixed;
pub use fixed::*;

pub mod config;
pub use config::{ConfigError, RegistryConfig, Strategy};
