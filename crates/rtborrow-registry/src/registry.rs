//! Borrow registry
//!
//! The registry maps an [`Addr`] to the access state of the value stored
//! there. It knows nothing about handles; it only stores state:
//!
//! 1. An address without an entry is `Valid`
//! 2. At most one entry exists per address
//! 3. Shared handles are counted per entry, so any number may coexist
//! 4. An entry held only by shared handles disappears with the last one
//!
//! All methods take `&self`. Registries use `RefCell` internally and are
//! therefore `!Sync`: they are defined for single-threaded use only.

use crate::addr::Addr;
use crate::state::BorrowState;
use std::cell::RefCell;
use tracing::trace;

/// State stored for one tracked address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    pub state: BorrowState,
    /// Number of live shared handles over the address
    pub shared: usize,
}

impl Slot {
    pub fn new(state: BorrowState) -> Self {
        Self { state, shared: 0 }
    }

    /// A shared or exclusive borrow is live
    pub fn is_borrowed(&self) -> bool {
        self.shared > 0 || self.state.is_mutably_borrowed()
    }
}

/// One row of a registry snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub addr: Addr,
    pub state: BorrowState,
    pub shared: usize,
}

/// Operations every borrow registry provides
pub trait Registry {
    /// Insert a new entry for `addr`.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is already registered, or if a fixed-capacity
    /// registry has no free slot left. `addr` must not be null.
    fn register(&self, addr: Addr, state: BorrowState);

    /// Remove the entry for `addr`. Removing an absent entry is a no-op.
    fn unregister(&self, addr: Addr);

    /// Current state of `addr`, `Valid` if it has no entry
    fn query(&self, addr: Addr) -> BorrowState;

    /// Overwrite the state of an existing entry with `Owned`
    fn mark_owned(&self, addr: Addr);

    /// True iff an entry exists for `addr` and its state is `Owned`
    fn is_owned(&self, addr: Addr) -> bool;

    /// Count one more shared handle over `addr`, creating a `Valid`
    /// entry if needed. Returns the new count.
    fn retain_shared(&self, addr: Addr) -> usize;

    /// Count one shared handle less. Returns the remaining count.
    fn release_shared(&self, addr: Addr) -> usize;

    fn shared_count(&self, addr: Addr) -> usize;

    /// An entry exists for `addr`, whatever its state
    fn is_tracked(&self, addr: Addr) -> bool;

    /// Number of tracked addresses
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries, ordered by address
    fn snapshot(&self) -> Vec<Entry>;

    /// Slot for `addr`; the default slot if absent
    fn slot(&self, addr: Addr) -> Slot {
        Slot {
            state: self.query(addr),
            shared: self.shared_count(addr),
        }
    }
}

/// Storage behind a [`SlotRegistry`]
///
/// `insert` is only ever called for an address that has no slot.
pub trait SlotTable {
    fn get(&self, addr: Addr) -> Option<&Slot>;
    fn get_mut(&mut self, addr: Addr) -> Option<&mut Slot>;
    fn insert(&mut self, addr: Addr, slot: Slot);
    fn remove(&mut self, addr: Addr) -> Option<Slot>;
    fn len(&self) -> usize;
    fn entries(&self) -> Vec<Entry>;
}

/// A [`Registry`] over any [`SlotTable`]
///
/// Both storage strategies share this implementation, so they cannot
/// drift apart in behavior.
#[derive(Debug, Default)]
pub struct SlotRegistry<S> {
    table: RefCell<S>,
}

impl<S: SlotTable> SlotRegistry<S> {
    pub fn with_table(table: S) -> Self {
        Self {
            table: RefCell::new(table),
        }
    }
}

impl<S: SlotTable> Registry for SlotRegistry<S> {
    fn register(&self, addr: Addr, state: BorrowState) {
        debug_assert!(!addr.is_null(), "the null address cannot be registered");
        let mut table = self.table.borrow_mut();
        assert!(
            table.get(addr).is_none(),
            "address {} is already registered",
            addr
        );
        table.insert(addr, Slot::new(state));
        trace!(%addr, %state, "register");
    }

    fn unregister(&self, addr: Addr) {
        if self.table.borrow_mut().remove(addr).is_some() {
            trace!(%addr, "unregister");
        }
    }

    fn query(&self, addr: Addr) -> BorrowState {
        self.table
            .borrow()
            .get(addr)
            .map_or(BorrowState::Valid, |slot| slot.state)
    }

    fn mark_owned(&self, addr: Addr) {
        if let Some(slot) = self.table.borrow_mut().get_mut(addr) {
            slot.state = BorrowState::Owned;
            trace!(%addr, "mark owned");
        }
    }

    fn is_owned(&self, addr: Addr) -> bool {
        self.table
            .borrow()
            .get(addr)
            .is_some_and(|slot| slot.state.is_owned())
    }

    fn retain_shared(&self, addr: Addr) -> usize {
        debug_assert!(!addr.is_null(), "the null address cannot be registered");
        let mut table = self.table.borrow_mut();
        let count = match table.get_mut(addr) {
            Some(slot) => {
                slot.shared += 1;
                slot.shared
            }
            None => {
                table.insert(
                    addr,
                    Slot {
                        state: BorrowState::Valid,
                        shared: 1,
                    },
                );
                1
            }
        };
        trace!(%addr, count, "retain shared");
        count
    }

    fn release_shared(&self, addr: Addr) -> usize {
        let mut table = self.table.borrow_mut();
        let (left, vacant) = match table.get_mut(addr) {
            Some(slot) => {
                slot.shared = slot.shared.saturating_sub(1);
                (slot.shared, slot.shared == 0 && slot.state.is_valid())
            }
            None => return 0,
        };
        if vacant {
            table.remove(addr);
        }
        trace!(%addr, left, "release shared");
        left
    }

    fn shared_count(&self, addr: Addr) -> usize {
        self.table.borrow().get(addr).map_or(0, |slot| slot.shared)
    }

    fn is_tracked(&self, addr: Addr) -> bool {
        self.table.borrow().get(addr).is_some()
    }

    fn len(&self) -> usize {
        self.table.borrow().len()
    }

    fn snapshot(&self) -> Vec<Entry> {
        let mut entries = self.table.borrow().entries();
        entries.sort_by_key(|entry| entry.addr);
        entries
    }

    fn slot(&self, addr: Addr) -> Slot {
        self.table.borrow().get(addr).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_is_borrowed() {
        assert!(!Slot::new(BorrowState::Valid).is_borrowed());
        assert!(!Slot::new(BorrowState::Owned).is_borrowed());
        assert!(Slot::new(BorrowState::MutableBorrowed).is_borrowed());
        let shared = Slot {
            state: BorrowState::Valid,
            shared: 2,
        };
        assert!(shared.is_borrowed());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "null address")]
    fn test_register_null_panics() {
        let registry = crate::HashRegistry::new();
        registry.register(Addr::NULL, BorrowState::Owned);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "null address")]
    fn test_retain_null_panics() {
        let registry = crate::FixedRegistry::with_capacity(1);
        registry.retain_shared(Addr::NULL);
    }

    #[test]
    fn test_default_slot() {
        let slot = Slot::default();
        assert_eq!(slot.state, BorrowState::Valid);
        assert_eq!(slot.shared, 0);
    }
}
