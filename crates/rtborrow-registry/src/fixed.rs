use crate::addr::Addr;
use crate::registry::{Entry, Slot, SlotRegistry, SlotTable};

/// Fixed number of `(address, slot)` cells searched linearly
///
/// Never grows after construction. Freed cells are reused.
#[derive(Debug)]
pub struct FixedSlots {
    cells: Vec<Option<(Addr, Slot)>>,
}

impl FixedSlots {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "fixed borrow registry needs a capacity of at least 1");
        Self {
            cells: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn position(&self, addr: Addr) -> Option<usize> {
        self.cells
            .iter()
            .position(|cell| matches!(cell, Some((a, _)) if *a == addr))
    }
}

impl SlotTable for FixedSlots {
    fn get(&self, addr: Addr) -> Option<&Slot> {
        self.cells.iter().find_map(|cell| match cell {
            Some((a, slot)) if *a == addr => Some(slot),
            _ => None,
        })
    }

    fn get_mut(&mut self, addr: Addr) -> Option<&mut Slot> {
        self.cells.iter_mut().find_map(|cell| match cell {
            Some((a, slot)) if *a == addr => Some(slot),
            _ => None,
        })
    }

    fn insert(&mut self, addr: Addr, slot: Slot) {
        let capacity = self.capacity();
        match self.cells.iter_mut().find(|cell| cell.is_none()) {
            Some(cell) => *cell = Some((addr, slot)),
            None => panic!(
                "borrow registry capacity of {} exhausted while registering {}",
                capacity, addr
            ),
        }
    }

    fn remove(&mut self, addr: Addr) -> Option<Slot> {
        let index = self.position(addr)?;
        self.cells[index].take().map(|(_, slot)| slot)
    }

    fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    fn entries(&self) -> Vec<Entry> {
        self.cells
            .iter()
            .flatten()
            .map(|(addr, slot)| Entry {
                addr: *addr,
                state: slot.state,
                shared: slot.shared,
            })
            .collect()
    }
}

/// Registry tracking at most `capacity` addresses at once
///
/// Running out of cells is a programming error and panics.
pub type FixedRegistry = SlotRegistry<FixedSlots>;

impl SlotRegistry<FixedSlots> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_table(FixedSlots::with_capacity(capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BorrowState;

    #[test]
    fn test_cells_are_reused() {
        let mut slots = FixedSlots::with_capacity(2);
        slots.insert(Addr::from_raw(8), Slot::new(BorrowState::Owned));
        slots.insert(Addr::from_raw(16), Slot::new(BorrowState::Valid));
        assert_eq!(slots.len(), 2);

        assert!(slots.remove(Addr::from_raw(8)).is_some());
        slots.insert(Addr::from_raw(24), Slot::new(BorrowState::MutableBorrowed));
        assert_eq!(slots.len(), 2);
        assert_eq!(
            slots.get(Addr::from_raw(24)).map(|slot| slot.state),
            Some(BorrowState::MutableBorrowed)
        );
    }

    #[test]
    fn test_remove_absent() {
        let mut slots = FixedSlots::with_capacity(1);
        assert!(slots.remove(Addr::from_raw(8)).is_none());
    }

    #[test]
    #[should_panic(expected = "capacity of 1 exhausted")]
    fn test_exhausted_capacity_panics() {
        let mut slots = FixedSlots::with_capacity(1);
        slots.insert(Addr::from_raw(8), Slot::default());
        slots.insert(Addr::from_raw(16), Slot::default());
    }

    #[test]
    #[should_panic(expected = "capacity of at least 1")]
    fn test_zero_capacity_panics() {
        let _ = FixedSlots::with_capacity(0);
    }
}
