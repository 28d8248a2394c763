use crate::addr::Addr;
use crate::registry::{Entry, Slot, SlotRegistry, SlotTable};
use indexmap::IndexMap;

/// Unbounded slot table keyed by address
#[derive(Debug, Default)]
pub struct HashSlots {
    slots: IndexMap<Addr, Slot>,
}

impl SlotTable for HashSlots {
    fn get(&self, addr: Addr) -> Option<&Slot> {
        self.slots.get(&addr)
    }

    fn get_mut(&mut self, addr: Addr) -> Option<&mut Slot> {
        self.slots.get_mut(&addr)
    }

    fn insert(&mut self, addr: Addr, slot: Slot) {
        self.slots.insert(addr, slot);
    }

    fn remove(&mut self, addr: Addr) -> Option<Slot> {
        self.slots.swap_remove(&addr)
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn entries(&self) -> Vec<Entry> {
        self.slots
            .iter()
            .map(|(addr, slot)| Entry {
                addr: *addr,
                state: slot.state,
                shared: slot.shared,
            })
            .collect()
    }
}

/// Registry with no bound on the number of tracked addresses
pub type HashRegistry = SlotRegistry<HashSlots>;

impl SlotRegistry<HashSlots> {
    pub fn new() -> Self {
        Self::with_table(HashSlots::default())
    }
}
