//! Item inventories.
//!
//! A fixed array of slots holding entity ids. The wire format is the full
//! slot state, one u16 per slot (0 = empty); both peers know the capacity
//! from the prefab, so no length prefix is needed.

use trench_net::{BitReader, BitWriter, EntityId, ProtocolError};

/// A fixed-capacity slot array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    slots: Vec<Option<EntityId>>,
}

impl Inventory {
    /// Creates an empty inventory with `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The item in `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<EntityId> {
        self.slots.get(slot).copied().flatten()
    }

    /// The slot holding `item`, if present.
    pub fn find_index(&self, item: EntityId) -> Option<usize> {
        self.slots.iter().position(|s| *s == Some(item))
    }

    /// Places `item` into the requested slot, or the first free slot when
    /// no preference is given. Occupied requested slots and full
    /// inventories refuse the item. An item already held is not duplicated.
    pub fn try_put_item(&mut self, item: EntityId, slot: Option<usize>) -> bool {
        if self.find_index(item).is_some() {
            return false;
        }
        let target = match slot {
            Some(i) => {
                if i >= self.slots.len() || self.slots[i].is_some() {
                    return false;
                }
                i
            }
            None => match self.slots.iter().position(Option::is_none) {
                Some(i) => i,
                None => return false,
            },
        };
        self.slots[target] = Some(item);
        true
    }

    /// Removes `item` wherever it sits. Returns `true` if it was held.
    pub fn remove_item(&mut self, item: EntityId) -> bool {
        match self.find_index(item) {
            Some(i) => {
                self.slots[i] = None;
                true
            }
            None => false,
        }
    }

    /// All held item ids, in slot order.
    pub fn items(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().copied().flatten()
    }

    /// Encodes the full slot state.
    pub fn write_state(&self, writer: &mut BitWriter) {
        for slot in &self.slots {
            writer.write_u16(slot.map_or(0, |id| id.0));
        }
    }

    /// Decodes and applies a full slot state.
    pub fn read_state(&mut self, reader: &mut BitReader) -> Result<(), ProtocolError> {
        // Read everything before applying anything: a truncated message
        // must not leave the inventory half-updated.
        let mut incoming = Vec::with_capacity(self.slots.len());
        for _ in 0..self.slots.len() {
            let raw = reader.read_u16()?;
            incoming.push((raw != 0).then_some(EntityId(raw)));
        }
        self.slots = incoming;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_find() {
        let mut inv = Inventory::new(4);
        assert!(inv.try_put_item(EntityId(5), None));
        assert!(inv.try_put_item(EntityId(6), Some(2)));

        assert_eq!(inv.find_index(EntityId(5)), Some(0));
        assert_eq!(inv.find_index(EntityId(6)), Some(2));
        assert_eq!(inv.get(1), None);
    }

    #[test]
    fn test_no_duplicates_and_no_overwrites() {
        let mut inv = Inventory::new(2);
        assert!(inv.try_put_item(EntityId(5), Some(0)));
        assert!(!inv.try_put_item(EntityId(5), Some(1)), "item duplicated");
        assert!(!inv.try_put_item(EntityId(6), Some(0)), "slot overwritten");
        assert!(inv.try_put_item(EntityId(6), None));
    }

    #[test]
    fn test_full_inventory_refuses() {
        let mut inv = Inventory::new(1);
        assert!(inv.try_put_item(EntityId(1), None));
        assert!(!inv.try_put_item(EntityId(2), None));
    }

    #[test]
    fn test_remove() {
        let mut inv = Inventory::new(2);
        inv.try_put_item(EntityId(9), Some(1));
        assert!(inv.remove_item(EntityId(9)));
        assert!(!inv.remove_item(EntityId(9)));
        assert_eq!(inv.get(1), None);
    }

    #[test]
    fn test_state_roundtrip() {
        let mut inv = Inventory::new(3);
        inv.try_put_item(EntityId(11), Some(0));
        inv.try_put_item(EntityId(22), Some(2));

        let mut w = BitWriter::new();
        inv.write_state(&mut w);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 6);

        let mut remote = Inventory::new(3);
        remote.read_state(&mut BitReader::new(&bytes)).unwrap();
        assert_eq!(remote, inv);
    }

    #[test]
    fn test_truncated_state_leaves_inventory_untouched() {
        let mut inv = Inventory::new(3);
        inv.try_put_item(EntityId(11), Some(0));
        let before = inv.clone();

        let bytes = [0u8; 3]; // 3 slots need 6 bytes
        assert!(inv.read_state(&mut BitReader::new(&bytes)).is_err());
        assert_eq!(inv, before, "partial state applied");
    }
}
