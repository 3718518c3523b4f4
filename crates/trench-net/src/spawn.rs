//! Entity spawn/removal wire format.
//!
//! Spawning is described by prefab name plus an assigned entity id and an
//! origin: either a slot in an owning inventory, or a world position with
//! an optional owning structure. A string-tagged extension carries
//! item-specific metadata (e.g. an identity card's embedded tag string).

use crate::buffer::{BitReader, BitWriter};
use crate::error::ProtocolError;
use crate::event::EntityId;

/// Sentinel slot index meaning "no specific slot".
const NO_SLOT: u8 = 255;

// ---------------------------------------------------------------------------
// SpawnOrigin
// ---------------------------------------------------------------------------

/// Where a spawned entity is placed.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnOrigin {
    /// Inside an inventory owned by another entity.
    Inventory {
        /// Id of the inventory's owning entity (always non-zero).
        owner: EntityId,
        /// Slot index, or `None` for "first free slot".
        slot: Option<u8>,
    },
    /// Loose in the world.
    World {
        /// World position.
        position: (f32, f32),
        /// Owning structure id, if the entity belongs to one.
        structure: Option<EntityId>,
    },
}

// ---------------------------------------------------------------------------
// ItemSpawnData
// ---------------------------------------------------------------------------

/// Everything a peer needs to instantiate a prefab.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSpawnData {
    /// Prefab name to instantiate.
    pub prefab: String,
    /// Entity id assigned by the authoritative peer.
    pub id: EntityId,
    /// Placement.
    pub origin: SpawnOrigin,
    /// Item-specific metadata extension (e.g. an id card's tag string).
    pub tag_extension: Option<String>,
}

impl ItemSpawnData {
    /// Encodes the spawn description.
    pub fn write(&self, writer: &mut BitWriter) {
        writer.write_string(&self.prefab);
        writer.write_u16(self.id.0);

        match &self.origin {
            SpawnOrigin::Inventory { owner, slot } => {
                writer.write_u16(owner.0);
                writer.write_u8(slot.unwrap_or(NO_SLOT));
            }
            SpawnOrigin::World {
                position,
                structure,
            } => {
                // Owner id 0 marks a world spawn.
                writer.write_u16(0);
                writer.write_f32(position.0);
                writer.write_f32(position.1);
                writer.write_u16(structure.map_or(0, |s| s.0));
            }
        }

        match &self.tag_extension {
            Some(tags) => {
                writer.write_bool(true);
                writer.write_string(tags);
            }
            None => writer.write_bool(false),
        }
    }

    /// Decodes a spawn description.
    ///
    /// # Errors
    ///
    /// Propagates [`ProtocolError`] on truncated or malformed input.
    pub fn read(reader: &mut BitReader) -> Result<Self, ProtocolError> {
        let prefab = reader.read_string()?;
        let id = EntityId(reader.read_u16()?);

        let owner = reader.read_u16()?;
        let origin = if owner > 0 {
            let slot = reader.read_u8()?;
            SpawnOrigin::Inventory {
                owner: EntityId(owner),
                slot: (slot != NO_SLOT).then_some(slot),
            }
        } else {
            let position = (reader.read_f32()?, reader.read_f32()?);
            let structure = reader.read_u16()?;
            SpawnOrigin::World {
                position,
                structure: (structure != 0).then_some(EntityId(structure)),
            }
        };

        let tag_extension = if reader.read_bool()? {
            Some(reader.read_string()?)
        } else {
            None
        };

        Ok(Self {
            prefab,
            id,
            origin,
            tag_extension,
        })
    }
}

// ---------------------------------------------------------------------------
// SpawnOrRemove
// ---------------------------------------------------------------------------

/// The spawner's event payload: either a removal by id or a full spawn.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnOrRemove {
    /// Remove an existing entity.
    Remove(EntityId),
    /// Instantiate a prefab.
    Spawn(ItemSpawnData),
}

impl SpawnOrRemove {
    /// Encodes the envelope.
    pub fn write(&self, writer: &mut BitWriter) {
        match self {
            SpawnOrRemove::Remove(id) => {
                writer.write_bool(true);
                writer.write_u16(id.0);
            }
            SpawnOrRemove::Spawn(data) => {
                writer.write_bool(false);
                data.write(writer);
            }
        }
    }

    /// Decodes the envelope.
    ///
    /// # Errors
    ///
    /// Propagates [`ProtocolError`] on truncated or malformed input.
    pub fn read(reader: &mut BitReader) -> Result<Self, ProtocolError> {
        if reader.read_bool()? {
            Ok(SpawnOrRemove::Remove(EntityId(reader.read_u16()?)))
        } else {
            Ok(SpawnOrRemove::Spawn(ItemSpawnData::read(reader)?))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(msg: &SpawnOrRemove) -> SpawnOrRemove {
        let mut w = BitWriter::new();
        msg.write(&mut w);
        let bytes = w.into_bytes();
        SpawnOrRemove::read(&mut BitReader::new(&bytes)).unwrap()
    }

    #[test]
    fn test_world_spawn_roundtrip() {
        let msg = SpawnOrRemove::Spawn(ItemSpawnData {
            prefab: "oxygen_tank".into(),
            id: EntityId(41),
            origin: SpawnOrigin::World {
                position: (120.5, -44.25),
                structure: Some(EntityId(7)),
            },
            tag_extension: None,
        });
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_inventory_spawn_roundtrip() {
        let msg = SpawnOrRemove::Spawn(ItemSpawnData {
            prefab: "wrench".into(),
            id: EntityId(42),
            origin: SpawnOrigin::Inventory {
                owner: EntityId(12),
                slot: Some(3),
            },
            tag_extension: None,
        });
        assert_eq!(roundtrip(&msg), msg);

        let no_slot = SpawnOrRemove::Spawn(ItemSpawnData {
            prefab: "wrench".into(),
            id: EntityId(43),
            origin: SpawnOrigin::Inventory {
                owner: EntityId(12),
                slot: None,
            },
            tag_extension: None,
        });
        assert_eq!(roundtrip(&no_slot), no_slot);
    }

    #[test]
    fn test_tag_extension_roundtrip() {
        let msg = SpawnOrRemove::Spawn(ItemSpawnData {
            prefab: "id_card".into(),
            id: EntityId(99),
            origin: SpawnOrigin::Inventory {
                owner: EntityId(5),
                slot: Some(0),
            },
            tag_extension: Some("captain,engineering".into()),
        });
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_remove_roundtrip() {
        let msg = SpawnOrRemove::Remove(EntityId(777));
        assert_eq!(roundtrip(&msg), msg);
    }

    #[test]
    fn test_truncated_spawn_is_error() {
        let msg = SpawnOrRemove::Spawn(ItemSpawnData {
            prefab: "flare".into(),
            id: EntityId(1),
            origin: SpawnOrigin::World {
                position: (0.0, 0.0),
                structure: None,
            },
            tag_extension: None,
        });
        let mut w = BitWriter::new();
        msg.write(&mut w);
        let bytes = w.into_bytes();

        // Chop the message in half; the decode must fail, not panic.
        let truncated = &bytes[..bytes.len() / 2];
        assert!(SpawnOrRemove::read(&mut BitReader::new(truncated)).is_err());
    }
}
