//! Entity state-change events and the outgoing event queue.
//!
//! Every mutation that must reach remote peers is described by a
//! [`NetEntityEvent`]: which entity, which kind of change, and the typed
//! payload identity used for deduplication. Two queued events for the same
//! entity with structurally equal payloads collapse to one before the
//! flush step, so multiple triggers firing the same state change within a
//! tick produce a single broadcast.

use crate::buffer::{BitReader, BitWriter, bits_for_range};
use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Stable 16-bit identifier of a replicated entity. Assigned locally in
/// single-player, by the authoritative peer in multiplayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u16);

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Discriminant of an entity event. Written to the wire as a ranged
/// integer sized to the enum cardinality; adding a variant changes the
/// encoding and requires a protocol version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// State owned by one component (addressed by component index).
    ComponentState,
    /// Full inventory slot state.
    InventoryState,
    /// Condition and fix-requirement state.
    Status,
    /// A client fixing one repair requirement.
    Repair,
    /// Trigger a status effect on a target.
    ApplyStatusEffect,
    /// An editable property changed.
    ChangeProperty,
}

impl EventKind {
    /// All kinds, in wire order.
    pub const ALL: [EventKind; 6] = [
        EventKind::ComponentState,
        EventKind::InventoryState,
        EventKind::Status,
        EventKind::Repair,
        EventKind::ApplyStatusEffect,
        EventKind::ChangeProperty,
    ];

    /// Largest valid wire discriminant.
    pub const MAX_DISCRIMINANT: i32 = Self::ALL.len() as i32 - 1;

    /// The wire discriminant of this kind.
    pub fn discriminant(self) -> i32 {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0) as i32
    }

    /// Writes the discriminant as a ranged integer.
    pub fn write(self, writer: &mut BitWriter) {
        writer.write_ranged_int(self.discriminant(), 0, Self::MAX_DISCRIMINANT);
    }

    /// Reads and validates a discriminant.
    ///
    /// # Errors
    ///
    /// [`ProtocolError::InvalidDiscriminant`] when the value does not map
    /// to a known kind.
    pub fn read(reader: &mut BitReader) -> Result<Self, ProtocolError> {
        // Read the raw bits rather than a clamped ranged int so that a
        // genuinely invalid discriminant is detected, not silently capped.
        let raw = reader.read_bits(bits_for_range(0, Self::MAX_DISCRIMINANT))?;
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(ProtocolError::InvalidDiscriminant {
                value: raw,
                max: Self::MAX_DISCRIMINANT as u32,
            })
    }
}

// ---------------------------------------------------------------------------
// EventData
// ---------------------------------------------------------------------------

/// Typed payload identity of an event: enough to route the encode to the
/// right component or aggregate handler, and to compare two queued events
/// for deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventData {
    /// State of the component at `component`.
    ComponentState {
        /// Index into the entity's component list.
        component: usize,
    },
    /// Full inventory state.
    InventoryState,
    /// Condition/status state.
    Status,
    /// One repair requirement fixed.
    Repair {
        /// Index into the fix-requirement list.
        requirement: usize,
    },
    /// Trigger a status effect.
    ApplyStatusEffect {
        /// Action discriminant (OnUse etc.).
        action: u8,
        /// Optional target entity.
        target: Option<EntityId>,
    },
    /// An editable property changed.
    ChangeProperty {
        /// Index into the editable-property list.
        property: usize,
    },
}

impl EventData {
    /// The wire kind this payload belongs to.
    pub fn kind(&self) -> EventKind {
        match self {
            EventData::ComponentState { .. } => EventKind::ComponentState,
            EventData::InventoryState => EventKind::InventoryState,
            EventData::Status => EventKind::Status,
            EventData::Repair { .. } => EventKind::Repair,
            EventData::ApplyStatusEffect { .. } => EventKind::ApplyStatusEffect,
            EventData::ChangeProperty { .. } => EventKind::ChangeProperty,
        }
    }
}

// ---------------------------------------------------------------------------
// NetEntityEvent
// ---------------------------------------------------------------------------

/// A queued description of one state change for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetEntityEvent {
    /// The entity the change belongs to.
    pub entity: EntityId,
    /// Monotonically increasing event id, assigned at enqueue time.
    pub id: u16,
    /// Typed payload identity.
    pub data: EventData,
}

impl NetEntityEvent {
    /// Two events are duplicates when they address the same entity with
    /// structurally equal payload data.
    pub fn is_duplicate(&self, other: &NetEntityEvent) -> bool {
        self.entity == other.entity && self.data == other.data
    }
}

// ---------------------------------------------------------------------------
// EntityEventManager
// ---------------------------------------------------------------------------

/// Outgoing event queue for one peer.
///
/// Events are enqueued during the mutation phase of a tick and drained by
/// a dedicated flush step; incoming messages are applied before the next
/// mutation phase. Nothing here blocks or suspends.
#[derive(Debug, Default)]
pub struct EntityEventManager {
    events: Vec<NetEntityEvent>,
    next_id: u16,
}

impl EntityEventManager {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues an event unless an equal-payload event for the same
    /// entity is already queued. Returns `true` if the event was queued.
    pub fn create_event(&mut self, entity: EntityId, data: EventData) -> bool {
        let candidate = NetEntityEvent {
            entity,
            id: self.next_id,
            data,
        };
        if self.events.iter().any(|e| e.is_duplicate(&candidate)) {
            tracing::trace!(entity = entity.0, "dropping duplicate entity event");
            return false;
        }
        self.next_id = self.next_id.wrapping_add(1);
        self.events.push(candidate);
        true
    }

    /// Number of currently queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drains the queue for transmission. Called once per tick by the
    /// flush step.
    pub fn flush(&mut self) -> Vec<NetEntityEvent> {
        std::mem::take(&mut self.events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_discriminant_roundtrip() {
        for kind in EventKind::ALL {
            let mut w = BitWriter::new();
            kind.write(&mut w);
            let bytes = w.into_bytes();
            let decoded = EventKind::read(&mut BitReader::new(&bytes)).unwrap();
            assert_eq!(decoded, kind);
        }
    }

    #[test]
    fn test_unknown_discriminant_rejected() {
        // 6 kinds need 3 bits; 6 and 7 are unused patterns.
        let mut w = BitWriter::new();
        w.write_bits(7, 3);
        let bytes = w.into_bytes();
        let err = EventKind::read(&mut BitReader::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::InvalidDiscriminant { value: 7, max: 5 }
        );
    }

    #[test]
    fn test_duplicate_events_collapse() {
        let mut mgr = EntityEventManager::new();
        let entity = EntityId(3);

        assert!(mgr.create_event(entity, EventData::ComponentState { component: 1 }));
        assert!(!mgr.create_event(entity, EventData::ComponentState { component: 1 }));
        assert_eq!(mgr.len(), 1);

        let flushed = mgr.flush();
        assert_eq!(flushed.len(), 1);
        assert!(mgr.is_empty());
    }

    #[test]
    fn test_different_payloads_both_queue() {
        let mut mgr = EntityEventManager::new();
        let entity = EntityId(3);

        assert!(mgr.create_event(entity, EventData::ComponentState { component: 0 }));
        assert!(mgr.create_event(entity, EventData::ComponentState { component: 1 }));
        assert!(mgr.create_event(entity, EventData::Status));
        assert_eq!(mgr.len(), 3);
    }

    #[test]
    fn test_same_payload_different_entity_both_queue() {
        let mut mgr = EntityEventManager::new();
        assert!(mgr.create_event(EntityId(1), EventData::Status));
        assert!(mgr.create_event(EntityId(2), EventData::Status));
        assert_eq!(mgr.len(), 2);
    }

    #[test]
    fn test_dedup_resets_after_flush() {
        let mut mgr = EntityEventManager::new();
        let entity = EntityId(9);

        mgr.create_event(entity, EventData::Status);
        mgr.flush();

        // A fresh tick may legitimately resend the same state change.
        assert!(mgr.create_event(entity, EventData::Status));
    }

    #[test]
    fn test_event_ids_increase() {
        let mut mgr = EntityEventManager::new();
        mgr.create_event(EntityId(1), EventData::Status);
        mgr.create_event(EntityId(2), EventData::Status);
        let flushed = mgr.flush();
        assert_eq!(flushed[0].id + 1, flushed[1].id);
    }
}
