//! The replicated item aggregate.
//!
//! An item owns its components, property table, optional inventory,
//! condition scalar, and tag set, and routes network events between the
//! wire and the right handler: component events are delegated to the
//! exact component they address, everything else is aggregate-level.
//! Condition is server-authoritative; clients only ever see it through
//! the confirmed network path.

use tracing::warn;
use trench_net::{
    Authority, BitReader, BitWriter, EntityEventManager, EntityId, EventData, EventKind,
    ProtocolError,
};

use crate::components::{Component, ComponentCtx};
use crate::effects::{ActionType, StatusEffect};
use crate::inventory::Inventory;
use crate::properties::PropertyTable;
use crate::scheduler::Scheduler;

/// Condition change that triggers a status broadcast.
const CONDITION_SYNC_THRESHOLD: f32 = 1.0;

// ---------------------------------------------------------------------------
// FixRequirement
// ---------------------------------------------------------------------------

/// One repair step needed to restore a broken item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixRequirement {
    /// Display name (e.g. the needed skill or tool).
    pub name: String,
    /// Whether this step has been completed.
    pub fixed: bool,
}

impl FixRequirement {
    /// Creates an unfixed requirement.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A replicated game entity.
pub struct Item {
    /// Stable entity id.
    pub id: EntityId,
    /// Name of the prefab this item was instantiated from.
    pub prefab_name: String,
    /// Free-form tag set.
    pub tags: Vec<String>,
    components: Vec<Box<dyn Component>>,
    /// Named typed properties.
    pub properties: PropertyTable,
    condition: f32,
    last_sent_condition: f32,
    /// Repair steps pending while broken.
    pub fix_requirements: Vec<FixRequirement>,
    /// Effects fired by triggers on this item.
    pub status_effects: Vec<StatusEffect>,
    /// Contained-item storage, if the prefab defines one.
    pub inventory: Option<Inventory>,
    /// World position, driven by the external physics service.
    pub position: (f32, f32),
}

impl Item {
    /// Creates a bare item at full condition.
    pub fn new(id: EntityId, prefab_name: impl Into<String>) -> Self {
        Self {
            id,
            prefab_name: prefab_name.into(),
            tags: Vec::new(),
            components: Vec::new(),
            properties: PropertyTable::new(),
            condition: 100.0,
            last_sent_condition: 100.0,
            fix_requirements: Vec::new(),
            status_effects: Vec::new(),
            inventory: None,
            position: (0.0, 0.0),
        }
    }

    /// Appends a component. Component order is part of the wire contract.
    pub fn add_component(&mut self, component: Box<dyn Component>) {
        self.components.push(component);
    }

    /// Number of components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Borrows the component at `index`.
    pub fn component(&self, index: usize) -> Option<&dyn Component> {
        self.components.get(index).map(Box::as_ref)
    }

    /// Mutably borrows the component at `index`.
    pub fn component_mut(&mut self, index: usize) -> Option<&mut Box<dyn Component>> {
        self.components.get_mut(index)
    }

    /// Current condition in `[0, 100]`.
    pub fn condition(&self) -> f32 {
        self.condition
    }

    /// Whether the item is broken.
    pub fn is_broken(&self) -> bool {
        self.condition <= 0.0
    }

    // -----------------------------------------------------------------------
    // Condition
    // -----------------------------------------------------------------------

    /// Sets the condition. Server-authoritative: client calls are silently
    /// ignored (only the confirmed network path mutates client state).
    /// A crossing to zero fires the broken effects and resets all fix
    /// requirements; reaching the sync threshold (or exactly 0/100)
    /// enqueues a status broadcast.
    pub fn set_condition(
        &mut self,
        value: f32,
        authority: Authority,
        events: &mut EntityEventManager,
        scheduler: &mut Scheduler,
    ) {
        if authority == Authority::Client || !value.is_finite() {
            return;
        }

        let prev = self.condition;
        self.condition = value.clamp(0.0, 100.0);
        if self.condition == 0.0 && prev > 0.0 {
            self.fire_broken(scheduler);
        }

        if self.last_sent_condition != self.condition
            && ((self.last_sent_condition - self.condition).abs() > CONDITION_SYNC_THRESHOLD
                || self.condition == 0.0
                || self.condition == 100.0)
        {
            events.create_event(self.id, EventData::Status);
            self.last_sent_condition = self.condition;
        }
    }

    /// Zero-crossing side effects: broken-state effects plus a reset of
    /// every outstanding fix requirement. A steady state at zero must not
    /// re-fire this, so callers gate on the crossing.
    fn fire_broken(&mut self, scheduler: &mut Scheduler) {
        for effect in self
            .status_effects
            .iter()
            .filter(|e| e.action == ActionType::OnBroken)
            .cloned()
            .collect::<Vec<_>>()
        {
            self.apply_effect(&effect, scheduler);
        }
        for requirement in &mut self.fix_requirements {
            requirement.fixed = false;
        }
    }

    /// Applies one effect: immediately, or via the scheduler when it has
    /// a duration.
    fn apply_effect(&mut self, effect: &StatusEffect, scheduler: &mut Scheduler) {
        match effect.duration {
            Some(duration) => {
                scheduler.add_condition_task(self.id, effect.condition_delta, duration)
            }
            // Direct field change: effect application must not recurse
            // into the broken trigger.
            None => self.condition = (self.condition + effect.condition_delta).clamp(0.0, 100.0),
        }
    }

    /// Triggers all effects bound to `action`.
    pub fn apply_status_effects(&mut self, action: ActionType, scheduler: &mut Scheduler) {
        for effect in self
            .status_effects
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect::<Vec<_>>()
        {
            self.apply_effect(&effect, scheduler);
        }
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Per-tick update: steps every component, turning sync requests into
    /// component events. Returns queued sound cues for the audio service.
    pub fn update(
        &mut self,
        dt: f32,
        authority: Authority,
        correction_window: u32,
        events: &mut EntityEventManager,
    ) -> Vec<String> {
        let mut sounds = Vec::new();
        for index in 0..self.components.len() {
            let mut ctx = ComponentCtx::new(authority, correction_window);
            self.components[index].update(dt, &mut ctx);
            if ctx.sync_requested() && authority == Authority::Server {
                events.create_event(self.id, EventData::ComponentState { component: index });
            }
            sounds.append(&mut ctx.take_sounds());
        }
        sounds
    }

    /// Delivers a signal to every component. Returns queued sound cues.
    pub fn receive_signal(
        &mut self,
        connection: &str,
        value: &str,
        authority: Authority,
        correction_window: u32,
        events: &mut EntityEventManager,
    ) -> Vec<String> {
        let mut sounds = Vec::new();
        for index in 0..self.components.len() {
            let mut ctx = ComponentCtx::new(authority, correction_window);
            self.components[index].receive_signal(connection, value, &mut ctx);
            if ctx.sync_requested() && authority == Authority::Server {
                events.create_event(self.id, EventData::ComponentState { component: index });
            }
            sounds.append(&mut ctx.take_sounds());
        }
        sounds
    }

    // -----------------------------------------------------------------------
    // Server → client
    // -----------------------------------------------------------------------

    /// Encodes one queued event for transmission to clients.
    pub fn server_write_event(
        &self,
        data: &EventData,
        writer: &mut BitWriter,
    ) -> Result<(), ProtocolError> {
        data.kind().write(writer);
        match data {
            EventData::ComponentState { component } => {
                let count = self.components.len();
                if *component >= count {
                    return Err(ProtocolError::ComponentIndexOutOfRange {
                        index: *component,
                        count,
                    });
                }
                writer.write_ranged_int(*component as i32, 0, count as i32 - 1);
                self.components[*component]
                    .server_serializable()
                    .ok_or(ProtocolError::ComponentNotSerializable { index: *component })?
                    .server_write(writer);
            }
            EventData::InventoryState => {
                self.inventory
                    .as_ref()
                    .ok_or(ProtocolError::Unsupported {
                        what: "inventory state on an item without inventory",
                    })?
                    .write_state(writer);
            }
            EventData::Status => {
                // Clamp a damaged-but-alive item above the lowest
                // quantization step so it cannot round down to broken.
                let wire_condition = if self.condition > 0.0 {
                    self.condition.max(0.5)
                } else {
                    0.0
                };
                writer.write_ranged_f32(wire_condition, 0.0, 100.0, 8);
                if self.condition <= 0.0 {
                    for requirement in &self.fix_requirements {
                        writer.write_bool(requirement.fixed);
                    }
                }
            }
            EventData::ApplyStatusEffect { action, target } => {
                writer.write_ranged_int(
                    i32::from(*action),
                    0,
                    ActionType::ALL.len() as i32 - 1,
                );
                writer.write_u16(target.map_or(0, |t| t.0));
            }
            EventData::ChangeProperty { property } => {
                self.properties.write_change(writer, *property)?;
            }
            EventData::Repair { .. } => {
                return Err(ProtocolError::Unsupported {
                    what: "repair events only travel client to server",
                });
            }
        }
        Ok(())
    }

    /// Decodes and applies one confirmed event from the server. A failed
    /// decode applies nothing.
    pub fn client_read_event(
        &mut self,
        reader: &mut BitReader,
        correction_window: u32,
        scheduler: &mut Scheduler,
    ) -> Result<(), ProtocolError> {
        let kind = EventKind::read(reader)?;
        match kind {
            EventKind::ComponentState => {
                let count = self.components.len();
                if count == 0 {
                    return Err(ProtocolError::ComponentIndexOutOfRange { index: 0, count });
                }
                let index = reader.read_ranged_int(0, count as i32 - 1)? as usize;
                let mut ctx = ComponentCtx::new(Authority::Client, correction_window);
                self.components[index]
                    .server_serializable_mut()
                    .ok_or(ProtocolError::ComponentNotSerializable { index })?
                    .client_read(reader, &mut ctx)?;
            }
            EventKind::InventoryState => {
                self.inventory
                    .as_mut()
                    .ok_or(ProtocolError::Unsupported {
                        what: "inventory state on an item without inventory",
                    })?
                    .read_state(reader)?;
            }
            EventKind::Status => {
                // Decode the whole payload before touching any state.
                let value = reader.read_ranged_f32(0.0, 100.0, 8)?;
                let flags = if !self.fix_requirements.is_empty() && value <= 0.0 {
                    let mut flags = Vec::with_capacity(self.fix_requirements.len());
                    for _ in 0..self.fix_requirements.len() {
                        flags.push(reader.read_bool()?);
                    }
                    Some(flags)
                } else {
                    None
                };

                let prev = self.condition;
                self.condition = value;
                if value == 0.0 && prev > 0.0 {
                    // Confirmed zero-crossing: fire exactly once.
                    self.fire_broken(scheduler);
                }

                match flags {
                    // Wire flags win over the crossing reset.
                    Some(flags) => {
                        for (requirement, fixed) in self.fix_requirements.iter_mut().zip(flags) {
                            requirement.fixed = fixed;
                        }
                    }
                    // A live item has nothing outstanding to fix.
                    None => {
                        for requirement in &mut self.fix_requirements {
                            requirement.fixed = true;
                        }
                    }
                }
            }
            EventKind::ApplyStatusEffect => {
                let raw = reader.read_ranged_int(0, ActionType::ALL.len() as i32 - 1)?;
                let action = ActionType::from_discriminant(raw as u8).ok_or(
                    ProtocolError::InvalidDiscriminant {
                        value: raw as u32,
                        max: ActionType::ALL.len() as u32 - 1,
                    },
                )?;
                let _target = reader.read_u16()?;
                self.apply_status_effects(action, scheduler);
            }
            EventKind::ChangeProperty => {
                self.properties.read_change(reader)?;
            }
            EventKind::Repair => {
                return Err(ProtocolError::Unsupported {
                    what: "repair events only travel client to server",
                });
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Client → server
    // -----------------------------------------------------------------------

    /// Encodes one queued event for transmission to the server.
    pub fn client_write_event(
        &self,
        data: &EventData,
        writer: &mut BitWriter,
    ) -> Result<(), ProtocolError> {
        data.kind().write(writer);
        match data {
            EventData::ComponentState { component } => {
                let count = self.components.len();
                if *component >= count {
                    return Err(ProtocolError::ComponentIndexOutOfRange {
                        index: *component,
                        count,
                    });
                }
                writer.write_ranged_int(*component as i32, 0, count as i32 - 1);
                self.components[*component]
                    .client_serializable()
                    .ok_or(ProtocolError::ComponentNotSerializable { index: *component })?
                    .client_write(writer);
            }
            EventData::InventoryState => {
                self.inventory
                    .as_ref()
                    .ok_or(ProtocolError::Unsupported {
                        what: "inventory state on an item without inventory",
                    })?
                    .write_state(writer);
            }
            EventData::Repair { requirement } => {
                let count = self.fix_requirements.len();
                if *requirement >= count {
                    return Err(ProtocolError::PropertyIndexOutOfRange {
                        index: *requirement,
                        count,
                    });
                }
                if count > 1 {
                    writer.write_ranged_int(*requirement as i32, 0, count as i32 - 1);
                }
            }
            // The server applies the effect on the sender's behalf; no
            // payload is needed.
            EventData::ApplyStatusEffect { .. } => {}
            EventData::ChangeProperty { property } => {
                self.properties.write_change(writer, *property)?;
            }
            EventData::Status => {
                return Err(ProtocolError::Unsupported {
                    what: "condition is server-authoritative",
                });
            }
        }
        writer.pad_to_byte();
        Ok(())
    }

    /// Decodes and applies one client request on the server, enqueuing
    /// the resulting confirmed broadcasts.
    pub fn server_read_event(
        &mut self,
        reader: &mut BitReader,
        events: &mut EntityEventManager,
        scheduler: &mut Scheduler,
    ) -> Result<(), ProtocolError> {
        let kind = EventKind::read(reader)?;
        match kind {
            EventKind::ComponentState => {
                let count = self.components.len();
                if count == 0 {
                    return Err(ProtocolError::ComponentIndexOutOfRange { index: 0, count });
                }
                let index = reader.read_ranged_int(0, count as i32 - 1)? as usize;
                let mut ctx = ComponentCtx::new(Authority::Server, 0);
                self.components[index]
                    .client_serializable_mut()
                    .ok_or(ProtocolError::ComponentNotSerializable { index })?
                    .server_read(reader, &mut ctx)?;
                if ctx.sync_requested() {
                    events.create_event(self.id, EventData::ComponentState { component: index });
                }
            }
            EventKind::InventoryState => {
                self.inventory
                    .as_mut()
                    .ok_or(ProtocolError::Unsupported {
                        what: "inventory state on an item without inventory",
                    })?
                    .read_state(reader)?;
                events.create_event(self.id, EventData::InventoryState);
            }
            EventKind::Repair => {
                let count = self.fix_requirements.len();
                if count == 0 {
                    return Err(ProtocolError::Unsupported {
                        what: "repair on an item without fix requirements",
                    });
                }
                let index = if count > 1 {
                    reader.read_ranged_int(0, count as i32 - 1)? as usize
                } else {
                    0
                };
                self.fix_requirements[index].fixed = true;

                if self.condition <= 0.0 && self.fix_requirements.iter().all(|r| r.fixed) {
                    self.set_condition(100.0, Authority::Server, events, scheduler);
                } else {
                    events.create_event(self.id, EventData::Status);
                }
            }
            EventKind::ApplyStatusEffect => {
                self.apply_status_effects(ActionType::OnUse, scheduler);
                events.create_event(
                    self.id,
                    EventData::ApplyStatusEffect {
                        action: ActionType::OnUse.discriminant(),
                        target: None,
                    },
                );
            }
            EventKind::ChangeProperty => {
                let changed = self.properties.read_change(reader)?;
                events.create_event(self.id, EventData::ChangeProperty { property: changed });
            }
            EventKind::Status => {
                // Authority conflict: a client attempting to write
                // condition directly. Drop it without applying anything.
                warn!(entity = self.id.0, "client attempted to write condition");
                return Err(ProtocolError::Unsupported {
                    what: "condition is server-authoritative",
                });
            }
        }
        reader.align_to_byte();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
