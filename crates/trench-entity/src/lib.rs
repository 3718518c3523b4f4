//! Replicated entity model: the item aggregate and its components.
//!
//! An [`Item`] owns an ordered list of polymorphic components, an optional
//! inventory, a property table, a condition scalar, and a tag set. State
//! changes become queued network events routed through the aggregate: a
//! component event is delegated to the exact component it addresses, while
//! inventory, status, repair, and property events are handled by the
//! aggregate itself. The [`Simulation`] drives the single-threaded
//! per-tick loop: mutate, enqueue, flush, apply incoming.

pub mod components;
mod effects;
mod inventory;
mod item;
mod properties;
mod registry;
mod scheduler;
mod simulation;
mod spawner;

pub use components::{ClientSerializable, Component, ComponentCtx, ServerSerializable};
pub use components::door::Door;
pub use components::power::PowerContainer;
pub use components::pump::{Pump, PumpState};
pub use effects::{ActionType, StatusEffect};
pub use inventory::Inventory;
pub use item::{FixRequirement, Item};
pub use properties::{Property, PropertyTable, PropertyValue};
pub use registry::{ComponentSpec, IdAllocator, ItemPrefab, PrefabRegistry, RegistryError};
pub use scheduler::{MAX_SIGNAL_DEPTH, PendingSignal, Scheduler};
pub use simulation::Simulation;
pub use spawner::{EntitySpawner, SpawnRequest};
