//! Prefab definitions and the process-scoped prefab registry.
//!
//! The registry has an explicit lifecycle (construct, register,
//! unregister) and is injected into the simulation context rather than
//! accessed as an ambient global, so tests can build isolated instances.
//! Entity ids come from an [`IdAllocator`]: assigned locally in
//! single-player, by the authoritative peer in multiplayer.

use std::collections::HashMap;

use trench_net::EntityId;

use crate::components::door::Door;
use crate::components::power::PowerContainer;
use crate::components::pump::Pump;
use crate::inventory::Inventory;
use crate::item::{FixRequirement, Item};
use crate::properties::{Property, PropertyTable};
use crate::effects::StatusEffect;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A prefab with this name is already registered.
    #[error("duplicate prefab name: {0}")]
    DuplicateName(String),

    /// No prefab with this name is registered.
    #[error("unknown prefab: {0}")]
    UnknownPrefab(String),
}

// ---------------------------------------------------------------------------
// ComponentSpec
// ---------------------------------------------------------------------------

/// Declarative component description inside a prefab.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentSpec {
    /// An openable door.
    Door {
        /// Initial open state.
        starts_open: bool,
    },
    /// A water pump.
    Pump {
        /// Maximum throughput at 100% flow.
        max_flow: f32,
    },
    /// A battery bank.
    PowerContainer {
        /// Total capacity.
        capacity: f32,
        /// Maximum recharge speed.
        max_recharge_speed: f32,
        /// Maximum grid output.
        max_output: f32,
    },
}

impl ComponentSpec {
    /// Instantiates the runtime component.
    fn instantiate(&self) -> Box<dyn crate::components::Component> {
        match self {
            ComponentSpec::Door { starts_open } => Box::new(Door::new(*starts_open)),
            ComponentSpec::Pump { max_flow } => Box::new(Pump::new(*max_flow)),
            ComponentSpec::PowerContainer {
                capacity,
                max_recharge_speed,
                max_output,
            } => Box::new(PowerContainer::new(
                *capacity,
                *max_recharge_speed,
                *max_output,
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemPrefab
// ---------------------------------------------------------------------------

/// Everything needed to instantiate an item.
#[derive(Debug, Clone, Default)]
pub struct ItemPrefab {
    /// Unique prefab name.
    pub name: String,
    /// Initial tag set.
    pub tags: Vec<String>,
    /// Component list, in wire order.
    pub components: Vec<ComponentSpec>,
    /// Property table template.
    pub properties: Vec<Property>,
    /// Fix requirement names.
    pub fix_requirements: Vec<String>,
    /// Status effects attached to every instance.
    pub status_effects: Vec<StatusEffect>,
    /// Inventory capacity, if the item contains others.
    pub inventory_capacity: Option<usize>,
}

impl ItemPrefab {
    /// Instantiates an item with the given id.
    pub fn instantiate(&self, id: EntityId) -> Item {
        let mut item = Item::new(id, self.name.clone());
        item.tags = self.tags.clone();
        for spec in &self.components {
            item.add_component(spec.instantiate());
        }
        item.properties = PropertyTable::from_entries(self.properties.clone());
        item.fix_requirements = self
            .fix_requirements
            .iter()
            .map(FixRequirement::new)
            .collect();
        item.status_effects = self.status_effects.clone();
        item.inventory = self.inventory_capacity.map(Inventory::new);
        item
    }
}

// ---------------------------------------------------------------------------
// PrefabRegistry
// ---------------------------------------------------------------------------

/// Name-keyed prefab store with explicit lifecycle.
#[derive(Debug, Default)]
pub struct PrefabRegistry {
    prefabs: HashMap<String, ItemPrefab>,
}

impl PrefabRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a prefab.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register(&mut self, prefab: ItemPrefab) -> Result<(), RegistryError> {
        if self.prefabs.contains_key(&prefab.name) {
            return Err(RegistryError::DuplicateName(prefab.name));
        }
        self.prefabs.insert(prefab.name.clone(), prefab);
        Ok(())
    }

    /// Removes a prefab by name.
    pub fn unregister(&mut self, name: &str) -> Option<ItemPrefab> {
        self.prefabs.remove(name)
    }

    /// Looks up a prefab by name.
    pub fn get(&self, name: &str) -> Option<&ItemPrefab> {
        self.prefabs.get(name)
    }

    /// Number of registered prefabs.
    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// IdAllocator
// ---------------------------------------------------------------------------

/// Monotonic 16-bit entity id source. Id 0 is reserved as "none".
#[derive(Debug)]
pub struct IdAllocator {
    next: u16,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    /// Creates an allocator starting at id 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id, skipping the reserved 0 on wrap.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.checked_add(1).unwrap_or(1);
        id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertyValue;

    fn pump_prefab() -> ItemPrefab {
        ItemPrefab {
            name: "bilge_pump".into(),
            tags: vec!["machine".into()],
            components: vec![ComponentSpec::Pump { max_flow: 80.0 }],
            properties: vec![Property {
                name: "label".into(),
                value: PropertyValue::Text("bilge".into()),
                editable: true,
            }],
            fix_requirements: vec!["mechanical".into()],
            status_effects: Vec::new(),
            inventory_capacity: None,
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = PrefabRegistry::new();
        assert!(registry.is_empty());

        registry.register(pump_prefab()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("bilge_pump").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = PrefabRegistry::new();
        registry.register(pump_prefab()).unwrap();
        let err = registry.register(pump_prefab()).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(_)));
    }

    #[test]
    fn test_unregister() {
        let mut registry = PrefabRegistry::new();
        registry.register(pump_prefab()).unwrap();
        assert!(registry.unregister("bilge_pump").is_some());
        assert!(registry.unregister("bilge_pump").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_instantiate_builds_full_item() {
        let prefab = ItemPrefab {
            inventory_capacity: Some(2),
            ..pump_prefab()
        };
        let item = prefab.instantiate(EntityId(5));

        assert_eq!(item.id, EntityId(5));
        assert_eq!(item.prefab_name, "bilge_pump");
        assert_eq!(item.tags, vec!["machine".to_string()]);
        assert_eq!(item.component_count(), 1);
        assert_eq!(item.component(0).unwrap().type_name(), "pump");
        assert_eq!(item.fix_requirements.len(), 1);
        assert_eq!(item.inventory.as_ref().unwrap().capacity(), 2);
        assert_eq!(item.condition(), 100.0);
    }

    #[test]
    fn test_id_allocator_skips_zero() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.allocate(), EntityId(1));
        assert_eq!(alloc.allocate(), EntityId(2));

        let mut wrapping = IdAllocator { next: u16::MAX };
        assert_eq!(wrapping.allocate(), EntityId(u16::MAX));
        // Wraps back to 1, never handing out the reserved 0.
        assert_eq!(wrapping.allocate(), EntityId(1));
    }
}
