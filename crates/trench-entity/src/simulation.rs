//! The single-threaded per-tick simulation loop.
//!
//! Each tick: deferred signals from the previous tick are delivered,
//! scheduled effects apply, items update (enqueuing events), and the
//! spawn/removal queues drain into wire messages. The network layer then
//! flushes the event queue and applies incoming messages before the next
//! tick's mutation phase. Nothing blocks or suspends.

use tracing::warn;
use trench_net::{
    Authority, EntityEventManager, EntityId, ItemSpawnData, SpawnOrRemove, SpawnOrigin,
};

use crate::item::Item;
use crate::registry::{IdAllocator, PrefabRegistry};
use crate::scheduler::{MAX_SIGNAL_DEPTH, PendingSignal, Scheduler};
use crate::spawner::{EntitySpawner, SpawnRequest};

/// The simulation context owning all live items.
pub struct Simulation {
    authority: Authority,
    correction_window: u32,
    /// Interval in ticks between periodic full-state broadcasts for
    /// drift correction. 0 disables them.
    drift_interval: u32,
    tick_count: u64,
    items: Vec<Item>,
    /// Injected prefab registry.
    pub registry: PrefabRegistry,
    allocator: IdAllocator,
    /// Spawn/removal queues.
    pub spawner: EntitySpawner,
    /// Per-tick task queue.
    pub scheduler: Scheduler,
    /// Outgoing entity event queue.
    pub events: EntityEventManager,
    sounds: Vec<String>,
}

impl Simulation {
    /// Creates an empty simulation for the given role.
    pub fn new(authority: Authority, correction_window: u32) -> Self {
        Self {
            authority,
            correction_window,
            drift_interval: 0,
            tick_count: 0,
            items: Vec::new(),
            registry: PrefabRegistry::new(),
            allocator: IdAllocator::new(),
            spawner: EntitySpawner::new(),
            scheduler: Scheduler::new(),
            events: EntityEventManager::new(),
            sounds: Vec::new(),
        }
    }

    /// Enables periodic full-state broadcasts every `ticks` ticks
    /// (server only).
    pub fn with_drift_interval(mut self, ticks: u32) -> Self {
        self.drift_interval = ticks;
        self
    }

    /// This peer's role.
    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Number of live items.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Borrows an item by id.
    pub fn item(&self, id: EntityId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    /// Mutably borrows an item by id.
    pub fn item_mut(&mut self, id: EntityId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// All live items.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Inserts a fully built item (used by tests and by the client-side
    /// spawn path, where the id came from the server).
    pub fn insert_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Drains queued sound cues for the external audio service.
    pub fn take_sounds(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sounds)
    }

    // -----------------------------------------------------------------------
    // Signals
    // -----------------------------------------------------------------------

    /// Delivers a signal to an item's components. A chain deeper than
    /// [`MAX_SIGNAL_DEPTH`] hops is continued next tick instead of
    /// recursing further.
    pub fn send_signal(&mut self, target: EntityId, connection: &str, value: &str, depth: u8) {
        if depth > MAX_SIGNAL_DEPTH {
            self.scheduler.defer_signal(PendingSignal {
                target,
                connection: connection.to_string(),
                value: value.to_string(),
            });
            return;
        }
        let authority = self.authority;
        let window = self.correction_window;
        let Some(index) = self.items.iter().position(|i| i.id == target) else {
            warn!(entity = target.0, "signal to unknown entity dropped");
            return;
        };
        let mut sounds =
            self.items[index].receive_signal(connection, value, authority, window, &mut self.events);
        self.sounds.append(&mut sounds);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Runs one simulation tick. Returns the spawn/removal messages the
    /// authoritative peer must broadcast this tick; entity events stay in
    /// [`Self::events`] until the flush step drains them.
    pub fn tick(&mut self, dt: f32) -> Vec<SpawnOrRemove> {
        // Signal chains deferred by the depth limit continue first.
        for signal in self.scheduler.take_deferred_signals() {
            self.send_signal(signal.target, &signal.connection, &signal.value, 0);
        }

        // Scheduled effects-over-time become condition changes.
        let authority = self.authority;
        for (id, delta) in self.scheduler.tick(dt) {
            if let Some(index) = self.items.iter().position(|i| i.id == id) {
                let next = self.items[index].condition() + delta;
                self.items[index].set_condition(
                    next,
                    authority,
                    &mut self.events,
                    &mut self.scheduler,
                );
            }
        }

        // Component simulation.
        let window = self.correction_window;
        for index in 0..self.items.len() {
            let mut sounds = self.items[index].update(dt, authority, window, &mut self.events);
            self.sounds.append(&mut sounds);
        }

        // Periodic drift correction: rebroadcast confirmed state even if
        // nothing changed, so clients that missed an event converge.
        self.tick_count += 1;
        if authority == Authority::Server
            && self.drift_interval > 0
            && self.tick_count.is_multiple_of(u64::from(self.drift_interval))
        {
            for index in 0..self.items.len() {
                let id = self.items[index].id;
                self.events.create_event(id, trench_net::EventData::Status);
                for component in 0..self.items[index].component_count() {
                    if self.items[index]
                        .component(component)
                        .is_some_and(|c| c.server_serializable().is_some())
                    {
                        self.events
                            .create_event(id, trench_net::EventData::ComponentState { component });
                    }
                }
            }
        }

        // Spawn/removal queues drain last, so new items first update on
        // the following tick.
        let mut messages = Vec::new();
        for request in self.spawner.drain_spawns() {
            if let Some(message) = self.apply_spawn_request(&request) {
                messages.push(message);
            }
        }
        for entity in self.spawner.drain_removals() {
            for removed in self.remove_with_contents(entity) {
                messages.push(SpawnOrRemove::Remove(removed));
            }
        }
        messages
    }

    /// Instantiates one queued spawn and produces its wire message.
    fn apply_spawn_request(&mut self, request: &SpawnRequest) -> Option<SpawnOrRemove> {
        let Some(prefab) = self.registry.get(request.prefab()).cloned() else {
            warn!(prefab = request.prefab(), "spawn of unknown prefab dropped");
            return None;
        };
        let id = self.allocator.allocate();
        let mut item = prefab.instantiate(id);

        let origin = match *request {
            SpawnRequest::InInventory { owner, slot, .. } => {
                match self.item_mut(owner).and_then(|o| o.inventory.as_mut()) {
                    Some(inventory) => {
                        if !inventory.try_put_item(id, slot.map(usize::from)) {
                            warn!(entity = id.0, owner = owner.0, "spawn target inventory full");
                        }
                    }
                    None => {
                        warn!(owner = owner.0, "spawn into missing inventory");
                    }
                }
                SpawnOrigin::Inventory { owner, slot }
            }
            SpawnRequest::AtPosition {
                position,
                structure,
                ..
            } => {
                item.position = position;
                SpawnOrigin::World {
                    position,
                    structure,
                }
            }
        };

        let tag_extension = (!item.tags.is_empty()).then(|| item.tags.join(","));
        let data = ItemSpawnData {
            prefab: item.prefab_name.clone(),
            id,
            origin,
            tag_extension,
        };
        self.items.push(item);
        Some(SpawnOrRemove::Spawn(data))
    }

    /// Removes an item and, recursively, everything it contains. Returns
    /// the removed ids in removal order.
    fn remove_with_contents(&mut self, entity: EntityId) -> Vec<EntityId> {
        let mut removed = Vec::new();
        let mut queue = vec![entity];
        while let Some(id) = queue.pop() {
            let Some(index) = self.items.iter().position(|i| i.id == id) else {
                continue;
            };
            if let Some(inventory) = &self.items[index].inventory {
                queue.extend(inventory.items());
            }
            self.items.remove(index);
            removed.push(id);
        }
        removed
    }

    // -----------------------------------------------------------------------
    // Applying remote spawn messages
    // -----------------------------------------------------------------------

    /// Applies a spawn/removal message from the authoritative peer.
    pub fn apply_spawn_message(&mut self, message: &SpawnOrRemove) {
        match message {
            SpawnOrRemove::Remove(id) => {
                if !self.items.iter().any(|i| i.id == *id) {
                    warn!(entity = id.0, "removal of unknown entity dropped");
                    return;
                }
                self.items.retain(|i| i.id != *id);
            }
            SpawnOrRemove::Spawn(data) => {
                let Some(prefab) = self.registry.get(&data.prefab).cloned() else {
                    warn!(prefab = data.prefab, "spawn of unknown prefab dropped");
                    return;
                };
                let mut item = prefab.instantiate(data.id);
                if let Some(tags) = &data.tag_extension {
                    item.tags = tags.split(',').map(str::to_string).collect();
                }
                match data.origin {
                    SpawnOrigin::Inventory { owner, slot } => {
                        if let Some(inventory) =
                            self.item_mut(owner).and_then(|o| o.inventory.as_mut())
                        {
                            inventory.try_put_item(data.id, slot.map(usize::from));
                        }
                    }
                    SpawnOrigin::World { position, .. } => {
                        item.position = position;
                    }
                }
                self.items.push(item);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
