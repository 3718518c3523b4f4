//! Queued entity spawning and removal.
//!
//! Spawns and removals are never applied immediately: they are queued and
//! drained once per tick so that in-flight iteration over the item list
//! is never starved by mid-tick mutation. Only the authoritative peer
//! queues; each drained entry produces one spawn/removal wire message.

use std::collections::VecDeque;

use tracing::trace;
use trench_net::{Authority, EntityId};

/// A queued request to instantiate a prefab.
#[derive(Debug, Clone, PartialEq)]
pub enum SpawnRequest {
    /// Spawn into an inventory owned by another entity.
    InInventory {
        /// Prefab name.
        prefab: String,
        /// Owning entity.
        owner: EntityId,
        /// Requested slot, or `None` for first free.
        slot: Option<u8>,
    },
    /// Spawn loose in the world.
    AtPosition {
        /// Prefab name.
        prefab: String,
        /// World position.
        position: (f32, f32),
        /// Owning structure, if any.
        structure: Option<EntityId>,
    },
}

impl SpawnRequest {
    /// The prefab this request instantiates.
    pub fn prefab(&self) -> &str {
        match self {
            SpawnRequest::InInventory { prefab, .. } => prefab,
            SpawnRequest::AtPosition { prefab, .. } => prefab,
        }
    }
}

/// The spawn/removal queues.
#[derive(Debug, Default)]
pub struct EntitySpawner {
    spawn_queue: VecDeque<SpawnRequest>,
    remove_queue: VecDeque<EntityId>,
}

impl EntitySpawner {
    /// Creates empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a spawn. Clients are not authoritative over spawning, so
    /// their requests are dropped.
    pub fn add_to_spawn_queue(&mut self, request: SpawnRequest, authority: Authority) {
        if authority == Authority::Client {
            trace!(prefab = request.prefab(), "dropping client-side spawn request");
            return;
        }
        self.spawn_queue.push_back(request);
    }

    /// Queues a removal. Client requests are dropped.
    pub fn add_to_remove_queue(&mut self, entity: EntityId, authority: Authority) {
        if authority == Authority::Client {
            trace!(entity = entity.0, "dropping client-side removal request");
            return;
        }
        if !self.remove_queue.contains(&entity) {
            self.remove_queue.push_back(entity);
        }
    }

    /// Drains the spawn queue.
    pub fn drain_spawns(&mut self) -> Vec<SpawnRequest> {
        self.spawn_queue.drain(..).collect()
    }

    /// Drains the removal queue.
    pub fn drain_removals(&mut self) -> Vec<EntityId> {
        self.remove_queue.drain(..).collect()
    }

    /// Whether anything is queued.
    pub fn is_empty(&self) -> bool {
        self.spawn_queue.is_empty() && self.remove_queue.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
