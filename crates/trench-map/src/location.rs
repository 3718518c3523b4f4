//! Locations, connections, and per-connection missions.
//!
//! Locations are created once during generation with a random type and
//! name and are never destroyed; the only mutation during a session is
//! the one-way `Undiscovered → Discovered` flip as the player travels.
//! Connections likewise only flip `NotPassed → Passed`. Mission selection
//! is reseeded per connection from both endpoints' positions plus a
//! completion counter, making it reproducible without storing mission
//! state.

use glam::Vec2;
use trench_rand::SyncedRng;

use crate::graph::{PrimaryNodeId, SecondaryNodeId};

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Index of a location in the map arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(pub usize);

/// Index of a connection in the map arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub usize);

// ---------------------------------------------------------------------------
// LocationType
// ---------------------------------------------------------------------------

/// Category of a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationType {
    /// Fortified trading post.
    Outpost,
    /// Larger civilian settlement.
    Settlement,
    /// Science installation.
    ResearchStation,
    /// Resource extraction site.
    MiningColony,
    /// Abandoned, usually hostile.
    Ruins,
}

impl LocationType {
    const ALL: [LocationType; 5] = [
        LocationType::Outpost,
        LocationType::Settlement,
        LocationType::ResearchStation,
        LocationType::MiningColony,
        LocationType::Ruins,
    ];

    /// Draws a random type from the synced stream.
    pub fn random(rng: &mut SyncedRng) -> Self {
        Self::ALL[rng.range_i32(0, Self::ALL.len() as i32 - 1) as usize]
    }
}

const NAME_PREFIXES: [&str; 8] = [
    "Aphotic", "Benthic", "Cold", "Drowned", "Hadal", "Pale", "Silent", "Sunken",
];

const NAME_SUFFIXES: [&str; 8] = [
    "Anchorage", "Basin", "Hollow", "Rest", "Ridge", "Shelf", "Vent", "Warren",
];

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A named point of interest bound to a node's map position.
#[derive(Debug, Clone)]
pub struct Location {
    /// Display name.
    pub name: String,
    /// Category.
    pub location_type: LocationType,
    /// Map position (exact node position; used for deduplication).
    pub position: Vec2,
    /// One-way discovery flag.
    pub discovered: bool,
    /// Incident connections.
    pub connections: Vec<ConnectionId>,
}

impl Location {
    /// Creates a location with a random type and name at `position`.
    /// Draw order: one draw for the type, two for the name.
    pub fn create_random(position: Vec2, rng: &mut SyncedRng) -> Self {
        let location_type = LocationType::random(rng);
        let prefix = NAME_PREFIXES[rng.range_i32(0, NAME_PREFIXES.len() as i32 - 1) as usize];
        let suffix = NAME_SUFFIXES[rng.range_i32(0, NAME_SUFFIXES.len() as i32 - 1) as usize];
        Self {
            name: format!("{prefix} {suffix}"),
            location_type,
            position,
            discovered: false,
            connections: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mission
// ---------------------------------------------------------------------------

/// What the player is asked to do along a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionKind {
    /// Recover wreckage.
    Salvage,
    /// Hunt something large.
    Monster,
    /// Haul freight between the endpoints.
    Cargo,
    /// Retrieve a stranded crew.
    Rescue,
}

/// A generated mission. Lives only while uncompleted; regeneration from
/// the same connection state yields the same mission.
#[derive(Debug, Clone, PartialEq)]
pub struct Mission {
    /// Mission category.
    pub kind: MissionKind,
    /// Payment on completion.
    pub reward: i32,
}

impl Mission {
    const KINDS: [MissionKind; 4] = [
        MissionKind::Salvage,
        MissionKind::Monster,
        MissionKind::Cargo,
        MissionKind::Rescue,
    ];

    /// Draws a mission from a connection-local stream. Roughly 30% of
    /// draws yield no mission at all.
    pub fn load_random(rng: &mut SyncedRng) -> Option<Self> {
        if rng.chance(0.3) {
            return None;
        }
        let kind = Self::KINDS[rng.range_i32(0, Self::KINDS.len() as i32 - 1) as usize];
        let reward = rng.range_i32(300, 1200);
        Some(Self { kind, reward })
    }
}

// ---------------------------------------------------------------------------
// LocationConnection
// ---------------------------------------------------------------------------

/// A travel-graph edge between two locations.
#[derive(Debug, Clone)]
pub struct LocationConnection {
    /// The two endpoints.
    pub locations: [LocationId; 2],
    /// Travel difficulty assigned by the propagation pass.
    pub difficulty: f32,
    /// One-way passage flag.
    pub passed: bool,
    /// Primary-node pair of the source edge, when derived from one.
    pub primary_nodes: [Option<PrimaryNodeId>; 2],
    /// Secondary nodes along the source edge.
    pub secondary_nodes: Vec<SecondaryNodeId>,
    /// Jagged polyline segments between the endpoints (also used for
    /// point-near-path tests).
    pub crack_segments: Vec<[Vec2; 2]>,
    /// Completed-mission counter; part of the mission seed.
    pub missions_completed: u32,
    /// The currently offered mission, if one has been instantiated.
    pub mission: Option<Mission>,
}

impl LocationConnection {
    /// Creates an unpassed connection between two locations.
    pub fn new(a: LocationId, b: LocationId) -> Self {
        Self {
            locations: [a, b],
            difficulty: 0.0,
            passed: false,
            primary_nodes: [None, None],
            secondary_nodes: Vec::new(),
            crack_segments: Vec::new(),
            missions_completed: 0,
            mission: None,
        }
    }

    /// The endpoint opposite `location`, or `None` if the connection does
    /// not touch it.
    pub fn other_location(&self, location: LocationId) -> Option<LocationId> {
        if self.locations[0] == location {
            Some(self.locations[1])
        } else if self.locations[1] == location {
            Some(self.locations[0])
        } else {
            None
        }
    }

    /// The deterministic mission seed for the current completion count:
    /// a positional hash of both endpoints plus the counter.
    pub fn mission_seed(&self, pos_a: Vec2, pos_b: Vec2) -> u64 {
        let mut seed = pos_a.x as i64 + (pos_a.y as i64) * 100;
        seed += (pos_b.x as i64) * 10_000 + (pos_b.y as i64) * 1_000_000;
        seed.wrapping_add(i64::from(self.missions_completed)) as u64
    }

    /// Returns the offered mission, instantiating it on first access.
    pub fn mission(&mut self, pos_a: Vec2, pos_b: Vec2) -> Option<&Mission> {
        if self.mission.is_none() {
            let mut rng = SyncedRng::new(self.mission_seed(pos_a, pos_b));
            self.mission = Mission::load_random(&mut rng);
        }
        self.mission.as_ref()
    }

    /// Marks the current mission completed: bumps the counter (changing
    /// the next mission seed) and clears the offer.
    pub fn complete_mission(&mut self) {
        if self.mission.take().is_some() {
            self.missions_completed += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
