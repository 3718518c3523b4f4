//! The campaign map: generation pipeline, travel state, persistence.
//!
//! Generation runs once, synchronously, at session creation; every random
//! draw comes from the synced stream in a fixed order, so the same
//! `(seed, size)` reproduces the same map on every peer. Save files rely
//! on this: they store only the seed, the size, and index lists of
//! discovered locations and passed connections.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use trench_config::{GenerationConfig, JaggedRngMode};
use trench_rand::{SyncedRng, derive_seed, seed_from_str};

use crate::error::MapError;
use crate::graph::NodeGraph;
use crate::grouping::assign_groups;
use crate::location::{ConnectionId, Location, LocationConnection, LocationId};
use crate::path::{generate_jagged_line, generations_for_distance};
use crate::voronoi::{VoronoiDiagram, sample_sites};

/// Perpendicular displacement amplitude for crack midpoints.
const JAGGED_VARIANCE: f32 = 5.0;

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// The generated world graph plus session travel state.
#[derive(Debug)]
pub struct Map {
    seed: String,
    size: i32,
    /// All locations, in creation order. Never shrinks.
    pub locations: Vec<Location>,
    /// All connections, in creation order. Never shrinks.
    pub connections: Vec<LocationConnection>,
    current_location: Option<LocationId>,
    /// Cell geometry kept alive for rendering.
    pub diagram: VoronoiDiagram,
    /// The node graph the locations were assembled from.
    pub graph: NodeGraph,
}

impl Map {
    /// Runs the full generation pipeline for `(seed, size)`.
    pub fn generate(seed: &str, size: i32, config: &GenerationConfig) -> Self {
        let mut rng = SyncedRng::from_str_seed(seed);

        let sites = sample_sites(&mut rng, config.site_count, size as f32, config.min_distance);
        let mut diagram = VoronoiDiagram::build(&sites, size as f32);
        assign_groups(&mut diagram, &mut rng, config);
        let graph = NodeGraph::build(&diagram, &mut rng, config);

        let mut map = Self {
            seed: seed.to_string(),
            size,
            locations: Vec::new(),
            connections: Vec::new(),
            current_location: None,
            diagram,
            graph,
        };

        map.assemble_connections(&mut rng);
        map.pick_start();
        map.generate_difficulties(&mut rng, config);
        map.generate_jagged_lines(&mut rng, config);

        info!(
            seed,
            size,
            locations = map.locations.len(),
            connections = map.connections.len(),
            "generated campaign map"
        );
        map
    }

    /// The seed string this map was generated from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    /// The region size this map was generated with.
    pub fn size(&self) -> i32 {
        self.size
    }

    /// The player's current location.
    pub fn current_location(&self) -> Option<LocationId> {
        self.current_location
    }

    // -----------------------------------------------------------------------
    // Assembly
    // -----------------------------------------------------------------------

    /// Materializes locations and connections from the node graph:
    /// one connection per non-internal edge, plus a star of connections
    /// around every retained cell-center node.
    fn assemble_connections(&mut self, rng: &mut SyncedRng) {
        for ei in 0..self.diagram.edges.len() {
            let edge = &self.diagram.edges[ei];
            if edge.is_internal {
                continue;
            }
            let [Some(n1), Some(n2)] = self.graph.edge_nodes[ei] else {
                continue;
            };

            let points = [self.graph.primary[n1.0].pos, self.graph.primary[n2.0].pos];
            let endpoints = self.resolve_edge_locations(points, rng);

            let conn = self.connect_locations(endpoints[0], endpoints[1]);
            self.connections[conn.0].primary_nodes = [Some(n1), Some(n2)];
            self.connections[conn.0].secondary_nodes = self.graph.edge_secondary[ei].clone();
        }

        // Cell-center nodes with attachments become their own small star.
        for si in 0..self.graph.secondary.len() {
            if self.graph.secondary[si].on_edge {
                continue;
            }
            let center_pos = self.graph.secondary[si].pos;
            let center = self.find_or_create_location(center_pos, rng);

            for branch in self.graph.secondary[si].attached.clone() {
                let branch_pos = self.graph.secondary[branch.0].pos;
                let branch_loc = self.find_or_create_location(branch_pos, rng);
                self.connect_locations(center, branch_loc);
            }
        }
    }

    /// Resolves or creates the two locations for an edge's endpoints,
    /// deduplicating by exact map-position match. Draw order per created
    /// location: one draw for the endpoint pick, then the location's own
    /// type/name draws.
    fn resolve_edge_locations(&mut self, points: [Vec2; 2], rng: &mut SyncedRng) -> [LocationId; 2] {
        let matches =
            |l: &Location| l.position == points[0] || l.position == points[1];
        let first = self.locations.iter().position(matches);
        let second = (0..self.locations.len())
            .find(|&i| Some(i) != first && matches(&self.locations[i]));
        let mut found: [Option<LocationId>; 2] =
            [first.map(LocationId), second.map(LocationId)];

        for i in 0..2 {
            if found[i].is_some() {
                continue;
            }
            let position_index = rng.int(1) as usize;
            let mut position = points[position_index];
            if let Some(other) = found[1 - i]
                && self.locations[other.0].position == position
            {
                position = points[1 - position_index];
            }
            let id = LocationId(self.locations.len());
            self.locations.push(Location::create_random(position, rng));
            found[i] = Some(id);
        }

        [found[0].unwrap(), found[1].unwrap()]
    }

    /// Finds a location at exactly `pos`, creating one if absent.
    fn find_or_create_location(&mut self, pos: Vec2, rng: &mut SyncedRng) -> LocationId {
        if let Some(i) = self.locations.iter().position(|l| l.position == pos) {
            return LocationId(i);
        }
        let id = LocationId(self.locations.len());
        self.locations.push(Location::create_random(pos, rng));
        id
    }

    /// Creates a connection and registers it on both endpoints.
    fn connect_locations(&mut self, a: LocationId, b: LocationId) -> ConnectionId {
        let id = ConnectionId(self.connections.len());
        self.connections.push(LocationConnection::new(a, b));
        self.locations[a.0].connections.push(id);
        self.locations[b.0].connections.push(id);
        id
    }

    /// Picks the start location (the array's middle element), marks it
    /// discovered and current.
    fn pick_start(&mut self) {
        if self.locations.is_empty() {
            warn!("generation produced no locations; map is empty");
            return;
        }
        let start = LocationId(self.locations.len() / 2);
        self.locations[start.0].discovered = true;
        self.current_location = Some(start);
    }

    // -----------------------------------------------------------------------
    // Difficulty propagation
    // -----------------------------------------------------------------------

    /// Depth-first difficulty walk from the start location. Each traversed
    /// connection receives the accumulated value; the accumulator rises by
    /// a random increment per hop and resets to the floor once it exceeds
    /// a randomized cutoff, yielding a rough distance-from-home gradient.
    fn generate_difficulties(&mut self, rng: &mut SyncedRng, config: &GenerationConfig) {
        let Some(start) = self.current_location else {
            return;
        };
        let mut remaining: Vec<ConnectionId> =
            (0..self.connections.len()).map(ConnectionId).collect();
        self.propagate_difficulty(start, &mut remaining, config.difficulty_floor, rng, config);
    }

    fn propagate_difficulty(
        &mut self,
        at: LocationId,
        remaining: &mut Vec<ConnectionId>,
        mut difficulty: f32,
        rng: &mut SyncedRng,
        config: &GenerationConfig,
    ) {
        difficulty += rng.range_f32(config.difficulty_increase.0, config.difficulty_increase.1);
        let cutoff = rng.range_f32(config.difficulty_cutoff.0, config.difficulty_cutoff.1);
        if difficulty > cutoff {
            difficulty = config.difficulty_floor;
        }

        for conn_id in self.locations[at.0].connections.clone() {
            let Some(pos) = remaining.iter().position(|&c| c == conn_id) else {
                continue;
            };
            remaining.remove(pos);

            self.connections[conn_id.0].difficulty = difficulty;
            let next = self.connections[conn_id.0]
                .other_location(at)
                .expect("connection registered on a location it does not touch");
            self.propagate_difficulty(next, remaining, difficulty, rng, config);
        }
    }

    // -----------------------------------------------------------------------
    // Jagged paths
    // -----------------------------------------------------------------------

    /// Synthesizes the crack polyline for every connection. The stream
    /// choice is an explicit configuration decision: synced geometry is
    /// peer-identical (it feeds point-near-path tests), cosmetic geometry
    /// leaves the synced stream untouched.
    fn generate_jagged_lines(&mut self, rng: &mut SyncedRng, config: &GenerationConfig) {
        let mut cosmetic;
        let rng = match config.jagged_rng {
            JaggedRngMode::Synced => rng,
            JaggedRngMode::Cosmetic => {
                cosmetic = SyncedRng::new(derive_seed(seed_from_str(&self.seed), &"jagged"));
                &mut cosmetic
            }
        };

        for connection in &mut self.connections {
            let start = self.locations[connection.locations[0].0].position;
            let end = self.locations[connection.locations[1].0].position;
            let generations = generations_for_distance(start.distance(end));
            connection.crack_segments =
                generate_jagged_line(start, end, generations, JAGGED_VARIANCE, rng);
        }
    }

    // -----------------------------------------------------------------------
    // Travel
    // -----------------------------------------------------------------------

    /// Jumps to a location by index (used by save loading and debug
    /// tooling). Out-of-range indices are logged and ignored.
    pub fn set_location(&mut self, index: usize) {
        if index >= self.locations.len() {
            error!(index, "location index out of bounds");
            return;
        }
        self.current_location = Some(LocationId(index));
        self.locations[index].discovered = true;
    }

    /// Travels across `connection` from the current location: the
    /// connection becomes passed and the far location becomes the
    /// discovered current location. Returns `false` if the connection
    /// does not touch the current location.
    pub fn move_to(&mut self, connection: ConnectionId) -> bool {
        let Some(current) = self.current_location else {
            return false;
        };
        let Some(next) = self.connections[connection.0].other_location(current) else {
            warn!(
                connection = connection.0,
                "attempted travel on a connection not touching the current location"
            );
            return false;
        };

        self.connections[connection.0].passed = true;
        self.locations[next.0].discovered = true;
        self.current_location = Some(next);
        true
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Captures the travel state. Indices are stable because generation
    /// is deterministic for `(seed, size)`.
    pub fn save(&self) -> MapSave {
        let discovered: Vec<String> = self
            .locations
            .iter()
            .enumerate()
            .filter(|(_, l)| l.discovered)
            .map(|(i, _)| i.to_string())
            .collect();
        let passed: Vec<String> = self
            .connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.passed)
            .map(|(i, _)| i.to_string())
            .collect();

        MapSave {
            seed: self.seed.clone(),
            size: self.size,
            current_location: self.current_location.map_or(0, |l| l.0),
            discovered: discovered.join(","),
            passed: passed.join(","),
        }
    }

    /// Replays generation from the save's `(seed, size)`, then reapplies
    /// the discovered/passed flags by index. Unparseable or out-of-range
    /// indices are skipped.
    pub fn load(save: &MapSave, config: &GenerationConfig) -> Self {
        let mut map = Self::generate(&save.seed, save.size, config);

        for token in save.discovered.split(',') {
            if let Ok(index) = token.trim().parse::<usize>() {
                if index < map.locations.len() {
                    map.locations[index].discovered = true;
                } else {
                    warn!(index, "discarding out-of-range discovered index");
                }
            }
        }
        for token in save.passed.split(',') {
            if let Ok(index) = token.trim().parse::<usize>() {
                if index < map.connections.len() {
                    map.connections[index].passed = true;
                } else {
                    warn!(index, "discarding out-of-range passed index");
                }
            }
        }

        map.set_location(save.current_location);
        map
    }

    /// Writes the save to `path` as RON.
    pub fn save_to_file(&self, path: &Path) -> Result<(), MapError> {
        let save = self.save();
        let pretty = ron::ser::PrettyConfig::new();
        let serialized =
            ron::ser::to_string_pretty(&save, pretty).map_err(MapError::SerializeError)?;
        std::fs::write(path, serialized).map_err(MapError::WriteError)
    }

    /// Loads a save file from `path` and regenerates the map.
    pub fn load_from_file(path: &Path, config: &GenerationConfig) -> Result<Self, MapError> {
        let contents = std::fs::read_to_string(path).map_err(MapError::ReadError)?;
        let save: MapSave = ron::from_str(&contents).map_err(MapError::ParseError)?;
        Ok(Self::load(&save, config))
    }
}

// ---------------------------------------------------------------------------
// MapSave
// ---------------------------------------------------------------------------

/// The persisted travel state: enough to regenerate and replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapSave {
    /// Generation seed string.
    pub seed: String,
    /// Region size.
    pub size: i32,
    /// Index of the current location.
    pub current_location: usize,
    /// Comma-joined indices of discovered locations.
    pub discovered: String,
    /// Comma-joined indices of passed connections.
    pub passed: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[path = "map_tests.rs"]
mod tests;
