//! Procedural campaign-map generation.
//!
//! A seeded pipeline that runs once at world creation: Voronoi diagram →
//! cell grouping → primary/secondary node graph → location/connection
//! assembly with difficulty propagation and jagged visual paths. Given the
//! same `(seed, size)` the pipeline reproduces an identical map on every
//! peer, which is what makes index-based save files and synchronized
//! multiplayer campaigns possible.

mod error;
mod graph;
mod grouping;
mod location;
mod map;
mod path;
mod voronoi;

pub use error::MapError;
pub use graph::{NodeGraph, PrimaryNode, PrimaryNodeId, SecondaryNode, SecondaryNodeId};
pub use grouping::assign_groups;
pub use location::{
    ConnectionId, Location, LocationConnection, LocationId, LocationType, Mission, MissionKind,
};
pub use map::{Map, MapSave};
pub use path::{generate_jagged_line, generations_for_distance, point_near_path};
pub use voronoi::{Cell, CellId, CellState, Edge, EdgeId, VoronoiDiagram, sample_sites};
