use trench_config::{GenerationConfig, JaggedRngMode};

use super::*;
use crate::location::ConnectionId;

fn default_map(seed: &str) -> Map {
    Map::generate(seed, 500, &GenerationConfig::default())
}

#[test]
fn test_generation_deterministic() {
    let a = default_map("a");
    let b = default_map("a");

    assert_eq!(a.locations.len(), b.locations.len());
    assert_eq!(a.connections.len(), b.connections.len());

    for (la, lb) in a.locations.iter().zip(&b.locations) {
        assert_eq!(la.position, lb.position);
        assert_eq!(la.name, lb.name);
        assert_eq!(la.location_type, lb.location_type);
    }
    for (ca, cb) in a.connections.iter().zip(&b.connections) {
        assert_eq!(ca.locations, cb.locations);
        assert_eq!(ca.difficulty, cb.difficulty);
        assert_eq!(ca.crack_segments, cb.crack_segments);
    }
}

#[test]
fn test_different_seeds_differ() {
    let a = default_map("a");
    let b = default_map("b");

    // Same pipeline, different stream: the topology almost surely differs.
    let same = a.locations.len() == b.locations.len()
        && a.locations
            .iter()
            .zip(&b.locations)
            .all(|(la, lb)| la.position == lb.position);
    assert!(!same, "seeds 'a' and 'b' produced identical maps");
}

#[test]
fn test_scenario_seed_a_size_500() {
    let map = default_map("a");

    assert!(!map.locations.is_empty());

    let middle = LocationId(map.locations.len() / 2);
    assert_eq!(map.current_location(), Some(middle));
    assert!(map.locations[middle.0].discovered);
    assert!(
        !map.locations[middle.0].connections.is_empty(),
        "start location has no connections"
    );

    // Only the start is discovered after generation.
    let discovered = map.locations.iter().filter(|l| l.discovered).count();
    assert_eq!(discovered, 1);
}

#[test]
fn test_every_location_connected() {
    let map = default_map("a");

    for (i, location) in map.locations.iter().enumerate() {
        assert!(
            !location.connections.is_empty(),
            "location {i} created without connections"
        );
        for &conn in &location.connections {
            assert!(
                map.connections[conn.0]
                    .other_location(LocationId(i))
                    .is_some(),
                "connection registered on a location it does not touch"
            );
        }
    }
}

#[test]
fn test_difficulties_bounded() {
    let config = GenerationConfig::default();
    let map = default_map("a");

    // Any connection reached by the propagation carries at least the
    // floor; nothing can exceed cutoff max + increase max.
    let ceiling = config.difficulty_cutoff.1 + config.difficulty_increase.1;
    for connection in &map.connections {
        assert!(connection.difficulty >= 0.0);
        assert!(connection.difficulty <= ceiling);
    }

    // The start component is actually reached.
    let start = map.current_location().unwrap();
    for &conn in &map.locations[start.0].connections {
        assert!(
            map.connections[conn.0].difficulty >= config.difficulty_floor,
            "start-adjacent connection was not assigned a difficulty"
        );
    }
}

#[test]
fn test_jagged_paths_present() {
    let map = default_map("a");

    for connection in &map.connections {
        let start = map.locations[connection.locations[0].0].position;
        let end = map.locations[connection.locations[1].0].position;
        let expected = 1usize << crate::path::generations_for_distance(start.distance(end));

        assert_eq!(connection.crack_segments.len(), expected);
        assert_eq!(connection.crack_segments.first().unwrap()[0], start);
        assert_eq!(connection.crack_segments.last().unwrap()[1], end);
    }
}

#[test]
fn test_cosmetic_jagged_mode_keeps_topology() {
    let synced = default_map("a");

    let config = GenerationConfig {
        jagged_rng: JaggedRngMode::Cosmetic,
        ..Default::default()
    };
    let cosmetic = Map::generate("a", 500, &config);

    // The path stream choice must not disturb the world topology.
    assert_eq!(synced.locations.len(), cosmetic.locations.len());
    assert_eq!(synced.connections.len(), cosmetic.connections.len());
    for (a, b) in synced.connections.iter().zip(&cosmetic.connections) {
        assert_eq!(a.locations, b.locations);
        assert_eq!(a.difficulty, b.difficulty);
    }
}

#[test]
fn test_move_to() {
    let mut map = default_map("a");
    let start = map.current_location().unwrap();
    let conn = map.locations[start.0].connections[0];
    let next = map.connections[conn.0].other_location(start).unwrap();

    assert!(map.move_to(conn));
    assert!(map.connections[conn.0].passed);
    assert!(map.locations[next.0].discovered);
    assert_eq!(map.current_location(), Some(next));
}

#[test]
fn test_move_to_rejects_detached_connection() {
    let mut map = default_map("a");
    let start = map.current_location().unwrap();

    // Find a connection that does not touch the start location.
    let detached = (0..map.connections.len())
        .map(ConnectionId)
        .find(|c| map.connections[c.0].other_location(start).is_none())
        .expect("map has more than one location's worth of connections");

    assert!(!map.move_to(detached));
    assert!(!map.connections[detached.0].passed);
    assert_eq!(map.current_location(), Some(start));
}

#[test]
fn test_set_location_out_of_bounds_ignored() {
    let mut map = default_map("a");
    let before = map.current_location();
    map.set_location(usize::MAX);
    assert_eq!(map.current_location(), before);
}

#[test]
fn test_save_roundtrip_in_memory() {
    let config = GenerationConfig::default();
    let mut map = default_map("a");

    // Travel a little to dirty the flags.
    let start = map.current_location().unwrap();
    let conn = map.locations[start.0].connections[0];
    map.move_to(conn);

    let save = map.save();
    assert_eq!(save.seed, "a");
    assert_eq!(save.size, 500);

    let restored = Map::load(&save, &config);
    assert_eq!(restored.current_location(), map.current_location());
    for (a, b) in map.locations.iter().zip(&restored.locations) {
        assert_eq!(a.discovered, b.discovered);
    }
    for (a, b) in map.connections.iter().zip(&restored.connections) {
        assert_eq!(a.passed, b.passed);
    }
}

#[test]
fn test_save_roundtrip_through_file() {
    let config = GenerationConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("campaign.ron");

    let mut map = default_map("deeprun");
    let start = map.current_location().unwrap();
    let conn = map.locations[start.0].connections[0];
    map.move_to(conn);

    map.save_to_file(&path).unwrap();
    let restored = Map::load_from_file(&path, &config).unwrap();

    assert_eq!(restored.seed(), "deeprun");
    assert_eq!(restored.current_location(), map.current_location());
    let discovered =
        |m: &Map| m.locations.iter().filter(|l| l.discovered).count();
    assert_eq!(discovered(&restored), discovered(&map));
}

#[test]
fn test_load_skips_bad_indices() {
    let config = GenerationConfig::default();
    let save = MapSave {
        seed: "a".to_string(),
        size: 500,
        current_location: 0,
        discovered: "0,notanumber,999999,2".to_string(),
        passed: ",1,888888".to_string(),
    };

    let map = Map::load(&save, &config);
    assert!(map.locations[0].discovered);
    assert!(map.locations[2].discovered);
    assert!(map.connections[1].passed);
    // Loading set the current location and marked it discovered.
    assert_eq!(map.current_location(), Some(LocationId(0)));
}

#[test]
fn test_missing_save_file_is_error() {
    let config = GenerationConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let result = Map::load_from_file(&dir.path().join("nope.ron"), &config);
    assert!(matches!(result, Err(MapError::ReadError(_))));
}
