//! Cell grouping: partitions Voronoi cells into randomly-sized contiguous
//! clusters.
//!
//! Groups are grown one at a time from a random seed cell; after a group
//! finishes growing, every unassigned direct neighbor is marked blank so
//! that a buffer cell always separates adjacent groups. A group may end
//! smaller than its target size when growth starves; that is expected,
//! not an error. Finally, every edge whose two cells share a group is
//! flagged internal.

use tracing::debug;
use trench_config::GenerationConfig;
use trench_rand::SyncedRng;

use crate::voronoi::{CellId, CellState, EdgeId, VoronoiDiagram};

/// Runs the grouping pass. Returns the groups as lists of cell ids.
///
/// Draw order is part of the synced-stream contract: per group, one draw
/// for the seed cell, one for the target size, then per growth step one
/// draw for the in-group cell and one for the growth edge.
pub fn assign_groups(
    diagram: &mut VoronoiDiagram,
    rng: &mut SyncedRng,
    config: &GenerationConfig,
) -> Vec<Vec<CellId>> {
    let mut unassigned: Vec<CellId> = (0..diagram.cells.len())
        .map(CellId)
        .filter(|&c| diagram.cells[c.0].state == CellState::Unassigned)
        .collect();

    let mut groups: Vec<Vec<CellId>> = Vec::new();
    let mut current_group: i32 = 0;

    while !unassigned.is_empty() {
        let cell_index = rng.range_i32(0, unassigned.len() as i32 - 1) as usize;
        let target_size = rng.range_i32(config.group_size_min, config.group_size_max);

        let first = unassigned.remove(cell_index);
        diagram.cells[first.0].group = current_group;
        diagram.cells[first.0].state = CellState::Assigned;

        let mut group_cells = vec![first];
        // Cells that may still have room to grow from.
        let mut growable = vec![first];

        while !growable.is_empty() && (group_cells.len() as i32) < target_size {
            let grow_index = rng.range_i32(0, growable.len() as i32 - 1) as usize;
            let selected = growable[grow_index];

            let growth_edges = unassigned_neighbor_edges(diagram, selected);
            if growth_edges.is_empty() {
                growable.remove(grow_index);
                continue;
            }

            let edge_index = rng.range_i32(0, growth_edges.len() as i32 - 1) as usize;
            let neighbor = diagram
                .adjacent_cell(growth_edges[edge_index], selected)
                .expect("growth edge has an adjacent cell by construction");

            diagram.cells[neighbor.0].group = current_group;
            diagram.cells[neighbor.0].state = CellState::Assigned;
            group_cells.push(neighbor);
            growable.push(neighbor);
            unassigned.retain(|&c| c != neighbor);
        }

        // Buffer pass: unassigned neighbors of the finished group become
        // blank and never join any group.
        for &cell in &group_cells {
            for &edge in &diagram.cells[cell.0].edges.clone() {
                if let Some(adjacent) = diagram.adjacent_cell(edge, cell)
                    && diagram.cells[adjacent.0].state == CellState::Unassigned
                {
                    diagram.cells[adjacent.0].state = CellState::Blank;
                    diagram.cells[adjacent.0].group = -1;
                    unassigned.retain(|&c| c != adjacent);
                }
            }
        }

        debug!(
            group = current_group,
            size = group_cells.len(),
            target = target_size,
            "grew cell group"
        );
        groups.push(group_cells);
        current_group += 1;
    }

    // Classification pass: an edge inside a group is internal.
    for edge in &mut diagram.edges {
        if let [Some(c1), Some(c2)] = edge.cells
            && diagram.cells[c1.0].group == diagram.cells[c2.0].group
        {
            edge.is_internal = true;
        }
    }

    groups
}

/// Edges of `cell` whose far side is an unassigned cell.
fn unassigned_neighbor_edges(diagram: &VoronoiDiagram, cell: CellId) -> Vec<EdgeId> {
    diagram.cells[cell.0]
        .edges
        .iter()
        .copied()
        .filter(|&edge| {
            diagram
                .adjacent_cell(edge, cell)
                .is_some_and(|adj| diagram.cells[adj.0].state == CellState::Unassigned)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voronoi::sample_sites;
    use std::collections::HashSet;

    fn grouped_diagram(seed: &str) -> (VoronoiDiagram, Vec<Vec<CellId>>) {
        let config = GenerationConfig::default();
        let mut rng = SyncedRng::from_str_seed(seed);
        let sites = sample_sites(&mut rng, 50, 500.0, 50.0);
        let mut diagram = VoronoiDiagram::build(&sites, 500.0);
        let groups = assign_groups(&mut diagram, &mut rng, &config);
        (diagram, groups)
    }

    #[test]
    fn test_groups_are_disjoint_and_sized() {
        let (diagram, groups) = grouped_diagram("a");
        assert!(!groups.is_empty());

        let mut seen: HashSet<CellId> = HashSet::new();
        for group in &groups {
            assert!(!group.is_empty());
            assert!(group.len() <= 6, "group larger than the size cap");
            for &cell in group {
                assert!(seen.insert(cell), "cell in two groups");
                assert_eq!(diagram.cells[cell.0].state, CellState::Assigned);
            }
        }
    }

    #[test]
    fn test_every_cell_assigned_or_blank() {
        let (diagram, _) = grouped_diagram("a");
        for cell in &diagram.cells {
            match cell.state {
                CellState::Assigned => assert!(cell.group >= 0),
                CellState::Blank => assert_eq!(cell.group, -1),
                CellState::Unassigned => panic!("cell left unassigned after grouping"),
            }
        }
    }

    #[test]
    fn test_groups_edge_connected() {
        let (diagram, groups) = grouped_diagram("connectivity");

        for group in &groups {
            let members: HashSet<CellId> = group.iter().copied().collect();

            // Flood-fill from the first member across shared edges.
            let mut reached = HashSet::from([group[0]]);
            let mut frontier = vec![group[0]];
            while let Some(cell) = frontier.pop() {
                for &edge in &diagram.cells[cell.0].edges {
                    if let Some(adj) = diagram.adjacent_cell(edge, cell)
                        && members.contains(&adj)
                        && reached.insert(adj)
                    {
                        frontier.push(adj);
                    }
                }
            }
            assert_eq!(
                reached.len(),
                group.len(),
                "group split across disconnected cells"
            );
        }
    }

    #[test]
    fn test_internal_iff_same_group() {
        let (diagram, _) = grouped_diagram("a");

        for edge in &diagram.edges {
            let expected = matches!(edge.cells, [Some(c1), Some(c2)]
                if diagram.cells[c1.0].group == diagram.cells[c2.0].group);
            assert_eq!(edge.is_internal, expected, "edge {edge:?}");
        }
    }

    #[test]
    fn test_blank_cells_buffer_groups() {
        let (diagram, _) = grouped_diagram("a");

        // No two cells from different groups may share an edge: the buffer
        // pass separates them with blanks. (Same-group sharing is fine.)
        for edge in &diagram.edges {
            if let [Some(c1), Some(c2)] = edge.cells {
                let g1 = diagram.cells[c1.0].group;
                let g2 = diagram.cells[c2.0].group;
                if g1 >= 0 && g2 >= 0 {
                    assert_eq!(g1, g2, "two different groups touch directly");
                }
            }
        }
    }

    #[test]
    fn test_grouping_deterministic() {
        let (_, groups_a) = grouped_diagram("a");
        let (_, groups_b) = grouped_diagram("a");
        assert_eq!(groups_a, groups_b);
    }
}
