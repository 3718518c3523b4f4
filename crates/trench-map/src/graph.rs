//! Node/edge graph derivation from the grouped Voronoi diagram.
//!
//! Primary nodes sit at the shared endpoints of boundary-relevant edges;
//! secondary nodes are subordinate branch vertices sampled along boundary
//! edges or placed at cell centers. Adjacency is stored as index lists
//! parallel to the diagram's edge arena, keeping the graph cycle-free and
//! trivially inspectable.

use glam::Vec2;
use trench_config::GenerationConfig;
use trench_rand::SyncedRng;

use crate::voronoi::{CellId, CellState, EdgeId, VoronoiDiagram};

// ---------------------------------------------------------------------------
// Node ids
// ---------------------------------------------------------------------------

/// Index of a primary node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryNodeId(pub usize);

/// Index of a secondary node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecondaryNodeId(pub usize);

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A graph vertex at an edge endpoint shared by the incident edges.
#[derive(Debug, Clone)]
pub struct PrimaryNode {
    /// Map position.
    pub pos: Vec2,
    /// Cells touching this vertex.
    pub adjacent_cells: Vec<CellId>,
    /// Edges meeting at this vertex.
    pub edges: Vec<EdgeId>,
    /// Group id inherited from an adjacent assigned cell; -1 if none.
    pub group: i32,
}

/// A subordinate vertex: a branch point along an edge, or a cell center.
#[derive(Debug, Clone)]
pub struct SecondaryNode {
    /// Map position.
    pub pos: Vec2,
    /// True for edge-bound branch nodes (which have no owning cell).
    pub on_edge: bool,
    /// Owning cell for center nodes.
    pub cell: Option<CellId>,
    /// Host edge for branch nodes.
    pub edge: Option<EdgeId>,
    /// Attached branch nodes (center nodes only).
    pub attached: Vec<SecondaryNodeId>,
}

// ---------------------------------------------------------------------------
// NodeGraph
// ---------------------------------------------------------------------------

/// The derived connectivity graph over the diagram.
#[derive(Debug, Clone)]
pub struct NodeGraph {
    /// Primary node arena.
    pub primary: Vec<PrimaryNode>,
    /// Secondary node arena.
    pub secondary: Vec<SecondaryNode>,
    /// Per-edge primary endpoints, parallel to the diagram's edge arena.
    /// `None` entries belong to edges excluded from the graph.
    pub edge_nodes: Vec<[Option<PrimaryNodeId>; 2]>,
    /// Per-edge secondary branch nodes, parallel to the edge arena.
    pub edge_secondary: Vec<Vec<SecondaryNodeId>>,
}

impl NodeGraph {
    /// Derives the graph. Draw order (part of the synced-stream
    /// contract): per qualifying cell, one draw per selected branch edge
    /// and one per accepted branch fraction.
    pub fn build(
        diagram: &VoronoiDiagram,
        rng: &mut SyncedRng,
        config: &GenerationConfig,
    ) -> Self {
        let mut graph = Self {
            primary: Vec::new(),
            secondary: Vec::new(),
            edge_nodes: vec![[None, None]; diagram.edges.len()],
            edge_secondary: vec![Vec::new(); diagram.edges.len()],
        };

        graph.build_primary(diagram);
        graph.build_secondary(diagram, rng, config);
        graph
    }

    /// Deduplicates edge endpoints into shared primary nodes and registers
    /// every qualifying edge on both of its nodes.
    fn build_primary(&mut self, diagram: &VoronoiDiagram) {
        for (ei, edge) in diagram.edges.iter().enumerate() {
            if edge.a == edge.b {
                continue;
            }
            let [Some(c1), Some(c2)] = edge.cells else {
                continue;
            };

            let n1 = self.find_or_create_primary(edge.a);
            let n2 = self.find_or_create_primary(edge.b);
            self.edge_nodes[ei] = [Some(n1), Some(n2)];

            for node in [n1, n2] {
                let node = &mut self.primary[node.0];
                node.edges.push(EdgeId(ei));
                for cell in [c1, c2] {
                    if !node.adjacent_cells.contains(&cell) {
                        node.adjacent_cells.push(cell);
                    }
                }
                node.group = if diagram.cells[c1.0].state == CellState::Assigned {
                    diagram.cells[c1.0].group
                } else {
                    diagram.cells[c2.0].group
                };
            }
        }
    }

    /// Places cell-center secondary nodes with up to two attached branch
    /// nodes sampled on distinct boundary edges.
    fn build_secondary(
        &mut self,
        diagram: &VoronoiDiagram,
        rng: &mut SyncedRng,
        config: &GenerationConfig,
    ) {
        for (ci, cell) in diagram.cells.iter().enumerate() {
            let mut valid_edges: Vec<EdgeId> = cell
                .edges
                .iter()
                .copied()
                .filter(|&e| {
                    !diagram.edges[e.0].is_internal
                        && self.edge_nodes[e.0].iter().all(Option::is_some)
                })
                .collect();
            if valid_edges.is_empty() {
                continue;
            }

            let mut attached = Vec::new();
            for _ in 0..2 {
                if valid_edges.is_empty() {
                    break;
                }
                let edge_index = rng.range_i32(0, valid_edges.len() as i32 - 1) as usize;
                let edge = valid_edges.remove(edge_index);
                if let Some(branch) = self.add_branch_node(edge, rng, config) {
                    attached.push(branch);
                }
            }

            // A center node with nothing attached is dead weight.
            if !attached.is_empty() {
                self.secondary.push(SecondaryNode {
                    pos: cell.center,
                    on_edge: false,
                    cell: Some(CellId(ci)),
                    edge: None,
                    attached,
                });
            }
        }
    }

    /// Samples a branch node on `edge` at a random interior tenth,
    /// rejecting fractions too close to an existing branch node on the
    /// same edge and skipping short edges entirely.
    fn add_branch_node(
        &mut self,
        edge: EdgeId,
        rng: &mut SyncedRng,
        config: &GenerationConfig,
    ) -> Option<SecondaryNodeId> {
        let [Some(n1), Some(n2)] = self.edge_nodes[edge.0] else {
            return None;
        };
        let a = self.primary[n1.0].pos;
        let b = self.primary[n2.0].pos;
        if a.distance(b) <= config.min_distance {
            return None;
        }

        let valid_fractions: Vec<i32> = (1..=9)
            .filter(|&i| {
                let candidate = a.lerp(b, i as f32 / 10.0);
                self.edge_secondary[edge.0].iter().all(|&s| {
                    self.secondary[s.0].pos.distance(candidate) > config.branch_spacing
                })
            })
            .collect();
        if valid_fractions.is_empty() {
            return None;
        }

        let pick = valid_fractions[rng.range_i32(0, valid_fractions.len() as i32 - 1) as usize];
        let id = SecondaryNodeId(self.secondary.len());
        self.secondary.push(SecondaryNode {
            pos: a.lerp(b, pick as f32 / 10.0),
            on_edge: true,
            cell: None,
            edge: Some(edge),
            attached: Vec::new(),
        });
        self.edge_secondary[edge.0].push(id);
        Some(id)
    }

    /// Finds the primary node at exactly `pos`, creating it if absent.
    fn find_or_create_primary(&mut self, pos: Vec2) -> PrimaryNodeId {
        if let Some(i) = self.primary.iter().position(|n| n.pos == pos) {
            return PrimaryNodeId(i);
        }
        let id = PrimaryNodeId(self.primary.len());
        self.primary.push(PrimaryNode {
            pos,
            adjacent_cells: Vec::new(),
            edges: Vec::new(),
            group: -1,
        });
        id
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::assign_groups;
    use crate::voronoi::sample_sites;

    fn built_graph(seed: &str) -> (VoronoiDiagram, NodeGraph) {
        let config = GenerationConfig::default();
        let mut rng = SyncedRng::from_str_seed(seed);
        let sites = sample_sites(&mut rng, 50, 500.0, 50.0);
        let mut diagram = VoronoiDiagram::build(&sites, 500.0);
        assign_groups(&mut diagram, &mut rng, &config);
        let graph = NodeGraph::build(&diagram, &mut rng, &config);
        (diagram, graph)
    }

    #[test]
    fn test_primary_positions_unique() {
        let (_, graph) = built_graph("a");
        assert!(!graph.primary.is_empty());

        for (i, a) in graph.primary.iter().enumerate() {
            for b in &graph.primary[i + 1..] {
                assert_ne!(a.pos, b.pos, "duplicate primary node");
            }
        }
    }

    #[test]
    fn test_edges_registered_on_both_endpoints() {
        let (_, graph) = built_graph("a");

        for (ei, nodes) in graph.edge_nodes.iter().enumerate() {
            if let [Some(n1), Some(n2)] = nodes {
                assert!(graph.primary[n1.0].edges.contains(&EdgeId(ei)));
                assert!(graph.primary[n2.0].edges.contains(&EdgeId(ei)));
                assert_ne!(n1, n2, "degenerate edge got two equal nodes");
            }
        }
    }

    #[test]
    fn test_primary_group_from_adjacent_cell() {
        let (diagram, graph) = built_graph("a");

        for node in &graph.primary {
            if node.group >= 0 {
                assert!(
                    node.adjacent_cells
                        .iter()
                        .any(|c| diagram.cells[c.0].group == node.group),
                    "node group not among adjacent cells"
                );
            }
        }
    }

    #[test]
    fn test_branch_nodes_lie_on_their_edge() {
        let (_, graph) = built_graph("a");

        for node in graph.secondary.iter().filter(|n| n.on_edge) {
            assert!(node.cell.is_none());
            let edge = node.edge.expect("branch node without host edge");
            let [Some(n1), Some(n2)] = graph.edge_nodes[edge.0] else {
                panic!("branch node on edge without primary nodes");
            };
            let a = graph.primary[n1.0].pos;
            let b = graph.primary[n2.0].pos;

            // Interior tenths of the segment.
            let t = (node.pos - a).length() / (b - a).length();
            assert!(t > 0.05 && t < 0.95, "branch at t={t}");
            let projected = a.lerp(b, t);
            assert!(projected.distance(node.pos) < 0.1);
        }
    }

    #[test]
    fn test_branch_spacing_respected() {
        let (_, graph) = built_graph("a");

        for (ei, branches) in graph.edge_secondary.iter().enumerate() {
            assert!(branches.len() <= 2, "edge {ei} has too many branches");
            if let [s1, s2] = branches[..] {
                let d = graph.secondary[s1.0]
                    .pos
                    .distance(graph.secondary[s2.0].pos);
                assert!(d > 25.0, "branch nodes {d} apart on edge {ei}");
            }
        }
    }

    #[test]
    fn test_short_edges_get_no_branches() {
        let (_, graph) = built_graph("a");

        for (ei, branches) in graph.edge_secondary.iter().enumerate() {
            if !branches.is_empty() {
                let [Some(n1), Some(n2)] = graph.edge_nodes[ei] else {
                    unreachable!()
                };
                let length = graph.primary[n1.0].pos.distance(graph.primary[n2.0].pos);
                assert!(length > 50.0, "short edge {ei} got a branch node");
            }
        }
    }

    #[test]
    fn test_center_nodes_have_attachments() {
        let (_, graph) = built_graph("a");

        for node in graph.secondary.iter().filter(|n| !n.on_edge) {
            assert!(node.cell.is_some());
            assert!(!node.attached.is_empty(), "retained center without branches");
            assert!(node.attached.len() <= 2);
            for &branch in &node.attached {
                assert!(graph.secondary[branch.0].on_edge);
            }
        }
    }

    #[test]
    fn test_graph_deterministic() {
        let (_, a) = built_graph("a");
        let (_, b) = built_graph("a");

        assert_eq!(a.primary.len(), b.primary.len());
        assert_eq!(a.secondary.len(), b.secondary.len());
        for (na, nb) in a.primary.iter().zip(&b.primary) {
            assert_eq!(na.pos, nb.pos);
            assert_eq!(na.group, nb.group);
        }
        for (na, nb) in a.secondary.iter().zip(&b.secondary) {
            assert_eq!(na.pos, nb.pos);
            assert_eq!(na.on_edge, nb.on_edge);
        }
    }
}
