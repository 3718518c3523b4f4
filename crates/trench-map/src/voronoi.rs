//! Voronoi diagram construction over a bounded square region.
//!
//! Cells and edges live in index-addressed arenas with adjacency stored
//! as index lists, so the diagram has no reference cycles and can be
//! serialized or inspected freely by tests. Construction is fully
//! deterministic for a given site list: the only randomness in the
//! pipeline is the site sampling itself, which draws from the synced
//! stream.
//!
//! Each pair of sites contributes at most one edge: the stretch of their
//! perpendicular bisector closer to those two sites than to any other.
//! Because a point on the bisector is equidistant from both sites, the
//! clip constraints are identical no matter which of the two cells is
//! asked, so both cells agree exactly on the shared edge. Stretches of
//! the region border belonging to a single cell become border edges with
//! one absent neighbor.

use glam::{DVec2, Vec2};
use trench_rand::SyncedRng;

/// Vertex coordinates snap to this grid so that edges meeting at a shared
/// Voronoi vertex land on the exact same position and can be deduplicated
/// by equality.
const QUANT: f64 = 256.0;

/// Intervals shorter than this collapse to nothing.
const DEGENERATE_EPS: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Arena ids
// ---------------------------------------------------------------------------

/// Index of a cell in the diagram arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// Index of an edge in the diagram arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

// ---------------------------------------------------------------------------
// Cells and edges
// ---------------------------------------------------------------------------

/// Grouping state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellState {
    /// Not yet considered by the grouping pass.
    #[default]
    Unassigned,
    /// Member of a group.
    Assigned,
    /// Buffer cell between groups; excluded from growth, left ungrouped.
    Blank,
}

/// A polygonal Voronoi cell.
#[derive(Debug, Clone)]
pub struct Cell {
    /// The site that seeded this cell.
    pub center: Vec2,
    /// Bounding edges, in arena order. Together they close the polygon.
    pub edges: Vec<EdgeId>,
    /// Group id assigned by the grouping pass; -1 while ungrouped.
    pub group: i32,
    /// Grouping state.
    pub state: CellState,
}

/// A segment of the planar subdivision.
#[derive(Debug, Clone)]
pub struct Edge {
    /// First endpoint.
    pub a: Vec2,
    /// Second endpoint.
    pub b: Vec2,
    /// The (at most two) cells this edge separates. A missing cell means
    /// the edge lies on the region border.
    pub cells: [Option<CellId>; 2],
    /// True iff both adjacent cells are present and share a group.
    pub is_internal: bool,
}

impl Edge {
    /// Length of the segment.
    pub fn length(&self) -> f32 {
        self.a.distance(self.b)
    }

    /// The cell on the other side from `cell`, if present.
    pub fn adjacent_cell(&self, cell: CellId) -> Option<CellId> {
        match self.cells {
            [Some(c), other] if c == cell => other,
            [other, Some(c)] if c == cell => other,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Site sampling
// ---------------------------------------------------------------------------

/// Samples `count` sites in `[0, size]²` by rejection: a candidate closer
/// than `min_distance` to an accepted site, or lying exactly on the
/// border, is rejected and redrawn.
///
/// If the region cannot fit `count` sites at the requested spacing the
/// sampler gives up after a generous attempt budget and returns what it
/// has; an undersized site set degrades the map, it does not abort it.
pub fn sample_sites(rng: &mut SyncedRng, count: usize, size: f32, min_distance: f32) -> Vec<Vec2> {
    let mut sites: Vec<Vec2> = Vec::with_capacity(count);
    let max_attempts = count.max(1) * 1000;
    let mut attempts = 0;

    while sites.len() < count && attempts < max_attempts {
        attempts += 1;
        let candidate = Vec2::new(rng.range_f32(0.0, size), rng.range_f32(0.0, size));

        if candidate.x == 0.0 || candidate.x == size || candidate.y == 0.0 || candidate.y == size {
            continue;
        }
        if sites.iter().any(|s| s.distance(candidate) <= min_distance) {
            continue;
        }
        sites.push(candidate);
    }

    if sites.len() < count {
        tracing::warn!(
            placed = sites.len(),
            requested = count,
            "site sampling starved; continuing with fewer sites"
        );
    }
    sites
}

// ---------------------------------------------------------------------------
// VoronoiDiagram
// ---------------------------------------------------------------------------

/// The bounded planar subdivision induced by a site list.
#[derive(Debug, Clone)]
pub struct VoronoiDiagram {
    /// Cell arena; index i is the cell of site i.
    pub cells: Vec<Cell>,
    /// Edge arena.
    pub edges: Vec<Edge>,
    /// Side length of the bounded region.
    pub size: f32,
}

impl VoronoiDiagram {
    /// Builds the diagram for `sites` in `[0, size]²`.
    pub fn build(sites: &[Vec2], size: f32) -> Self {
        let s: Vec<DVec2> = sites.iter().map(|v| v.as_dvec2()).collect();
        let size_d = f64::from(size);

        let mut cells: Vec<Cell> = sites
            .iter()
            .map(|&center| Cell {
                center,
                edges: Vec::new(),
                group: -1,
                state: CellState::Unassigned,
            })
            .collect();
        let mut edges: Vec<Edge> = Vec::new();

        // Interior edges: one per adjacent site pair.
        for i in 0..s.len() {
            for j in (i + 1)..s.len() {
                if let Some((a, b)) = bisector_segment(&s, i, j, size_d) {
                    let id = EdgeId(edges.len());
                    edges.push(Edge {
                        a,
                        b,
                        cells: [Some(CellId(i)), Some(CellId(j))],
                        is_internal: false,
                    });
                    cells[i].edges.push(id);
                    cells[j].edges.push(id);
                }
            }
        }

        // Border edges: stretches of the region boundary owned by one cell.
        let corners = [
            (DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0)),
            (DVec2::new(size_d, 0.0), DVec2::new(0.0, 1.0)),
            (DVec2::new(size_d, size_d), DVec2::new(-1.0, 0.0)),
            (DVec2::new(0.0, size_d), DVec2::new(0.0, -1.0)),
        ];
        for (origin, dir) in corners {
            for i in 0..s.len() {
                if let Some((a, b)) = border_segment(&s, i, origin, dir, size_d) {
                    let id = EdgeId(edges.len());
                    edges.push(Edge {
                        a,
                        b,
                        cells: [Some(CellId(i)), None],
                        is_internal: false,
                    });
                    cells[i].edges.push(id);
                }
            }
        }

        Self { cells, edges, size }
    }

    /// The cell across `edge` from `cell`, if any.
    pub fn adjacent_cell(&self, edge: EdgeId, cell: CellId) -> Option<CellId> {
        self.edges[edge.0].adjacent_cell(cell)
    }
}

// ---------------------------------------------------------------------------
// Segment clipping
// ---------------------------------------------------------------------------

/// Clips the parameter interval `[t0, t1]` against `num + t*den >= 0`.
/// Returns `false` when the interval becomes empty.
fn clip(t0: &mut f64, t1: &mut f64, num: f64, den: f64) -> bool {
    const EPS: f64 = 1e-12;
    if den.abs() < EPS {
        return num >= -EPS;
    }
    let t = -num / den;
    if den > 0.0 {
        *t0 = t0.max(t);
    } else {
        *t1 = t1.min(t);
    }
    *t0 <= *t1
}

/// Snaps a point to the quantization grid.
fn quantize(p: DVec2) -> Vec2 {
    Vec2::new(
        ((p.x * QUANT).round() / QUANT) as f32,
        ((p.y * QUANT).round() / QUANT) as f32,
    )
}

/// The stretch of the (i, j) bisector inside the region and closer to
/// sites i and j than to any other site, or `None` if it is empty.
fn bisector_segment(s: &[DVec2], i: usize, j: usize, size: f64) -> Option<(Vec2, Vec2)> {
    let diff = s[j] - s[i];
    if diff.length_squared() < DEGENERATE_EPS {
        return None;
    }
    let m = (s[i] + s[j]) * 0.5;
    let dir = DVec2::new(-diff.y, diff.x).normalize();

    let mut t0 = -4.0 * size;
    let mut t1 = 4.0 * size;

    // Region bounds: 0 <= p <= size on both axes.
    if !clip(&mut t0, &mut t1, m.x, dir.x)
        || !clip(&mut t0, &mut t1, size - m.x, -dir.x)
        || !clip(&mut t0, &mut t1, m.y, dir.y)
        || !clip(&mut t0, &mut t1, size - m.y, -dir.y)
    {
        return None;
    }

    // Closer to i (equivalently j) than to every other site k:
    // (p - m_ik) · (s_k - s_i) <= 0.
    for (k, &sk) in s.iter().enumerate() {
        if k == i || k == j {
            continue;
        }
        let toward = sk - s[i];
        let m_ik = (s[i] + sk) * 0.5;
        let num = -(m - m_ik).dot(toward);
        let den = -dir.dot(toward);
        if !clip(&mut t0, &mut t1, num, den) {
            return None;
        }
    }

    if t1 - t0 < DEGENERATE_EPS {
        return None;
    }
    let a = quantize(m + dir * t0);
    let b = quantize(m + dir * t1);
    (a != b).then_some((a, b))
}

/// The stretch of one region side owned by cell i, or `None`.
fn border_segment(
    s: &[DVec2],
    i: usize,
    origin: DVec2,
    dir: DVec2,
    size: f64,
) -> Option<(Vec2, Vec2)> {
    let mut t0 = 0.0;
    let mut t1 = size;

    for (k, &sk) in s.iter().enumerate() {
        if k == i {
            continue;
        }
        let toward = sk - s[i];
        let m_ik = (s[i] + sk) * 0.5;
        let num = -(origin - m_ik).dot(toward);
        let den = -dir.dot(toward);
        if !clip(&mut t0, &mut t1, num, den) {
            return None;
        }
    }

    if t1 - t0 < DEGENERATE_EPS {
        return None;
    }
    let a = quantize(origin + dir * t0);
    let b = quantize(origin + dir * t1);
    (a != b).then_some((a, b))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
