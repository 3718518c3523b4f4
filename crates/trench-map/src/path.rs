//! Jagged polyline synthesis and proximity tests.
//!
//! Connections are drawn as cracks rather than straight lines: the
//! segment between two locations is subdivided recursively, displacing
//! each midpoint perpendicular to its segment. The segment geometry is
//! also used for point-near-path queries, so it must be reproducible from
//! the same RNG draws.

use glam::Vec2;
use trench_rand::SyncedRng;

/// Recursively subdivides `start → end` into a jagged polyline.
///
/// Each generation splits every segment at a midpoint displaced along the
/// segment normal by a uniform draw in `[-variance, +variance]`. One draw
/// per split, in segment order, so the draw count depends only on
/// `generations`.
pub fn generate_jagged_line(
    start: Vec2,
    end: Vec2,
    generations: u32,
    variance: f32,
    rng: &mut SyncedRng,
) -> Vec<[Vec2; 2]> {
    let mut segments = vec![[start, end]];

    for _ in 0..generations {
        let mut subdivided = Vec::with_capacity(segments.len() * 2);
        for [a, b] in segments {
            let mut mid = (a + b) * 0.5;
            let dir = b - a;
            if dir.length_squared() > f32::EPSILON {
                let normal = Vec2::new(-dir.y, dir.x).normalize();
                mid += normal * rng.range_f32(-variance, variance);
            } else {
                // Keep the draw count stable even for degenerate segments.
                rng.range_f32(-variance, variance);
            }
            subdivided.push([a, mid]);
            subdivided.push([mid, b]);
        }
        segments = subdivided;
    }

    segments
}

/// Number of subdivision generations for a path of the given length.
pub fn generations_for_distance(distance: f32) -> u32 {
    (distance / 10.0).max(0.0).sqrt() as u32
}

/// Returns `true` if `point` lies within `max_dist` of any path segment.
pub fn point_near_path(point: Vec2, segments: &[[Vec2; 2]], max_dist: f32) -> bool {
    segments
        .iter()
        .any(|&[a, b]| point_segment_distance(point, a, b) <= max_dist)
}

/// Distance from a point to a segment.
fn point_segment_distance(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
