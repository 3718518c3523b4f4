//! Deterministic seeded randomness for map generation and gameplay.
//!
//! All generation and authoritative-gameplay randomness flows through a
//! single [`SyncedRng`] stream so that every peer given the same seed and
//! the same sequence of draws reproduces bit-identical worlds and
//! decisions. Cosmetic effects that must not disturb the synced stream can
//! derive their own local stream via [`derive_seed`].

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// ---------------------------------------------------------------------------
// Seed derivation
// ---------------------------------------------------------------------------

/// Folds a seed string into a u64 with FNV-1a. Stable across platforms,
/// runs, and compiler versions; the empty string is a valid seed.
pub fn seed_from_str(seed: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in seed.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Derives a sub-seed by hash-combining a base seed with arbitrary
/// hashable parts (e.g. positions, counters). The same inputs always
/// produce the same derived seed.
pub fn derive_seed<H: Hash>(base: u64, parts: &H) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    parts.hash(&mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// SyncedRng
// ---------------------------------------------------------------------------

/// The synchronized deterministic random stream.
///
/// Backed by ChaCha8, which produces an identical sequence for the same
/// seed regardless of platform. Draws must happen in the same order on
/// every peer; interleaving draws from another subsystem mid-generation
/// desynchronizes the world.
pub struct SyncedRng {
    rng: ChaCha8Rng,
}

impl SyncedRng {
    /// Creates a stream seeded from a u64 (typically [`seed_from_str`]).
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Creates a stream directly from a seed string.
    pub fn from_str_seed(seed: &str) -> Self {
        Self::new(seed_from_str(seed))
    }

    /// Resets the stream to the start of the sequence for `seed`.
    pub fn set_synced_seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draws a float uniformly from `[min, max)`. Returns `min` when the
    /// range is empty or inverted.
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..max)
    }

    /// Draws an integer uniformly from `[min, max]` (both inclusive).
    /// Returns `min` when the range is inverted.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.rng.random_range(min..=max)
    }

    /// Draws an integer uniformly from `[0, max]` (inclusive).
    pub fn int(&mut self, max: i32) -> i32 {
        self.range_i32(0, max)
    }

    /// Draws a bool with probability `p` of `true`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_from_str_stable() {
        // Pinned values: changing these breaks every saved map.
        assert_eq!(seed_from_str(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(seed_from_str("a"), seed_from_str("a"));
        assert_ne!(seed_from_str("a"), seed_from_str("b"));
        assert_ne!(seed_from_str("ab"), seed_from_str("ba"));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SyncedRng::from_str_seed("a");
        let mut b = SyncedRng::from_str_seed("a");

        for _ in 0..1000 {
            assert_eq!(a.range_i32(0, 1000), b.range_i32(0, 1000));
            assert_eq!(a.range_f32(0.0, 500.0).to_bits(), b.range_f32(0.0, 500.0).to_bits());
        }
    }

    #[test]
    fn test_set_synced_seed_resets_stream() {
        let mut rng = SyncedRng::new(42);
        let first: Vec<i32> = (0..16).map(|_| rng.int(99)).collect();

        rng.set_synced_seed(42);
        let second: Vec<i32> = (0..16).map(|_| rng.int(99)).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = SyncedRng::new(7);
        for _ in 0..1000 {
            let v = rng.range_i32(3, 9);
            assert!((3..=9).contains(&v));

            let f = rng.range_f32(-10.0, 10.0);
            assert!((-10.0..10.0).contains(&f));
        }
    }

    #[test]
    fn test_degenerate_ranges() {
        let mut rng = SyncedRng::new(0);
        assert_eq!(rng.range_i32(5, 5), 5);
        assert_eq!(rng.range_i32(5, 2), 5);
        assert_eq!(rng.range_f32(1.0, 1.0), 1.0);
    }

    #[test]
    fn test_derive_seed_deterministic() {
        let a = derive_seed(99, &(120i64, 450i64, 3u32));
        let b = derive_seed(99, &(120i64, 450i64, 3u32));
        assert_eq!(a, b);

        // Changing any part changes the derived seed.
        assert_ne!(a, derive_seed(99, &(120i64, 450i64, 4u32)));
        assert_ne!(a, derive_seed(98, &(120i64, 450i64, 3u32)));
    }
}
