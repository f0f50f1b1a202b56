//! World ↔ chunk coordinate mapping.
//!
//! World coordinates are unbounded `i64` pairs. A chunk covers a
//! `CHUNK_SIZE × CHUNK_SIZE` square: the chunk coordinate is the floor
//! division of the world coordinate and the local coordinate is the floor
//! modulo, so negative coordinates tile the plane without a seam at the
//! origin.

use std::hash::Hasher;

pub const CHUNK_SIZE: usize = 64;
pub const CHUNK_CELLS: usize = CHUNK_SIZE * CHUNK_SIZE;
pub(crate) const CHUNK_SIZE_I64: i64 = CHUNK_SIZE as i64;

/// Chunk-space coordinate `(cx, cy)`.
pub type ChunkCoord = (i64, i64);

/// Moore neighborhood offsets in row-major order, center excluded.
pub const MOORE_OFFSETS: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1,  0),          (1,  0),
    (-1,  1), (0,  1), (1,  1),
];

#[inline(always)]
pub fn chunk_coord(x: i64, y: i64) -> ChunkCoord {
    (x.div_euclid(CHUNK_SIZE_I64), y.div_euclid(CHUNK_SIZE_I64))
}

#[inline(always)]
pub fn local_coord(x: i64, y: i64) -> (usize, usize) {
    (
        x.rem_euclid(CHUNK_SIZE_I64) as usize,
        y.rem_euclid(CHUNK_SIZE_I64) as usize,
    )
}

/// World coordinate of a cell given its chunk and local position.
///
/// Exact for every chunk coordinate produced by [`chunk_coord`]: the chunk
/// origin of `i64::MIN` is `i64::MIN` itself and the last chunk ends at
/// `i64::MAX`.
#[inline(always)]
pub fn world_coord(chunk: ChunkCoord, local_x: usize, local_y: usize) -> (i64, i64) {
    (
        chunk.0 * CHUNK_SIZE_I64 + local_x as i64,
        chunk.1 * CHUNK_SIZE_I64 + local_y as i64,
    )
}

/// Offset a world coordinate, or `None` if it would leave the `i64` plane.
#[inline(always)]
pub fn offset(x: i64, y: i64, dx: i64, dy: i64) -> Option<(i64, i64)> {
    Some((x.checked_add(dx)?, y.checked_add(dy)?))
}

// ── Hashing ─────────────────────────────────────────────────────────────

/// Two distinct Fibonacci-derived constants for mixing x and y independently,
/// so grid-aligned chunk coordinates do not collide systematically.
const MX: u64 = 0x517c_c1b7_2722_0a95;
const MY: u64 = 0x6c62_272e_07bb_0142;

#[inline(always)]
pub(crate) fn coord_hash(x: i64, y: i64) -> u64 {
    (x as u64).wrapping_mul(MX) ^ (y as u64).wrapping_mul(MY).rotate_right(31)
}

/// `Hasher` for `(i64, i64)` keys that applies [`coord_hash`] to the two
/// written words. Anything else hashed through it falls back to folding
/// 8-byte words into the state.
#[derive(Clone, Copy, Default)]
pub struct CoordHasher {
    hash: u64,
    words: u32,
}

impl Hasher for CoordHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            self.write_u64(u64::from_le_bytes(word));
        }
    }

    #[inline(always)]
    fn write_u64(&mut self, v: u64) {
        self.hash = match self.words {
            0 => v.wrapping_mul(MX),
            1 => self.hash ^ v.wrapping_mul(MY).rotate_right(31),
            _ => (self.hash.rotate_left(26) ^ v).wrapping_mul(MX),
        };
        self.words = self.words.wrapping_add(1);
    }

    #[inline(always)]
    fn write_i64(&mut self, v: i64) {
        self.write_u64(v as u64);
    }
}

#[cfg(test)]
mod tests {
    use std::hash::{Hash, Hasher};

    use super::*;

    #[test]
    fn mapping_round_trips_across_sign_boundary() {
        for x in -10_000i64..=10_000 {
            let (cx, _) = chunk_coord(x, 0);
            let (lx, _) = local_coord(x, 0);
            assert!(lx < CHUNK_SIZE, "local {lx} out of range for {x}");
            assert_eq!(cx * CHUNK_SIZE_I64 + lx as i64, x);
        }
    }

    #[test]
    fn negative_coordinates_use_floor_division() {
        assert_eq!(chunk_coord(-1, -1), (-1, -1));
        assert_eq!(local_coord(-1, -1), (63, 63));
        assert_eq!(chunk_coord(-64, 63), (-1, 0));
        assert_eq!(local_coord(-64, 63), (0, 63));
        assert_eq!(chunk_coord(-65, 64), (-2, 1));
        assert_eq!(local_coord(-65, 64), (63, 0));
    }

    #[test]
    fn extremes_map_exactly() {
        for v in [i64::MIN, i64::MIN + 1, i64::MAX - 1, i64::MAX] {
            let chunk = chunk_coord(v, v);
            let (lx, ly) = local_coord(v, v);
            assert_eq!(world_coord(chunk, lx, ly), (v, v));
        }
    }

    #[test]
    fn offset_refuses_to_leave_the_plane() {
        assert_eq!(offset(i64::MAX, 0, 1, 0), None);
        assert_eq!(offset(0, i64::MIN, 0, -1), None);
        assert_eq!(offset(i64::MAX, i64::MIN, -1, 1), Some((i64::MAX - 1, i64::MIN + 1)));
    }

    #[test]
    fn hasher_matches_coord_hash_for_tuples() {
        let mut hasher = CoordHasher::default();
        (-7i64, 12i64).hash(&mut hasher);
        assert_eq!(hasher.finish(), coord_hash(-7, 12));
    }

    #[test]
    fn hash_mix_avoids_simple_axis_cancellation_pattern() {
        let mut hashes = std::collections::BTreeSet::new();
        for k in 0..64i64 {
            hashes.insert(coord_hash(-k, k << 32));
        }
        assert_eq!(hashes.len(), 64);
    }

    #[test]
    fn hash_mix_spreads_axis_aligned_coordinates() {
        let mut x_buckets = std::collections::BTreeSet::new();
        let mut y_buckets = std::collections::BTreeSet::new();
        let bucket_mask = (1u64 << 16) - 1;
        for i in 0..(1i64 << 16) {
            x_buckets.insert(coord_hash(i, 0) & bucket_mask);
            y_buckets.insert(coord_hash(0, i) & bucket_mask);
        }
        assert!(x_buckets.len() >= 40_000, "x spread {}", x_buckets.len());
        assert!(y_buckets.len() >= 40_000, "y spread {}", y_buckets.len());
    }
}
