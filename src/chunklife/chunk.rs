//! Chunk storage with occupancy-driven sparse/dense switching.
//!
//! A chunk starts sparse (a map of non-default cells) and converts to a
//! flat dense buffer once more than `DENSITY_THRESHOLD` of its cells are
//! occupied. It only reverts to sparse when occupancy falls to half the
//! threshold, so a chunk hovering near one boundary does not convert on
//! every write.

use rustc_hash::FxHashMap;

use super::coord::{CHUNK_CELLS, CHUNK_SIZE};
use super::rule::CellState;

/// Occupancy ratio above which a sparse chunk becomes dense.
pub const DENSITY_THRESHOLD: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageMode {
    Dense,
    Sparse,
}

#[derive(Clone, Debug)]
enum Storage<S> {
    /// Row-major `y * CHUNK_SIZE + x`, always `CHUNK_CELLS` long.
    Dense(Box<[S]>),
    /// Local index → state. Never holds the default state.
    Sparse(FxHashMap<u16, S>),
}

#[derive(Clone, Debug)]
pub struct Chunk<S> {
    storage: Storage<S>,
    default_state: S,
    /// Number of cells holding a non-default state.
    occupied: usize,
}

#[inline(always)]
fn local_index(local_x: usize, local_y: usize) -> Option<u16> {
    if local_x >= CHUNK_SIZE || local_y >= CHUNK_SIZE {
        return None;
    }
    Some((local_y * CHUNK_SIZE + local_x) as u16)
}

#[inline(always)]
fn density(occupied: usize) -> f64 {
    occupied as f64 / CHUNK_CELLS as f64
}

#[inline(always)]
fn should_be_dense(occupied: usize) -> bool {
    density(occupied) > DENSITY_THRESHOLD
}

#[inline(always)]
fn should_be_sparse(occupied: usize) -> bool {
    density(occupied) <= DENSITY_THRESHOLD * 0.5
}

impl<S: CellState> Chunk<S> {
    /// An empty sparse chunk whose absent cells read as `default_state`.
    pub fn new(default_state: S) -> Self {
        Self {
            storage: Storage::Sparse(FxHashMap::default()),
            default_state,
            occupied: 0,
        }
    }

    #[inline]
    pub fn mode(&self) -> StorageMode {
        match self.storage {
            Storage::Dense(_) => StorageMode::Dense,
            Storage::Sparse(_) => StorageMode::Sparse,
        }
    }

    #[inline]
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn default_state(&self) -> S {
        self.default_state
    }

    /// Read a cell. Coordinates outside the chunk read as the default state.
    #[inline]
    pub fn get(&self, local_x: usize, local_y: usize) -> S {
        let Some(index) = local_index(local_x, local_y) else {
            return self.default_state;
        };
        match &self.storage {
            Storage::Dense(cells) => cells[index as usize],
            Storage::Sparse(cells) => cells.get(&index).copied().unwrap_or(self.default_state),
        }
    }

    /// Write a cell, then re-evaluate the storage mode. Coordinates outside
    /// the chunk are ignored.
    pub fn set(&mut self, local_x: usize, local_y: usize, state: S) {
        let Some(index) = local_index(local_x, local_y) else {
            return;
        };
        let default_state = self.default_state;
        let is_set = state != default_state;

        match &mut self.storage {
            Storage::Dense(cells) => {
                let slot = &mut cells[index as usize];
                let was_set = *slot != default_state;
                *slot = state;
                match (was_set, is_set) {
                    (false, true) => self.occupied += 1,
                    (true, false) => self.occupied -= 1,
                    _ => {}
                }
                if should_be_sparse(self.occupied) {
                    self.convert_to_sparse();
                }
            }
            Storage::Sparse(cells) => {
                if is_set {
                    if cells.insert(index, state).is_none() {
                        self.occupied += 1;
                    }
                } else if cells.remove(&index).is_some() {
                    self.occupied -= 1;
                }
                debug_assert_eq!(self.occupied, cells.len());
                if should_be_dense(self.occupied) {
                    self.convert_to_dense();
                }
            }
        }
    }

    /// `true` iff every cell holds the default state.
    #[inline]
    pub fn is_empty(&self) -> bool {
        debug_assert_eq!(self.occupied == 0, self.scan_is_empty());
        self.occupied == 0
    }

    fn scan_is_empty(&self) -> bool {
        match &self.storage {
            Storage::Dense(cells) => cells.iter().all(|&s| s == self.default_state),
            Storage::Sparse(cells) => cells.is_empty(),
        }
    }

    pub fn convert_to_dense(&mut self) {
        let Storage::Sparse(cells) = &self.storage else {
            return;
        };
        let mut dense = vec![self.default_state; CHUNK_CELLS].into_boxed_slice();
        for (&index, &state) in cells.iter() {
            dense[index as usize] = state;
        }
        tracing::debug!(occupied = self.occupied, "chunk sparse -> dense");
        self.storage = Storage::Dense(dense);
    }

    pub fn convert_to_sparse(&mut self) {
        let Storage::Dense(cells) = &self.storage else {
            return;
        };
        let default_state = self.default_state;
        let mut sparse = FxHashMap::default();
        sparse.reserve(self.occupied);
        for (index, &state) in cells.iter().enumerate() {
            if state != default_state {
                sparse.insert(index as u16, state);
            }
        }
        tracing::debug!(occupied = self.occupied, "chunk dense -> sparse");
        self.storage = Storage::Sparse(sparse);
    }

    /// Visit every non-default cell as `(local_x, local_y, state)`.
    pub fn for_each_occupied<F: FnMut(usize, usize, S)>(&self, mut f: F) {
        match &self.storage {
            Storage::Dense(cells) => {
                if self.occupied == 0 {
                    return;
                }
                for (index, &state) in cells.iter().enumerate() {
                    if state != self.default_state {
                        f(index % CHUNK_SIZE, index / CHUNK_SIZE, state);
                    }
                }
            }
            Storage::Sparse(cells) => {
                for (&index, &state) in cells.iter() {
                    let index = index as usize;
                    f(index % CHUNK_SIZE, index / CHUNK_SIZE, state);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTER_DENSE: usize = 1229;
    const LEAVE_DENSE: usize = 614;

    fn cell(i: usize) -> (usize, usize) {
        (i % CHUNK_SIZE, i / CHUNK_SIZE)
    }

    fn fill(chunk: &mut Chunk<bool>, range: std::ops::Range<usize>, state: bool) {
        for i in range {
            let (x, y) = cell(i);
            chunk.set(x, y, state);
        }
    }

    #[test]
    fn thresholds_sit_where_expected() {
        assert!(!should_be_dense(ENTER_DENSE - 1));
        assert!(should_be_dense(ENTER_DENSE));
        assert!(!should_be_sparse(LEAVE_DENSE + 1));
        assert!(should_be_sparse(LEAVE_DENSE));
    }

    #[test]
    fn out_of_range_is_a_no_op() {
        let mut chunk = Chunk::new(0u8);
        chunk.set(CHUNK_SIZE, 0, 7);
        chunk.set(0, CHUNK_SIZE, 7);
        assert!(chunk.is_empty());
        assert_eq!(chunk.get(CHUNK_SIZE, 3), 0);
        assert_eq!(chunk.get(usize::MAX, usize::MAX), 0);
    }

    #[test]
    fn sparse_write_of_default_removes_entry() {
        let mut chunk = Chunk::new(0u8);
        chunk.set(3, 4, 9);
        assert_eq!(chunk.get(3, 4), 9);
        assert_eq!(chunk.occupied(), 1);
        chunk.set(3, 4, 0);
        assert_eq!(chunk.get(3, 4), 0);
        assert!(chunk.is_empty());
    }

    #[test]
    fn overwriting_does_not_double_count() {
        let mut chunk = Chunk::new(0i32);
        chunk.set(1, 1, 5);
        chunk.set(1, 1, -5);
        assert_eq!(chunk.occupied(), 1);
        assert_eq!(chunk.get(1, 1), -5);
    }

    #[test]
    fn converts_to_dense_just_above_threshold() {
        let mut chunk = Chunk::new(false);
        fill(&mut chunk, 0..ENTER_DENSE - 1, true);
        assert_eq!(chunk.mode(), StorageMode::Sparse);
        fill(&mut chunk, ENTER_DENSE - 1..ENTER_DENSE, true);
        assert_eq!(chunk.mode(), StorageMode::Dense);
        assert_eq!(chunk.occupied(), ENTER_DENSE);
        for i in 0..ENTER_DENSE {
            let (x, y) = cell(i);
            assert!(chunk.get(x, y));
        }
    }

    #[test]
    fn reverts_to_sparse_at_half_threshold() {
        let mut chunk = Chunk::new(false);
        fill(&mut chunk, 0..ENTER_DENSE, true);
        assert_eq!(chunk.mode(), StorageMode::Dense);

        fill(&mut chunk, LEAVE_DENSE + 1..ENTER_DENSE, false);
        assert_eq!(chunk.occupied(), LEAVE_DENSE + 1);
        assert_eq!(chunk.mode(), StorageMode::Dense);

        fill(&mut chunk, LEAVE_DENSE..LEAVE_DENSE + 1, false);
        assert_eq!(chunk.mode(), StorageMode::Sparse);
        assert_eq!(chunk.occupied(), LEAVE_DENSE);
        for i in 0..LEAVE_DENSE {
            let (x, y) = cell(i);
            assert!(chunk.get(x, y));
        }
    }

    #[test]
    fn toggling_inside_the_band_never_flaps() {
        let mut chunk = Chunk::new(false);
        fill(&mut chunk, 0..ENTER_DENSE, true);
        let (x, y) = cell(ENTER_DENSE - 1);
        for _ in 0..10 {
            chunk.set(x, y, false);
            assert_eq!(chunk.mode(), StorageMode::Dense);
            chunk.set(x, y, true);
            assert_eq!(chunk.mode(), StorageMode::Dense);
        }

        fill(&mut chunk, LEAVE_DENSE..ENTER_DENSE, false);
        assert_eq!(chunk.mode(), StorageMode::Sparse);
        let (x, y) = cell(LEAVE_DENSE);
        for _ in 0..10 {
            chunk.set(x, y, true);
            assert_eq!(chunk.mode(), StorageMode::Sparse);
            chunk.set(x, y, false);
            assert_eq!(chunk.mode(), StorageMode::Sparse);
        }
    }

    #[test]
    fn dense_mode_may_store_default_values() {
        let mut chunk = Chunk::new(false);
        fill(&mut chunk, 0..ENTER_DENSE, true);
        chunk.set(0, 0, false);
        assert_eq!(chunk.mode(), StorageMode::Dense);
        assert!(!chunk.get(0, 0));
        assert!(!chunk.is_empty());
    }

    #[test]
    fn conversions_are_idempotent() {
        let mut chunk = Chunk::new(0u8);
        chunk.set(10, 20, 3);
        chunk.convert_to_sparse();
        assert_eq!(chunk.mode(), StorageMode::Sparse);
        chunk.convert_to_dense();
        chunk.convert_to_dense();
        assert_eq!(chunk.mode(), StorageMode::Dense);
        assert_eq!(chunk.get(10, 20), 3);
        chunk.convert_to_sparse();
        assert_eq!(chunk.get(10, 20), 3);
        assert_eq!(chunk.occupied(), 1);
    }

    #[test]
    fn non_zero_default_is_respected() {
        let mut chunk = Chunk::new(2u8);
        assert_eq!(chunk.get(5, 5), 2);
        chunk.set(5, 5, 0);
        assert_eq!(chunk.occupied(), 1);
        chunk.set(5, 5, 2);
        assert!(chunk.is_empty());
    }

    #[test]
    fn for_each_occupied_visits_both_modes() {
        let mut chunk = Chunk::new(false);
        chunk.set(1, 2, true);
        chunk.set(63, 63, true);
        let mut seen = Vec::new();
        chunk.for_each_occupied(|x, y, _| seen.push((x, y)));
        seen.sort_unstable();
        assert_eq!(seen, vec![(1, 2), (63, 63)]);

        chunk.convert_to_dense();
        let mut seen = Vec::new();
        chunk.for_each_occupied(|x, y, _| seen.push((x, y)));
        assert_eq!(seen, vec![(1, 2), (63, 63)]);
    }
}
