use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use std::num::NonZeroUsize;

use super::chunk::{Chunk, StorageMode};
use super::coord::{
    ChunkCoord, CoordHasher, MOORE_OFFSETS, chunk_coord, local_coord, offset, world_coord,
};
use super::coord_set::CoordSet;
use super::error::EngineError;
use super::rule::{CellState, Neighborhood, Rule};

type ChunkMap<S> = HashMap<ChunkCoord, Chunk<S>, BuildHasherDefault<CoordHasher>>;

const DEFAULT_PARALLEL_MIN_CANDIDATES: usize = 4_096;
const THREADS_ENV: &str = "CHUNKLIFE_THREADS";

/// Configuration for an [`Automaton`] instance.
///
/// Use `AutomatonConfig::default()` for auto-detected defaults, or customise
/// individual knobs via the builder methods.
#[derive(Clone, Debug, Default)]
pub struct AutomatonConfig {
    /// Worker threads for the read phase.
    /// `None` means `CHUNKLIFE_THREADS` if set, else the available parallelism.
    pub thread_count: Option<usize>,
    /// Hard upper bound on threads regardless of detection.
    pub max_threads: Option<usize>,
    /// Candidate count at which the read phase goes parallel.
    /// `None` means 4096.
    pub parallel_min_candidates: Option<usize>,
}

impl AutomatonConfig {
    /// Set an explicit thread count for the read-phase pool.
    pub fn thread_count(mut self, n: usize) -> Self {
        self.thread_count = Some(n.max(1));
        self
    }

    /// Set a hard upper bound on threads.
    pub fn max_threads(mut self, n: usize) -> Self {
        self.max_threads = Some(n.max(1));
        self
    }

    /// Set the candidate count at which the read phase goes parallel.
    pub fn parallel_min_candidates(mut self, n: usize) -> Self {
        self.parallel_min_candidates = Some(n);
        self
    }
}

fn env_thread_count() -> Option<usize> {
    std::env::var(THREADS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// Resolve the thread count from a config, falling back to auto-detect.
fn resolve_thread_count(config: &AutomatonConfig) -> usize {
    let mut threads = config
        .thread_count
        .or_else(env_thread_count)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        });
    if let Some(cap) = config.max_threads {
        threads = threads.min(cap);
    }
    threads.max(1)
}

/// A single-threaded configuration needs no pool at all.
fn build_pool(threads: usize) -> Result<Option<rayon::ThreadPool>, EngineError> {
    if threads <= 1 {
        return Ok(None);
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("chunklife-read-{i}"))
        .build()
        .map(Some)
        .map_err(|source| EngineError::ThreadPool { threads, source })
}

/// Bookkeeping for the most recent [`Automaton::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Cells evaluated by the rule.
    pub candidates: usize,
    /// Cells whose state changed.
    pub updates: usize,
    /// Chunks evicted because they ended the step empty.
    pub evicted: usize,
}

/// Chunk counts per storage mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub dense: usize,
    pub sparse: usize,
}

/// Read-only view of one generation.
///
/// The read phase only ever holds this view, while commits need
/// `&mut Automaton`, so no write can land while any rule evaluation of the
/// same step is still in flight.
#[derive(Clone, Copy)]
struct Grid<'a, S> {
    chunks: &'a ChunkMap<S>,
    default_state: S,
}

impl<S: CellState> Grid<'_, S> {
    #[inline]
    fn get(&self, x: i64, y: i64) -> S {
        match self.chunks.get(&chunk_coord(x, y)) {
            Some(chunk) => {
                let (lx, ly) = local_coord(x, y);
                chunk.get(lx, ly)
            }
            None => self.default_state,
        }
    }

    #[inline]
    fn neighborhood(&self, x: i64, y: i64) -> Neighborhood<S> {
        let mut out = [self.default_state; 8];
        for (slot, &(dx, dy)) in out.iter_mut().zip(MOORE_OFFSETS.iter()) {
            if let Some((nx, ny)) = offset(x, y, dx, dy) {
                *slot = self.get(nx, ny);
            }
        }
        out
    }

    /// The cell's next state, if it differs from the current one.
    #[inline]
    fn evaluate<R: Rule<S>>(&self, rule: &R, x: i64, y: i64) -> Option<(i64, i64, S)> {
        let current = self.get(x, y);
        let next = rule.apply(current, &self.neighborhood(x, y));
        (next != current).then_some((x, y, next))
    }

    /// Every non-default cell plus its Moore neighborhood.
    fn collect_candidates(&self, out: &mut CoordSet) {
        out.begin_step();
        let occupied: usize = self.chunks.values().map(Chunk::occupied).sum();
        out.reserve_for(occupied.saturating_mul(3));

        for (&coord, chunk) in self.chunks.iter() {
            chunk.for_each_occupied(|lx, ly, _| {
                let (x, y) = world_coord(coord, lx, ly);
                out.insert(x, y);
                for &(dx, dy) in &MOORE_OFFSETS {
                    if let Some((nx, ny)) = offset(x, y, dx, dy) {
                        out.insert(nx, ny);
                    }
                }
            });
        }
    }
}

/// An unbounded 2D cellular automaton over chunked storage.
pub struct Automaton<S: CellState, R: Rule<S>> {
    chunks: ChunkMap<S>,
    rule: R,
    default_state: S,
    generation: u64,
    /// `None` runs the read phase on the calling thread.
    pool: Option<rayon::ThreadPool>,
    parallel_min_candidates: usize,
    /// Reusable candidate set for discovery.
    candidates: CoordSet,
    /// Reusable diff buffer between the read and commit phases.
    updates: Vec<(i64, i64, S)>,
    last_step: StepStats,
}

impl<S: CellState, R: Rule<S>> Automaton<S, R> {
    /// Automaton whose default state is `S::default()`.
    pub fn new(rule: R) -> Self {
        Self::with_default(rule, S::default())
    }

    pub fn with_default(rule: R, default_state: S) -> Self {
        Self::with_config(rule, default_state, AutomatonConfig::default())
    }

    /// Create an automaton with explicit configuration.
    ///
    /// If the thread pool cannot be built, the read phase runs serially.
    pub fn with_config(rule: R, default_state: S, config: AutomatonConfig) -> Self {
        let threads = resolve_thread_count(&config);
        let pool = build_pool(threads).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "falling back to a serial read phase");
            None
        });
        Self::from_parts(rule, default_state, pool, &config)
    }

    /// Like [`Automaton::with_config`], but reports pool failures.
    pub fn try_with_config(
        rule: R,
        default_state: S,
        config: AutomatonConfig,
    ) -> Result<Self, EngineError> {
        let pool = build_pool(resolve_thread_count(&config))?;
        Ok(Self::from_parts(rule, default_state, pool, &config))
    }

    fn from_parts(
        rule: R,
        default_state: S,
        pool: Option<rayon::ThreadPool>,
        config: &AutomatonConfig,
    ) -> Self {
        let parallel_min_candidates = config
            .parallel_min_candidates
            .unwrap_or(DEFAULT_PARALLEL_MIN_CANDIDATES);
        tracing::debug!(
            rule = rule.name(),
            threads = pool.as_ref().map_or(1, rayon::ThreadPool::current_num_threads),
            parallel_min_candidates,
            "automaton ready"
        );
        Self {
            chunks: ChunkMap::default(),
            rule,
            default_state,
            generation: 0,
            pool,
            parallel_min_candidates,
            candidates: CoordSet::new(),
            updates: Vec::new(),
            last_step: StepStats::default(),
        }
    }

    #[inline]
    fn grid(&self) -> Grid<'_, S> {
        Grid {
            chunks: &self.chunks,
            default_state: self.default_state,
        }
    }

    pub fn get_cell(&self, x: i64, y: i64) -> S {
        self.grid().get(x, y)
    }

    /// States of the 8 neighbors of `(x, y)`, in [`Neighborhood`] order.
    pub fn neighborhood(&self, x: i64, y: i64) -> Neighborhood<S> {
        self.grid().neighborhood(x, y)
    }

    /// Write a cell. Writing the default state never materializes a chunk.
    pub fn set_cell(&mut self, x: i64, y: i64, state: S) {
        let coord = chunk_coord(x, y);
        let (lx, ly) = local_coord(x, y);

        if state == self.default_state {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.set(lx, ly, state);
            }
            return;
        }

        let default_state = self.default_state;
        self.chunks
            .entry(coord)
            .or_insert_with(|| Chunk::new(default_state))
            .set(lx, ly, state);
    }

    /// Batch-write many cells in iteration order.
    pub fn set_cells<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (i64, i64, S)>,
    {
        for (x, y, state) in cells {
            self.set_cell(x, y, state);
        }
    }

    /// Advance exactly one generation.
    pub fn step(&mut self) {
        let grid = Grid {
            chunks: &self.chunks,
            default_state: self.default_state,
        };
        grid.collect_candidates(&mut self.candidates);

        let candidates = self.candidates.as_slice();
        let rule = &self.rule;
        let updates = &mut self.updates;
        updates.clear();
        match &self.pool {
            Some(pool) if candidates.len() >= self.parallel_min_candidates => {
                pool.install(|| {
                    updates.par_extend(
                        candidates
                            .par_iter()
                            .filter_map(|&(x, y)| grid.evaluate(rule, x, y)),
                    );
                });
            }
            _ => {
                updates.extend(
                    candidates
                        .iter()
                        .filter_map(|&(x, y)| grid.evaluate(rule, x, y)),
                );
            }
        }
        let candidate_count = candidates.len();

        let updates = std::mem::take(&mut self.updates);
        for &(x, y, state) in &updates {
            self.set_cell(x, y, state);
        }
        let update_count = updates.len();
        self.updates = updates;

        let before = self.chunks.len();
        self.chunks.retain(|_, chunk| !chunk.is_empty());
        let evicted = before - self.chunks.len();

        self.generation += 1;
        self.last_step = StepStats {
            candidates: candidate_count,
            updates: update_count,
            evicted,
        };
        tracing::trace!(
            generation = self.generation,
            candidates = candidate_count,
            updates = update_count,
            evicted,
            chunks = self.chunks.len(),
            "step"
        );
    }

    /// Advance `generations` generations, one full step at a time.
    pub fn run(&mut self, generations: u64) {
        for _ in 0..generations {
            self.step();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of materialized chunks.
    pub fn active_chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn last_step(&self) -> StepStats {
        self.last_step
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn default_state(&self) -> S {
        self.default_state
    }

    /// Number of non-default cells.
    pub fn population(&self) -> u64 {
        self.chunks.values().map(|c| c.occupied() as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.values().all(Chunk::is_empty)
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of the non-default cells.
    pub fn bounds(&self) -> Option<(i64, i64, i64, i64)> {
        let mut bounds: Option<(i64, i64, i64, i64)> = None;
        self.for_each_cell(|x, y, _| {
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        });
        bounds
    }

    /// Visit every non-default cell as `(x, y, state)`. Order is unspecified.
    pub fn for_each_cell<F: FnMut(i64, i64, S)>(&self, mut f: F) {
        for (&coord, chunk) in self.chunks.iter() {
            chunk.for_each_occupied(|lx, ly, state| {
                let (x, y) = world_coord(coord, lx, ly);
                f(x, y, state);
            });
        }
    }

    /// Drop every chunk. The generation counter is left alone.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn storage_stats(&self) -> StorageStats {
        let mut stats = StorageStats::default();
        for chunk in self.chunks.values() {
            match chunk.mode() {
                StorageMode::Dense => stats.dense += 1,
                StorageMode::Sparse => stats.sparse += 1,
            }
        }
        stats
    }

    /// Storage mode of the chunk containing `(x, y)`, if it is materialized.
    pub fn chunk_mode(&self, x: i64, y: i64) -> Option<StorageMode> {
        self.chunks.get(&chunk_coord(x, y)).map(Chunk::mode)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use rand::{Rng, SeedableRng};

    use super::{Automaton, AutomatonConfig, StorageMode, resolve_thread_count};
    use crate::chunklife::coord::CHUNK_SIZE;
    use crate::chunklife::rule::{FnRule, Neighborhood};
    use crate::rules::LifeLike;

    fn seeded_soup(engine: &mut Automaton<bool, LifeLike>, seed: u64, side: i64) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for y in -side..side {
            for x in -side..side {
                if rng.random_bool(0.35) {
                    engine.set_cell(x, y, true);
                }
            }
        }
    }

    fn fingerprint(engine: &Automaton<bool, LifeLike>) -> (u64, u64) {
        let mut cells = Vec::new();
        engine.for_each_cell(|x, y, _| cells.push((x, y)));
        cells.sort_unstable();
        let mut hasher = DefaultHasher::new();
        cells.hash(&mut hasher);
        (engine.population(), hasher.finish())
    }

    #[test]
    fn thread_config_is_clamped() {
        let config = AutomatonConfig::default().thread_count(8).max_threads(2);
        assert_eq!(resolve_thread_count(&config), 2);
        let config = AutomatonConfig::default().thread_count(0);
        assert_eq!(resolve_thread_count(&config), 1);
    }

    #[test]
    fn serial_and_parallel_read_phases_agree() {
        let serial_config = AutomatonConfig::default().thread_count(1);
        let parallel_config = AutomatonConfig::default()
            .thread_count(4)
            .parallel_min_candidates(0);

        let mut serial = Automaton::with_config(LifeLike::conway(), false, serial_config);
        let mut parallel = Automaton::with_config(LifeLike::conway(), false, parallel_config);
        seeded_soup(&mut serial, 0xA55A_CE11_1234_5678, 80);
        seeded_soup(&mut parallel, 0xA55A_CE11_1234_5678, 80);

        for _ in 0..12 {
            serial.step();
            parallel.step();
            assert_eq!(fingerprint(&serial), fingerprint(&parallel));
            assert_eq!(serial.last_step(), parallel.last_step());
        }
    }

    #[test]
    fn try_with_config_builds_pool() {
        let engine = Automaton::<bool, _>::try_with_config(
            LifeLike::conway(),
            false,
            AutomatonConfig::default().thread_count(2),
        );
        assert!(engine.is_ok());
    }

    #[test]
    fn reads_observe_only_the_previous_generation() {
        // Every cell copies its west neighbor. With in-place updates a row
        // would smear rightwards within one step; with phase separation it
        // shifts by exactly one cell.
        let rule = FnRule(|_: u8, n: &Neighborhood<u8>| n[3]);
        let mut engine = Automaton::new(rule);
        for x in 0..5 {
            engine.set_cell(x, 0, 1 + x as u8);
        }
        engine.step();
        assert_eq!(engine.get_cell(0, 0), 0);
        for x in 1..6 {
            assert_eq!(engine.get_cell(x, 0), x as u8, "cell ({x},0)");
        }
        assert_eq!(engine.get_cell(6, 0), 0);
    }

    #[test]
    fn non_zero_default_state_is_honoured() {
        // Cells are 1 ("background") unless set; a 0 cell reverts to background
        // after one step.
        let rule = FnRule(|_: u8, _: &Neighborhood<u8>| 1u8);
        let mut engine = Automaton::with_default(rule, 1u8);
        assert_eq!(engine.get_cell(10, -10), 1);
        engine.set_cell(10, -10, 1);
        assert_eq!(engine.active_chunk_count(), 0);
        engine.set_cell(10, -10, 0);
        assert_eq!(engine.active_chunk_count(), 1);
        assert_eq!(engine.population(), 1);
        engine.step();
        assert_eq!(engine.get_cell(10, -10), 1);
        assert_eq!(engine.active_chunk_count(), 0);
    }

    #[test]
    fn dense_chunk_tracks_soup_and_empties_out() {
        let mut engine = Automaton::new(LifeLike::conway());
        let side = CHUNK_SIZE as i64;
        for y in 0..side {
            for x in 0..side {
                if (x + y) % 2 == 0 {
                    engine.set_cell(x, y, true);
                }
            }
        }
        assert_eq!(engine.chunk_mode(0, 0), Some(StorageMode::Dense));
        assert_eq!(engine.storage_stats().dense, 1);

        // Remove everything by hand: chunk survives until the next step.
        for y in 0..side {
            for x in 0..side {
                engine.set_cell(x, y, false);
            }
        }
        assert_eq!(engine.chunk_mode(0, 0), Some(StorageMode::Sparse));
        assert_eq!(engine.active_chunk_count(), 1);
        engine.step();
        assert_eq!(engine.active_chunk_count(), 0);
        assert_eq!(engine.generation(), 1);
    }

    #[test]
    fn cells_at_the_edge_of_the_plane_do_not_overflow() {
        let mut engine = Automaton::new(LifeLike::conway());
        let block = [
            (i64::MAX - 1, i64::MAX - 1),
            (i64::MAX, i64::MAX - 1),
            (i64::MAX - 1, i64::MAX),
            (i64::MAX, i64::MAX),
        ];
        for &(x, y) in &block {
            engine.set_cell(x, y, true);
        }
        engine.set_cell(i64::MIN, i64::MIN, true);
        engine.step();
        for &(x, y) in &block {
            assert!(engine.get_cell(x, y));
        }
        assert!(!engine.get_cell(i64::MIN, i64::MIN));
        assert_eq!(engine.population(), 4);
    }

    #[test]
    fn bounds_and_clear() {
        let mut engine = Automaton::new(LifeLike::conway());
        assert_eq!(engine.bounds(), None);
        engine.set_cell(-70, 5, true);
        engine.set_cell(3, -200, true);
        assert_eq!(engine.bounds(), Some((-70, -200, 3, 5)));
        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.active_chunk_count(), 0);
    }

    #[test]
    fn step_stats_count_work() {
        let mut engine = Automaton::new(LifeLike::conway());
        engine.set_cell(0, 0, true);
        engine.step();
        let stats = engine.last_step();
        assert_eq!(stats.candidates, 9);
        assert_eq!(stats.updates, 1);
        assert_eq!(stats.evicted, 1);
    }

    #[test]
    fn random_soup_population_is_stable_across_thread_counts() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let cells: Vec<(i64, i64, bool)> = (0..2_000)
            .map(|_| (rng.random_range(-150..150), rng.random_range(-150..150), true))
            .collect();

        let mut results = Vec::new();
        for threads in [1usize, 2, 3] {
            let mut engine = Automaton::with_config(
                LifeLike::conway(),
                false,
                AutomatonConfig::default()
                    .thread_count(threads)
                    .parallel_min_candidates(1),
            );
            engine.set_cells(cells.iter().copied());
            engine.run(20);
            results.push(fingerprint(&engine));
        }
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }
}
