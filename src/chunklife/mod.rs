//! Chunked automaton engine internals and public API.

mod chunk;
mod coord;
mod coord_set;
mod engine;
mod error;
mod rule;

pub use chunk::{Chunk, DENSITY_THRESHOLD, StorageMode};
pub use coord::{
    CHUNK_CELLS, CHUNK_SIZE, ChunkCoord, CoordHasher, MOORE_OFFSETS, chunk_coord, local_coord,
    world_coord,
};
pub use engine::{Automaton, AutomatonConfig, StepStats, StorageStats};
pub use error::{EngineError, RuleParseError};
pub use rule::{CellState, FnRule, Neighborhood, Rule};
