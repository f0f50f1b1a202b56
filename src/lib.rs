//! Unbounded 2D cellular automaton over chunked storage whose tiles switch
//! between sparse and dense representations with occupancy.

pub mod chunklife;
pub mod patterns;
pub mod render;
pub mod rules;

pub use chunklife::{Automaton, AutomatonConfig, Rule};
pub use rules::LifeLike;
