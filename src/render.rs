//! Text rendering of a rectangular window, built only on `get_cell`.

use crate::chunklife::{Automaton, CellState, Rule};

pub const LIVE: char = '#';
pub const DEAD: char = '.';

/// Render the inclusive window `[min_x, max_x] × [min_y, max_y]`, one line
/// per row, with non-default cells as `#` and default cells as `.`.
pub fn render_window<S, R>(
    automaton: &Automaton<S, R>,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
) -> String
where
    S: CellState,
    R: Rule<S>,
{
    let default_state = automaton.default_state();
    render_window_with(automaton, min_x, min_y, max_x, max_y, |state| {
        if state == default_state { DEAD } else { LIVE }
    })
}

/// Like [`render_window`], with a caller-chosen glyph per state.
pub fn render_window_with<S, R, F>(
    automaton: &Automaton<S, R>,
    min_x: i64,
    min_y: i64,
    max_x: i64,
    max_y: i64,
    glyph: F,
) -> String
where
    S: CellState,
    R: Rule<S>,
    F: Fn(S) -> char,
{
    let mut out = String::new();
    if min_x > max_x || min_y > max_y {
        return out;
    }
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            out.push(glyph(automaton.get_cell(x, y)));
        }
        out.push('\n');
    }
    out
}

/// Render the bounding box of the live cells plus `margin` on each side, or
/// an empty string for an empty automaton.
pub fn render_live<S, R>(automaton: &Automaton<S, R>, margin: i64) -> String
where
    S: CellState,
    R: Rule<S>,
{
    match automaton.bounds() {
        Some((min_x, min_y, max_x, max_y)) => render_window(
            automaton,
            min_x.saturating_sub(margin),
            min_y.saturating_sub(margin),
            max_x.saturating_add(margin),
            max_y.saturating_add(margin),
        ),
        None => String::new(),
    }
}

/// One-line summary used by the demo and benchmark binaries.
pub fn summary<S, R>(automaton: &Automaton<S, R>) -> String
where
    S: CellState,
    R: Rule<S>,
{
    format!(
        "generation {} | population {} | active chunks {}",
        automaton.generation(),
        automaton.population(),
        automaton.active_chunk_count()
    )
}
