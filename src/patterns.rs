//! Starting patterns, placed purely through [`Automaton::set_cell`].
//!
//! Offsets are `(dx, dy)` with y growing downwards, so the glider below
//! travels towards `+x, +y`.

use rand::{RngCore, SeedableRng};

use crate::chunklife::{Automaton, CellState, Rule};

/// Period-4 spaceship moving `(+1, +1)` every 4 generations.
pub const GLIDER: &[(i64, i64)] = &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)];

/// Methuselah that stabilizes after 1103 generations.
pub const R_PENTOMINO: &[(i64, i64)] = &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)];

pub const BLOCK: &[(i64, i64)] = &[(0, 0), (1, 0), (0, 1), (1, 1)];

pub const BLINKER: &[(i64, i64)] = &[(0, 0), (1, 0), (2, 0)];

/// Gosper glider gun, emitting a glider every 30 generations.
pub const GOSPER_GLIDER_GUN: &[(i64, i64)] = &[
    // left square
    (1, 5), (1, 6), (2, 5), (2, 6),
    // left part
    (11, 5), (11, 6), (11, 7), (12, 4), (12, 8), (13, 3), (13, 9), (14, 3), (14, 9),
    (15, 6), (16, 4), (16, 8), (17, 5), (17, 6), (17, 7), (18, 6),
    // right part
    (21, 3), (21, 4), (21, 5), (22, 3), (22, 4), (22, 5), (23, 2), (23, 6),
    (25, 1), (25, 2), (25, 6), (25, 7),
    // right square
    (35, 3), (35, 4), (36, 3), (36, 4),
];

/// Set every cell of `cells`, offset by `(x, y)`, to `state`.
pub fn place<S, R>(automaton: &mut Automaton<S, R>, x: i64, y: i64, cells: &[(i64, i64)], state: S)
where
    S: CellState,
    R: Rule<S>,
{
    for &(dx, dy) in cells {
        automaton.set_cell(x + dx, y + dy, state);
    }
}

pub fn glider<R: Rule<bool>>(automaton: &mut Automaton<bool, R>, x: i64, y: i64) {
    place(automaton, x, y, GLIDER, true);
}

pub fn r_pentomino<R: Rule<bool>>(automaton: &mut Automaton<bool, R>, x: i64, y: i64) {
    place(automaton, x, y, R_PENTOMINO, true);
}

pub fn block<R: Rule<bool>>(automaton: &mut Automaton<bool, R>, x: i64, y: i64) {
    place(automaton, x, y, BLOCK, true);
}

pub fn blinker<R: Rule<bool>>(automaton: &mut Automaton<bool, R>, x: i64, y: i64) {
    place(automaton, x, y, BLINKER, true);
}

pub fn gosper_glider_gun<R: Rule<bool>>(automaton: &mut Automaton<bool, R>, x: i64, y: i64) {
    place(automaton, x, y, GOSPER_GLIDER_GUN, true);
}

/// Fill a `width × height` rectangle at `(x, y)` with live cells at the
/// given density. The same seed always produces the same soup.
pub fn random_soup<R: Rule<bool>>(
    automaton: &mut Automaton<bool, R>,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    density: f64,
    seed: u64,
) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let threshold = (u64::MAX as f64 * density.clamp(0.0, 1.0)) as u64;

    for dy in 0..height {
        for dx in 0..width {
            if rng.next_u64() < threshold {
                automaton.set_cell(x + dx, y + dy, true);
            }
        }
    }
}
