//! Life-like (outer-totalistic, two-state) rules such as B3/S23.

use std::fmt;
use std::str::FromStr;

use crate::chunklife::{Neighborhood, Rule, RuleParseError};

/// A birth/survival rule over live-neighbor counts.
///
/// Bit `n` of `birth` set means a dead cell with `n` live neighbors is born;
/// bit `n` of `survive` set means a live cell with `n` live neighbors stays
/// alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LifeLike {
    birth: u16,
    survive: u16,
}

const COUNT_MASK: u16 = 0x1ff;

impl LifeLike {
    pub const fn from_masks(birth: u16, survive: u16) -> Self {
        Self {
            birth: birth & COUNT_MASK,
            survive: survive & COUNT_MASK,
        }
    }

    /// B3/S23.
    pub const fn conway() -> Self {
        Self::from_masks(1 << 3, (1 << 2) | (1 << 3))
    }

    /// B36/S23.
    pub const fn highlife() -> Self {
        Self::from_masks((1 << 3) | (1 << 6), (1 << 2) | (1 << 3))
    }

    #[inline]
    pub fn births_on(&self, live_neighbors: usize) -> bool {
        live_neighbors <= 8 && self.birth & (1 << live_neighbors) != 0
    }

    #[inline]
    pub fn survives_on(&self, live_neighbors: usize) -> bool {
        live_neighbors <= 8 && self.survive & (1 << live_neighbors) != 0
    }
}

impl Default for LifeLike {
    fn default() -> Self {
        Self::conway()
    }
}

impl Rule<bool> for LifeLike {
    #[inline]
    fn apply(&self, current: bool, neighbors: &Neighborhood<bool>) -> bool {
        let live = neighbors.iter().filter(|&&n| n).count();
        if current {
            self.survives_on(live)
        } else {
            self.births_on(live)
        }
    }

    fn name(&self) -> &str {
        if *self == Self::conway() {
            "Conway's Game of Life"
        } else if *self == Self::highlife() {
            "HighLife"
        } else {
            "Life-like"
        }
    }

    fn notation(&self) -> Option<String> {
        Some(self.to_string())
    }
}

fn write_counts(f: &mut fmt::Formatter<'_>, mask: u16) -> fmt::Result {
    for n in 0..=8u16 {
        if mask & (1 << n) != 0 {
            write!(f, "{n}")?;
        }
    }
    Ok(())
}

impl fmt::Display for LifeLike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B")?;
        write_counts(f, self.birth)?;
        f.write_str("/S")?;
        write_counts(f, self.survive)
    }
}

fn parse_counts(digits: &str) -> Result<u16, RuleParseError> {
    digits.chars().try_fold(0u16, |mask, c| match c.to_digit(10) {
        Some(n) if n <= 8 => Ok(mask | (1 << n)),
        _ => Err(RuleParseError::InvalidCount(c)),
    })
}

/// Split a leading `B`/`S` prefix off one half of a rulestring.
fn split_prefix(part: &str) -> (Option<char>, &str) {
    match part.chars().next() {
        Some(c @ ('b' | 'B' | 's' | 'S')) => (Some(c.to_ascii_uppercase()), &part[1..]),
        _ => (None, part),
    }
}

impl FromStr for LifeLike {
    type Err = RuleParseError;

    /// Accepts `B3/S23`, `S23/B3` (any case) and the bare survival-first
    /// `23/3` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RuleParseError::Empty);
        }
        let mut parts = s.split('/');
        let (Some(first), Some(second), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(RuleParseError::Separator(s.to_string()));
        };

        let (birth, survive) = match (split_prefix(first.trim()), split_prefix(second.trim())) {
            ((Some('B'), born), (Some('S'), kept)) | ((Some('S'), kept), (Some('B'), born)) => {
                (born, kept)
            }
            ((None, kept), (None, born)) => (born, kept),
            _ => return Err(RuleParseError::MixedForm(s.to_string())),
        };

        Ok(Self::from_masks(parse_counts(birth)?, parse_counts(survive)?))
    }
}
