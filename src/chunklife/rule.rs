//! Cell state and transition rule contracts.

use std::fmt;
use std::sync::Arc;

/// A value a cell can hold. `Default::default()` is the conventional dead
/// state, although an automaton may be built with any other default.
pub trait CellState: Copy + Eq + Default + fmt::Debug + Send + Sync + 'static {}

impl<T> CellState for T where T: Copy + Eq + Default + fmt::Debug + Send + Sync + 'static {}

/// States of the 8 Moore neighbors, row-major with the center skipped:
/// `(-1,-1) (0,-1) (1,-1) (-1,0) (1,0) (-1,1) (0,1) (1,1)`.
///
/// Rules that only count states can treat this as a multiset; rules that
/// care about direction may rely on the order above.
pub type Neighborhood<S> = [S; 8];

/// A local transition rule.
///
/// `apply` must be a pure function of its arguments: it is evaluated for
/// many cells concurrently against the same frozen generation, with no
/// knowledge of position or generation count.
pub trait Rule<S: CellState>: Send + Sync {
    fn apply(&self, current: S, neighbors: &Neighborhood<S>) -> S;

    fn name(&self) -> &str {
        "Unknown Rule"
    }

    /// Rule notation if one exists, e.g. `B3/S23`.
    fn notation(&self) -> Option<String> {
        None
    }
}

impl<S: CellState, R: Rule<S> + ?Sized> Rule<S> for Box<R> {
    #[inline]
    fn apply(&self, current: S, neighbors: &Neighborhood<S>) -> S {
        (**self).apply(current, neighbors)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn notation(&self) -> Option<String> {
        (**self).notation()
    }
}

impl<S: CellState, R: Rule<S> + ?Sized> Rule<S> for Arc<R> {
    #[inline]
    fn apply(&self, current: S, neighbors: &Neighborhood<S>) -> S {
        (**self).apply(current, neighbors)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn notation(&self) -> Option<String> {
        (**self).notation()
    }
}

impl<S: CellState, R: Rule<S> + ?Sized> Rule<S> for &R {
    #[inline]
    fn apply(&self, current: S, neighbors: &Neighborhood<S>) -> S {
        (**self).apply(current, neighbors)
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn notation(&self) -> Option<String> {
        (**self).notation()
    }
}

/// Adapts a closure into a [`Rule`].
#[derive(Clone, Copy)]
pub struct FnRule<F>(pub F);

impl<S, F> Rule<S> for FnRule<F>
where
    S: CellState,
    F: Fn(S, &Neighborhood<S>) -> S + Send + Sync,
{
    #[inline]
    fn apply(&self, current: S, neighbors: &Neighborhood<S>) -> S {
        (self.0)(current, neighbors)
    }

    fn name(&self) -> &str {
        "Closure Rule"
    }
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnRule")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Majority;

    impl Rule<bool> for Majority {
        fn apply(&self, current: bool, neighbors: &Neighborhood<bool>) -> bool {
            let live = neighbors.iter().filter(|&&n| n).count();
            match live {
                0..=3 => false,
                4 => current,
                _ => true,
            }
        }
    }

    #[test]
    fn default_metadata() {
        assert_eq!(Rule::<bool>::name(&Majority), "Unknown Rule");
        assert_eq!(Rule::<bool>::notation(&Majority), None);
    }

    #[test]
    fn boxed_and_shared_rules_delegate() {
        let boxed: Box<dyn Rule<bool>> = Box::new(Majority);
        let shared = Arc::new(Majority);
        let five = [true, true, true, true, true, false, false, false];
        assert!(boxed.apply(false, &five));
        assert!(shared.apply(false, &five));
        assert!((&Majority).apply(false, &five));
        assert!(!boxed.apply(true, &[false; 8]));
    }

    #[test]
    fn closure_rule_sees_fixed_neighbor_order() {
        // Copies the west neighbor (index 3).
        let rule = FnRule(|_: u8, n: &Neighborhood<u8>| n[3]);
        assert_eq!(rule.apply(0, &[1, 2, 3, 4, 5, 6, 7, 8]), 4);
        assert_eq!(Rule::<u8>::name(&rule), "Closure Rule");
    }
}
