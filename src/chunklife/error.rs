use thiserror::Error;

/// Failures constructing an [`Automaton`](super::Automaton).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build read-phase thread pool with {threads} threads")]
    ThreadPool {
        threads: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },
}

/// Failures parsing a life-like rulestring such as `B3/S23`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleParseError {
    #[error("rulestring is empty")]
    Empty,
    #[error("rulestring `{0}` must contain exactly one '/'")]
    Separator(String),
    #[error("rulestring `{0}` mixes B/S prefixes with the bare survival/birth form")]
    MixedForm(String),
    #[error("invalid neighbor count `{0}`, expected a digit 0-8")]
    InvalidCount(char),
}
