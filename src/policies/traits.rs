use crate::error::Result;
use crate::problem::Problem;
use crate::strategy::Decision;
use crate::utils::MAX_ACTIONS;

/// Picks the action for an open node, looking only at its problem
pub trait SolvingPolicy {
    fn decide(&mut self, problem: &Problem) -> Result<Decision>;
}

/// Limits for letting a policy decide a whole graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveConfig {
    /// Actions applied before giving up on a strategy that keeps growing
    pub max_actions: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        SolveConfig { max_actions: MAX_ACTIONS }
    }
}
