use crate::utils::{NodeId, Size};
use thiserror::Error;

/// Everything that can go wrong while building or costing a strategy.
/// All of these are caller precondition violations; none are worth retrying.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CubiqueError {
    #[error("{0} is not a natural number")]
    NotNatural(Size),
    #[error("cannot use factor {factor} on {problem}: {reason}")]
    InvalidFactor { factor: Size, problem: String, reason: &'static str },
    #[error("cannot solve for {variable}: its own coefficient is exactly 1")]
    DegenerateSolve { variable: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("result does not fit in 64 bits")]
    Overflow,
    #[error("gave up after {limit} steps")]
    DidNotConverge { limit: usize },
    #[error("no node with id {0}")]
    UnknownNode(NodeId),
    #[error("node {0} was cut off from the root when an action was replaced")]
    DetachedNode(NodeId),
    #[error("node {0} has no action yet")]
    OpenNode(NodeId),
}

pub type Result<T> = std::result::Result<T, CubiqueError>;
