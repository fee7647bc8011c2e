use super::SolvingPolicy;
use crate::error::Result;
use crate::problem::Problem;
use crate::strategy::Decision;

/// Rethrow until the whole target fits, then map onto it
#[derive(Debug, Clone, Copy, Default)]
pub struct Naive;

impl SolvingPolicy for Naive {
    fn decide(&mut self, problem: &Problem) -> Result<Decision> {
        let (current, target) = (problem.current_size(), problem.target_size());
        Ok(if current < target {
            Decision::Rethrow
        } else if current % target == 0 {
            Decision::Reduce(target)
        } else {
            Decision::TryReduce(target)
        })
    }
}
