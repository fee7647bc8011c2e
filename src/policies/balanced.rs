use super::SolvingPolicy;
use crate::divisors::greatest_common_divisor;
use crate::error::Result;
use crate::problem::Problem;
use crate::strategy::Decision;

/// Take every free reduction first, then behave like [`super::Naive`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Balanced;

impl SolvingPolicy for Balanced {
    fn decide(&mut self, problem: &Problem) -> Result<Decision> {
        let (current, target) = (problem.current_size(), problem.target_size());
        let gcd = greatest_common_divisor(current, target)?;
        Ok(if gcd != 1 {
            Decision::Reduce(gcd)
        } else if current < target {
            Decision::Rethrow
        } else if current % target == 0 {
            Decision::Reduce(target)
        } else {
            Decision::TryReduce(target)
        })
    }
}
