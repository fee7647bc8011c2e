use super::SolvingPolicy;
use crate::error::Result;
use crate::problem::{Problem, ValidAction};
use crate::strategy::Decision;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Uniform over the valid actions. Reproducible for a given seed.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn seeded(seed: u64) -> Self {
        RandomPolicy { rng: StdRng::seed_from_u64(seed) }
    }
}

impl SolvingPolicy for RandomPolicy {
    fn decide(&mut self, problem: &Problem) -> Result<Decision> {
        let actions = problem.list_valid_actions()?;
        // rethrowing is legal anywhere, solved or not
        let action = actions.choose(&mut self.rng).copied().unwrap_or(ValidAction::Rethrow);
        Ok(action.into())
    }
}
