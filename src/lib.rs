//! Exact expected costs of strategies for simulating one die with another.
//!
//! A [`problem::Problem`] is a die with `start_size` faces that has to produce a uniform result
//! out of `target_size`. Strategies are built as [`strategy::StrategyGraph`]s, by hand or by a
//! [`policies::SolvingPolicy`], and costed exactly in expected throws, cycles included.

pub mod divisors;
pub mod error;
pub mod fraction;
pub mod linear;
pub mod policies;
pub mod problem;
pub mod search;
pub mod simulation;
pub mod strategy;
pub mod utils;
