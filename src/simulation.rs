//! Playing a strategy out with real dice, as a check on the exact costs.

use crate::error::{CubiqueError, Result};
use crate::fraction::Fraction;
use crate::strategy::{Action, StrategyGraph};
use crate::utils::{Throws, MAX_PLAYOUT_STEPS};
use log::debug;
use rand::Rng;

/// Follow the strategy from the root until it reaches a solved leaf, counting throws.
/// Fails on an undecided node, or after `max_steps` moves without getting there.
pub fn play_out<R: Rng + ?Sized>(graph: &StrategyGraph, rng: &mut R, max_steps: usize) -> Result<Throws> {
    let mut id = graph.root_id();
    let mut throws = 0;
    for _ in 0..max_steps {
        let node = graph.node(id)?;
        id = match node.action() {
            None if node.problem().is_solved() => return Ok(throws),
            None => return Err(CubiqueError::OpenNode(id)),
            Some(Action::Rethrow { child }) => {
                throws += 1;
                child.node()
            }
            Some(Action::Reduce { child, .. }) => child.node(),
            Some(Action::TryReduce { err_rate, ok, err, .. }) => {
                if happens(rng, *err_rate) { err.node() } else { *ok }
            }
        };
    }
    Err(CubiqueError::DidNotConverge { limit: max_steps })
}

/// Average throw count over `runs` playouts
pub fn estimate_cost<R: Rng + ?Sized>(graph: &StrategyGraph, runs: usize, rng: &mut R) -> Result<f64> {
    if runs == 0 {
        return Ok(0.0);
    }
    let mut total = 0;
    for _ in 0..runs {
        total += play_out(graph, rng, MAX_PLAYOUT_STEPS)?;
    }
    let estimate = total as f64 / runs as f64;
    debug!("{} playouts of {} averaged {} throws", runs, graph.root().problem(), estimate);
    Ok(estimate)
}

/// Exact draw: one of `denominator` equally likely outcomes, `numerator` of which count
fn happens<R: Rng + ?Sized>(rng: &mut R, probability: Fraction) -> bool {
    rng.random_range(0..probability.denominator()) < probability.numerator()
}
