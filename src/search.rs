//! # Best strategy search
//!
//! Breadth first over partial strategies, starting from the balanced strategy as the one to
//! beat. A partial strategy's cost with every unknown set to zero is a lower bound for all of
//! its completions, so anything that cannot beat the incumbent is dropped.

use crate::error::{CubiqueError, Result};
use crate::fraction::Fraction;
use crate::policies::{Balanced, SolveConfig};
use crate::problem::Problem;
use crate::strategy::StrategyGraph;
use crate::utils::MAX_PLANS;
use log::{debug, info, warn};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Candidate strategies scored before settling for the best one so far
    pub max_plans: usize,
    /// Limits for building the balanced strategy we start from
    pub solve: SolveConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { max_plans: MAX_PLANS, solve: SolveConfig::default() }
    }
}

/// Cheapest strategy found for `problem`, with its costs up to date. Fails with `Overflow`
/// when even the balanced strategy cannot be costed in 64 bits.
pub fn best_strategy(problem: Problem, config: &SearchConfig) -> Result<StrategyGraph> {
    let mut best = StrategyGraph::new(problem);
    best.solve_with(&mut Balanced, &config.solve)?;
    best.update_costs()?;
    let mut best_cost = best.expected_cost().ok_or(CubiqueError::OpenNode(best.root_id()))?;
    info!("Searching below {} for {}", best_cost, problem);

    let mut seen = HashSet::new();
    let mut pending = VecDeque::from([StrategyGraph::new(problem)]);
    let mut scored = 0;

    'search: while let Some(candidate) = pending.pop_front() {
        // every open node has to be decided eventually, so branching on the first one is enough
        let Some(id) = candidate.find_an_open_node() else { continue };
        for action in candidate.node(id)?.problem().list_valid_actions()? {
            if scored >= config.max_plans {
                warn!("Stopped after {} plans, {} still pending", scored, pending.len() + 1);
                break 'search;
            }
            scored += 1;

            let mut next = candidate.clone();
            match next.apply(id, action.into()) {
                Ok(_) => {}
                Err(CubiqueError::Overflow) => continue,
                Err(e) => return Err(e),
            }
            let Some(bound) = score(&mut next)? else {
                debug!("Skipped a plan for {} that cannot be costed", problem);
                continue;
            };
            if bound >= best_cost || !seen.insert(next.to_string()) {
                continue;
            }
            if next.find_an_open_node().is_none() {
                debug!("Better strategy: {} < {}", bound, best_cost);
                best_cost = bound;
                best = next;
            } else {
                pending.push_back(next);
            }
        }
    }

    info!("Best cost for {} is {} ({} plans scored)", problem, best_cost, scored);
    Ok(best)
}

/// Cost the candidate and bound it from below. `None` when it has no usable cost: sizes past
/// 64 bits, or a loop that never spends a throw.
fn score(candidate: &mut StrategyGraph) -> Result<Option<Fraction>> {
    match candidate.update_costs().and_then(|_| lower_bound(candidate)) {
        Ok(bound) => Ok(bound),
        Err(CubiqueError::Overflow) | Err(CubiqueError::DegenerateSolve { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Root cost with every open node assumed free
fn lower_bound(graph: &StrategyGraph) -> Result<Option<Fraction>> {
    graph.root().cost().map(|cost| cost.evaluate_with(|_| Fraction::zero())).transpose()
}
