//! Expected throw counts for every node of a strategy graph.
//!
//! Costs are computed depth first from the root. An undecided node gets a fresh unknown. A
//! back-edge refers to an ancestor that is still being computed, so it is read as a
//! placeholder standing for that ancestor's cost. When the ancestor's own expression is
//! complete the placeholder is solved for, and the solution is pushed down the chain of
//! nodes that mentioned it.

use super::{Action, Child, Cost, StrategyGraph};
use crate::error::Result;
use crate::fraction::Fraction;
use crate::linear::{LinearExpression, Variable, VariableFactory};
use crate::utils::{NodeId, PLACEHOLDER_PREFIX};
use log::{debug, info, trace};

/// Variables handed out during one cost pass
struct CostPass {
    unknowns: VariableFactory,
    placeholders: VariableFactory,
}

impl StrategyGraph {
    /// Recompute the cost of every reachable node. Undecided nodes show up as unknowns in
    /// the costs of the nodes above them.
    ///
    /// A failed pass (`Overflow`, `DegenerateSolve`) leaves every node without a cost.
    pub fn update_costs(&mut self) -> Result<()> {
        self.clear_costs();
        let mut pass = CostPass {
            unknowns: VariableFactory::new(),
            placeholders: VariableFactory::with_prefix(PLACEHOLDER_PREFIX),
        };

        let cost = match self.compute_cost(self.root, &mut pass) {
            Ok(cost) => cost,
            Err(e) => {
                debug!("Could not cost {}: {}", self.root().problem(), e);
                self.clear_costs();
                return Err(e);
            }
        };
        info!(
            "Expected cost of {} is {} ({} open nodes, {} cycles)",
            self.root().problem(), cost, pass.unknowns.count(), pass.placeholders.count()
        );
        Ok(())
    }

    fn clear_costs(&mut self) {
        for node in self.nodes.iter_mut() {
            node.cost = Cost::Unset;
        }
    }

    fn compute_cost(&mut self, id: NodeId, pass: &mut CostPass) -> Result<LinearExpression> {
        if let Cost::Resolved(cost) = &self.nodes[id].cost {
            return Ok(cost.clone());
        }

        let (problem, action) = (self.nodes[id].problem, self.nodes[id].action);
        let cost = match action {
            None if problem.is_solved() => LinearExpression::zero(),
            None => LinearExpression::variable(pass.unknowns.next_variable()),
            Some(Action::Rethrow { child }) => self.child_cost(child, pass)?.checked_add(&LinearExpression::one())?,
            Some(Action::Reduce { child, .. }) => self.child_cost(child, pass)?,
            Some(Action::TryReduce { err_rate, ok, err, .. }) => {
                let err_cost = self.child_cost(err, pass)?;
                let ok_cost = self.compute_cost(ok, pass)?;
                let ok_rate = Fraction::one().checked_sub(err_rate)?;
                err_cost.checked_mul(err_rate)?.checked_add(&ok_cost.checked_mul(ok_rate)?)?
            }
        };
        trace!("{} costs {}", problem, cost);
        self.save_cost(id, cost, pass)
    }

    fn child_cost(&mut self, child: Child, pass: &mut CostPass) -> Result<LinearExpression> {
        let target = match child {
            Child::NewNode(id) => return self.compute_cost(id, pass),
            Child::BackEdge(id) => id,
        };
        let placeholder = match &self.nodes[target].cost {
            Cost::Resolved(cost) => return Ok(cost.clone()),
            Cost::Pending(placeholder) => placeholder.clone(),
            Cost::Unset => {
                let placeholder = pass.placeholders.next_variable();
                self.nodes[target].cost = Cost::Pending(placeholder.clone());
                placeholder
            }
        };
        Ok(LinearExpression::variable(placeholder))
    }

    /// Store the node's cost. If a placeholder was standing in for it, the expression is an
    /// equation in that placeholder: solve it and clean the placeholder out of the cycle.
    fn save_cost(&mut self, id: NodeId, cost: LinearExpression, pass: &CostPass) -> Result<LinearExpression> {
        let cost = match std::mem::take(&mut self.nodes[id].cost) {
            Cost::Pending(placeholder) => {
                debug_assert!(pass.placeholders.has(&placeholder));
                let solved = cost.solve_equals_to(&placeholder)?;
                debug!("Closed the cycle through {}: {} = {}", self.nodes[id].problem, placeholder, solved);
                self.substitute_along_cycle(id, &placeholder, &solved)?;
                solved
            }
            _ => cost,
        };
        self.nodes[id].cost = Cost::Resolved(cost.clone());
        Ok(cost)
    }

    /// Every node that can mention `placeholder` sits on the chain of new nodes starting at
    /// the cycle's entry, ending where the back-edge leaves.
    fn substitute_along_cycle(&mut self, from: NodeId, placeholder: &Variable, solved: &LinearExpression) -> Result<()> {
        let mut cursor = from;
        while let Some(next) = self.nodes[cursor].action.and_then(|action| action.cyclic_child().new_node()) {
            if let Cost::Resolved(cost) = &self.nodes[next].cost {
                let cost = cost.substitute(placeholder, solved)?;
                self.nodes[next].cost = Cost::Resolved(cost);
            }
            cursor = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CubiqueError;
    use crate::problem::Problem;

    fn frac(n: i64, d: i64) -> Fraction { Fraction::new(n, d).unwrap() }

    /// Every reachable node has a plain number for a cost
    fn constant_costs(graph: &StrategyGraph) -> Vec<(String, Fraction)> {
        graph.node_ids().into_iter()
            .map(|id| {
                let node = graph.node(id).unwrap();
                let cost = node.cost().and_then(|cost| cost.as_constant());
                (node.problem().to_string(), cost.unwrap_or_else(|| panic!("{} has no constant cost", node)))
            })
            .collect()
    }

    #[test]
    fn a_lone_solved_node_costs_nothing() {
        let mut graph = StrategyGraph::new(Problem::new(6, 1).unwrap());
        graph.update_costs().unwrap();
        assert_eq!(graph.expected_cost(), Some(Fraction::zero()));
    }

    #[test]
    fn open_nodes_are_unknowns() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        graph.update_costs().unwrap();
        assert_eq!(graph.root().cost().unwrap().to_string(), "a");
        assert_eq!(graph.expected_cost(), None);

        let root = graph.root_id();
        graph.rethrow(root).unwrap();
        graph.update_costs().unwrap();
        assert_eq!(graph.root().cost().unwrap().to_string(), "1 + a");
        assert_eq!(graph.to_string(), "1 -> 21: rethrow, cost = 1 + a,\n12 -> 21: open, cost = a");
    }

    #[test]
    fn open_nodes_get_one_unknown_each() {
        let mut graph = StrategyGraph::new(Problem::with_current(12, 144, 21).unwrap());
        let root = graph.root_id();
        graph.try_reduce(root, 7).unwrap();
        graph.update_costs().unwrap();
        // err branch 4 -> 21 is visited first, ok branch 1 -> 3 second
        assert_eq!(graph.root().cost().unwrap().to_string(), "1/36 a + 35/36 b");
    }

    #[test]
    fn closes_a_simple_cycle() {
        // 1 -> 3, 2 -> 3, 4 -> 3, then 1 in 4 chance to fall back to the start
        let mut graph = StrategyGraph::new(Problem::new(2, 3).unwrap());
        graph.solve().unwrap();
        graph.update_costs().unwrap();
        assert_eq!(graph.expected_cost(), Some(frac(8, 3)));
        assert_eq!(
            constant_costs(&graph),
            vec![
                ("1 -> 3".to_string(), frac(8, 3)),
                ("2 -> 3".to_string(), frac(5, 3)),
                ("4 -> 3".to_string(), frac(2, 3)),
                ("1 -> 1".to_string(), Fraction::zero()),
            ]
        );
    }

    #[test]
    fn costs_the_balanced_strategy() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        graph.solve().unwrap();
        graph.update_costs().unwrap();
        assert_eq!(graph.node_count(), 20);
        assert_eq!(graph.expected_cost(), Some(frac(40490, 19019)));

        let costs = constant_costs(&graph);
        let expected = [
            ("1 -> 21", frac(40490, 19019)),
            ("12 -> 21", frac(21471, 19019)),
            ("4 -> 7", frac(21471, 19019)),
            ("48 -> 7", frac(2452, 19019)),
            ("6 -> 7", frac(19616, 19019)),
            ("72 -> 7", frac(597, 19019)),
            ("2 -> 7", frac(21492, 19019)),
            ("24 -> 7", frac(2473, 19019)),
            ("3 -> 7", frac(19784, 19019)),
            ("36 -> 7", frac(765, 19019)),
            ("1 -> 7", frac(27540, 19019)),
            ("12 -> 7", frac(8521, 19019)),
            ("5 -> 7", frac(102252, 95095)),
            ("60 -> 7", frac(7157, 95095)),
        ];
        for (i, (problem, cost)) in expected.iter().enumerate() {
            assert_eq!(costs[i], (problem.to_string(), *cost));
        }
        for (problem, cost) in &costs[expected.len()..] {
            assert_eq!(problem, "1 -> 1");
            assert_eq!(*cost, Fraction::zero());
        }
        assert!(graph.to_string().starts_with("1 -> 21: rethrow, cost = 40490/19019,\n12 -> 21: reduce by 3"));
    }

    #[test]
    fn costs_the_naive_strategy() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        graph.solve_naive().unwrap();
        graph.update_costs().unwrap();
        assert_eq!(graph.node_count(), 19);
        // same chain of remainders as the balanced strategy, only three times larger
        assert_eq!(graph.expected_cost(), Some(frac(40490, 19019)));

        // 180 -> 21 falls back to 12 -> 21, which closes the cycle for every node in between
        let looping = graph.node_ids().into_iter()
            .find(|&id| graph.node(id).unwrap().problem().to_string() == "180 -> 21")
            .unwrap();
        let Some(Action::TryReduce { err: Child::BackEdge(entry), .. }) = graph.node(looping).unwrap().action() else {
            panic!("180 -> 21 should loop back");
        };
        assert_eq!(graph.node(*entry).unwrap().problem().to_string(), "12 -> 21");
        let costs = constant_costs(&graph);
        assert_eq!(costs[1], ("12 -> 21".to_string(), frac(21471, 19019)));
        assert_eq!(costs[2], ("144 -> 21".to_string(), frac(2452, 19019)));
        assert_eq!(costs[12], ("180 -> 21".to_string(), frac(7157, 95095)));
    }

    #[test]
    fn every_cost_satisfies_its_own_equation() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        graph.solve().unwrap();
        graph.update_costs().unwrap();
        let cost_of = |id: NodeId| graph.node(id).unwrap().cost().unwrap().as_constant().unwrap();
        for id in graph.node_ids() {
            let node = graph.node(id).unwrap();
            let expected = match node.action() {
                None => Fraction::zero(),
                Some(Action::Rethrow { child }) => cost_of(child.node()) + Fraction::one(),
                Some(Action::Reduce { child, .. }) => cost_of(child.node()),
                Some(Action::TryReduce { err_rate, ok, err, .. }) => {
                    *err_rate * cost_of(err.node()) + (Fraction::one() - *err_rate) * cost_of(*ok)
                }
            };
            assert_eq!(cost_of(id), expected, "{}", node);
        }
    }

    #[test]
    fn cycles_around_open_nodes() {
        // 1 -> 6, 2 -> 6, 4 -> 6, then either 1 -> 2 (left open) or back to the start
        let mut graph = StrategyGraph::new(Problem::new(2, 6).unwrap());
        let root = graph.root_id();
        let two = graph.rethrow(root).unwrap().cyclic_child().node();
        let four = graph.rethrow(two).unwrap().cyclic_child().node();
        let Action::TryReduce { ok, err, .. } = graph.try_reduce(four, 3).unwrap() else { panic!() };
        assert_eq!(err, Child::BackEdge(root));
        graph.update_costs().unwrap();

        let rendered = graph.node_ids().into_iter()
            .map(|id| graph.node(id).unwrap().cost().unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(rendered, vec!["8/3 + a", "5/3 + a", "2/3 + a", "a"]);
        assert_eq!(graph.find_an_open_node(), Some(ok));
        for id in graph.node_ids() {
            let cost = graph.node(id).unwrap().cost().unwrap();
            assert!(cost.variables().all(|v| !v.name().starts_with(PLACEHOLDER_PREFIX)), "{}", cost);
        }
    }

    #[test]
    fn recomputing_gives_the_same_costs() {
        let mut graph = StrategyGraph::new(Problem::new(2, 3).unwrap());
        graph.solve().unwrap();
        graph.update_costs().unwrap();
        let first = graph.to_string();
        graph.update_costs().unwrap();
        assert_eq!(graph.to_string(), first);
    }

    #[test]
    fn rethrowing_a_one_sided_die_is_degenerate() {
        let mut graph = StrategyGraph::new(Problem::new(1, 3).unwrap());
        let root = graph.root_id();
        assert_eq!(graph.rethrow(root).unwrap(), Action::Rethrow { child: Child::BackEdge(root) });
        assert!(matches!(graph.update_costs(), Err(CubiqueError::DegenerateSolve { .. })));
    }

    #[test]
    fn reducing_by_one_is_degenerate() {
        let mut graph = StrategyGraph::new(Problem::with_current(6, 6, 4).unwrap());
        let root = graph.root_id();
        assert_eq!(graph.reduce(root, 1).unwrap(), Action::Reduce { factor: 1, child: Child::BackEdge(root) });
        assert!(matches!(graph.update_costs(), Err(CubiqueError::DegenerateSolve { .. })));
    }

    #[test]
    fn large_targets_overflow_instead_of_panicking() {
        // the exact cost of 12 -> 97 needs far more than 64 bits
        let mut graph = StrategyGraph::new(Problem::new(12, 97).unwrap());
        graph.solve().unwrap();
        assert_eq!(graph.update_costs(), Err(CubiqueError::Overflow));
        assert_eq!(graph.expected_cost(), None);
        assert!(graph.node_ids().into_iter().all(|id| graph.node(id).unwrap().cost().is_none()));

        // the naive strategy runs into the same wall
        let mut graph = StrategyGraph::new(Problem::new(12, 97).unwrap());
        graph.solve_naive().unwrap();
        assert_eq!(graph.update_costs(), Err(CubiqueError::Overflow));
    }

    #[test]
    fn a_failed_pass_leaves_no_costs() {
        let mut graph = StrategyGraph::new(Problem::new(1, 3).unwrap());
        graph.update_costs().unwrap();
        assert_eq!(graph.root().cost().unwrap().to_string(), "a");
        let root = graph.root_id();
        graph.rethrow(root).unwrap();
        assert!(graph.update_costs().is_err());
        assert_eq!(graph.root().cost(), None);
    }
}
