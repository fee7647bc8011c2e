//! # Strategy graph
//!
//! An arena of problem states linked by the actions chosen for them. Applying an action whose
//! result already appears on the node's own line of first parents links back to that ancestor
//! instead of creating a node, so a strategy that can return to an earlier state is a cycle.

mod cost;

use crate::error::{CubiqueError, Result};
use crate::fraction::Fraction;
use crate::linear::{LinearExpression, Variable};
use crate::policies::{Balanced, Naive, SolveConfig, SolvingPolicy};
use crate::problem::{Problem, ValidAction};
use crate::utils::{NodeId, Size};
use log::{debug, info};
use std::fmt::{Display, Formatter};

// ---------- Links and actions ---------- //
/// Where an action leads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Child {
    /// A node created by this action; the acting node is its first parent
    NewNode(NodeId),
    /// An ancestor with the same problem (this closes a cycle)
    BackEdge(NodeId),
}

impl Child {
    #[inline] pub fn node(self) -> NodeId {
        match self { Child::NewNode(id) | Child::BackEdge(id) => id }
    }
    #[inline] pub fn new_node(self) -> Option<NodeId> {
        match self { Child::NewNode(id) => Some(id), Child::BackEdge(_) => None }
    }
}

/// The decision taken at a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Rethrow { child: Child },
    Reduce { factor: Size, child: Child },
    /// The ok branch always gets a fresh node: its target is smaller than every ancestor's
    TryReduce { factor: Size, err_rate: Fraction, ok: NodeId, err: Child },
}

impl Action {
    /// The only link a cycle can go through (the ok branch never loops)
    pub fn cyclic_child(&self) -> Child {
        match self {
            Action::Rethrow { child } | Action::Reduce { child, .. } => *child,
            Action::TryReduce { err, .. } => *err,
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Rethrow { .. } => write!(f, "rethrow"),
            Action::Reduce { factor, .. } => write!(f, "reduce by {}", factor),
            Action::TryReduce { factor, err_rate, .. } => {
                write!(f, "try to reduce by {} (error rate = {})", factor, err_rate)
            }
        }
    }
}

/// What a policy (or a person) wants done with an open node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Rethrow,
    Reduce(Size),
    TryReduce(Size),
}

impl From<ValidAction> for Decision {
    fn from(action: ValidAction) -> Self {
        match action {
            ValidAction::Rethrow => Decision::Rethrow,
            ValidAction::Reduce { factor } => Decision::Reduce(factor),
            ValidAction::TryReduce { factor, .. } => Decision::TryReduce(factor),
        }
    }
}

// ---------- Nodes ---------- //
/// Expected remaining throws of a node, as known during a cost pass
#[derive(Debug, Clone, Default)]
pub enum Cost {
    #[default]
    Unset,
    /// Referenced through a back-edge before being computed: stands for the node's own cost
    Pending(Variable),
    Resolved(LinearExpression),
}

#[derive(Debug, Clone)]
pub struct StrategyNode {
    problem: Problem,
    first_parent: Option<NodeId>,
    action: Option<Action>,
    cost: Cost,
}

impl StrategyNode {
    fn new(problem: Problem, first_parent: Option<NodeId>) -> Self {
        StrategyNode { problem, first_parent, action: None, cost: Cost::Unset }
    }
    #[inline] pub fn problem(&self) -> &Problem { &self.problem }
    #[inline] pub fn first_parent(&self) -> Option<NodeId> { self.first_parent }
    #[inline] pub fn action(&self) -> Option<&Action> { self.action.as_ref() }
    /// Undecided and not solved yet
    #[inline] pub fn is_open(&self) -> bool { self.action.is_none() && !self.problem.is_solved() }
    /// Set by the last cost pass
    pub fn cost(&self) -> Option<&LinearExpression> {
        match &self.cost { Cost::Resolved(cost) => Some(cost), _ => None }
    }
}

impl Display for StrategyNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.problem)?;
        match &self.action {
            Some(action) => write!(f, "{}", action)?,
            None if self.problem.is_solved() => write!(f, "solved")?,
            None => write!(f, "open")?,
        }
        if let Some(cost) = self.cost() {
            write!(f, ", cost = {}", cost)?;
        }
        Ok(())
    }
}

// ---------- Graph ---------- //
/// The arena only grows. Replacing an action leaves the old branch in place but unreachable,
/// and its nodes refuse further actions.
#[derive(Debug, Clone)]
pub struct StrategyGraph {
    nodes: Vec<StrategyNode>,
    root: NodeId,
}

impl StrategyGraph {
    pub fn new(problem: Problem) -> Self {
        StrategyGraph { nodes: vec![StrategyNode::new(problem, None)], root: 0 }
    }

    #[inline] pub fn root_id(&self) -> NodeId { self.root }
    #[inline] pub fn root(&self) -> &StrategyNode { &self.nodes[self.root] }
    pub fn node(&self, id: NodeId) -> Result<&StrategyNode> {
        self.nodes.get(id).ok_or(CubiqueError::UnknownNode(id))
    }

    /// Root cost, once it is a plain number
    pub fn expected_cost(&self) -> Option<Fraction> {
        self.root().cost().and_then(|cost| cost.as_constant())
    }

    // ---------- Mutation ---------- //
    /// Replace the node's action by a rethrow
    pub fn rethrow(&mut self, id: NodeId) -> Result<Action> {
        let problem = self.attached(id)?.problem.rethrow()?;
        let child = self.link(id, problem);
        Ok(self.set_action(id, Action::Rethrow { child }))
    }

    /// Replace the node's action by removing a factor common to both sides
    pub fn reduce(&mut self, id: NodeId, factor: Size) -> Result<Action> {
        let problem = self.attached(id)?.problem.reduce(factor)?;
        let child = self.link(id, problem);
        Ok(self.set_action(id, Action::Reduce { factor, child }))
    }

    /// Replace the node's action by an imperfect reduction
    pub fn try_reduce(&mut self, id: NodeId, factor: Size) -> Result<Action> {
        let outcome = self.attached(id)?.problem.try_reduce(factor)?;
        let err = self.link(id, outcome.err);
        let ok = self.push(outcome.ok, id);
        Ok(self.set_action(id, Action::TryReduce { factor, err_rate: outcome.err_rate, ok, err }))
    }

    pub fn apply(&mut self, id: NodeId, decision: Decision) -> Result<Action> {
        match decision {
            Decision::Rethrow => self.rethrow(id),
            Decision::Reduce(factor) => self.reduce(id, factor),
            Decision::TryReduce(factor) => self.try_reduce(id, factor),
        }
    }

    /// The node, if the root still reaches it: every first parent up the line must still
    /// have its child as a new node
    fn attached(&self, id: NodeId) -> Result<&StrategyNode> {
        let node = self.node(id)?;
        let mut cursor = id;
        while let Some(parent) = self.nodes[cursor].first_parent {
            let linked = match self.nodes[parent].action {
                None => false,
                Some(Action::Rethrow { child }) | Some(Action::Reduce { child, .. }) => child == Child::NewNode(cursor),
                Some(Action::TryReduce { ok, err, .. }) => ok == cursor || err == Child::NewNode(cursor),
            };
            if !linked {
                return Err(CubiqueError::DetachedNode(id));
            }
            cursor = parent;
        }
        Ok(node)
    }

    /// Look for `problem` on the line of first parents starting at `from`, else grow a child of `from`
    fn link(&mut self, from: NodeId, problem: Problem) -> Child {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            if node.problem == problem {
                debug!("{} loops back to node {}", problem, id);
                return Child::BackEdge(id);
            }
            cursor = node.first_parent;
        }
        Child::NewNode(self.push(problem, from))
    }

    fn push(&mut self, problem: Problem, parent: NodeId) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(StrategyNode::new(problem, Some(parent)));
        id
    }

    fn set_action(&mut self, id: NodeId, action: Action) -> Action {
        debug!("Node {} ({}) will {}", id, self.nodes[id].problem, action);
        self.nodes[id].action = Some(action);
        action
    }

    // ---------- Traversal ---------- //
    /// Depth first over every reachable node, once each. Back-edges are not followed and the
    /// err branch of an imperfect reduction comes before its ok branch.
    pub fn visit_nodes(&self, mut callback: impl FnMut(NodeId, &StrategyNode)) {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            callback(id, node);
            match node.action {
                None => {}
                Some(Action::Rethrow { child }) | Some(Action::Reduce { child, .. }) => {
                    stack.extend(child.new_node());
                }
                Some(Action::TryReduce { ok, err, .. }) => {
                    stack.push(ok);
                    stack.extend(err.new_node());
                }
            }
        }
    }

    /// Reachable nodes, in visiting order
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = vec![];
        self.visit_nodes(|id, _| ids.push(id));
        ids
    }

    pub fn node_count(&self) -> usize { self.node_ids().len() }

    /// The first open node in visiting order
    pub fn find_an_open_node(&self) -> Option<NodeId> {
        let mut found = None;
        self.visit_nodes(|id, node| {
            if found.is_none() && node.is_open() {
                found = Some(id);
            }
        });
        found
    }

    // ---------- Solving ---------- //
    /// Let `policy` decide every open node until none is left. Returns how many actions it took.
    pub fn solve_with<P: SolvingPolicy + ?Sized>(&mut self, policy: &mut P, config: &SolveConfig) -> Result<usize> {
        let mut actions = 0;
        while let Some(id) = self.find_an_open_node() {
            if actions >= config.max_actions {
                return Err(CubiqueError::DidNotConverge { limit: config.max_actions });
            }
            let decision = policy.decide(&self.nodes[id].problem)?;
            self.apply(id, decision)?;
            actions += 1;
        }
        info!("Decided {} in {} actions ({} nodes)", self.root().problem, actions, self.node_count());
        Ok(actions)
    }

    /// Reduce by common factors first, then rethrow or try a full reduction
    pub fn solve(&mut self) -> Result<usize> {
        self.solve_with(&mut Balanced, &SolveConfig::default())
    }

    /// Rethrow until a full reduction can be tried
    pub fn solve_naive(&mut self) -> Result<usize> {
        self.solve_with(&mut Naive, &SolveConfig::default())
    }
}

impl Display for StrategyGraph {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut lines = vec![];
        self.visit_nodes(|_, node| lines.push(node.to_string()));
        write!(f, "{}", lines.join(",\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frac(n: i64, d: i64) -> Fraction { Fraction::new(n, d).unwrap() }

    #[test]
    fn starts_with_an_open_root() {
        let graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        assert_eq!(graph.node_count(), 1);
        assert!(graph.root().is_open());
        assert_eq!(graph.find_an_open_node(), Some(graph.root_id()));
        assert_eq!(graph.to_string(), "1 -> 21: open");
    }

    #[test]
    fn actions_grow_new_nodes() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        let root = graph.root_id();
        let Action::Rethrow { child: Child::NewNode(thrown) } = graph.rethrow(root).unwrap() else {
            panic!("rethrow should create a node");
        };
        assert_eq!(graph.node(thrown).unwrap().problem(), &Problem::with_current(12, 12, 21).unwrap());
        assert_eq!(graph.node(thrown).unwrap().first_parent(), Some(root));

        let Action::Reduce { factor: 3, child: Child::NewNode(reduced) } = graph.reduce(thrown, 3).unwrap() else {
            panic!("reduce should create a node");
        };
        assert_eq!(graph.node(reduced).unwrap().problem(), &Problem::with_current(12, 4, 7).unwrap());
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.find_an_open_node(), Some(reduced));
    }

    #[test]
    fn invalid_factors_leave_the_graph_alone() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        let root = graph.root_id();
        assert!(matches!(graph.reduce(root, 3), Err(CubiqueError::InvalidFactor { .. })));
        assert!(matches!(graph.try_reduce(root, 7), Err(CubiqueError::InvalidFactor { .. })));
        assert!(graph.root().action().is_none());
        assert_eq!(graph.node(42).err(), Some(CubiqueError::UnknownNode(42)));
        assert_eq!(graph.rethrow(42), Err(CubiqueError::UnknownNode(42)));
    }

    #[test]
    fn returning_to_an_ancestor_links_back() {
        // 1 -> 3, 2 -> 3, 4 -> 3, then 4 % 3 = 1 brings us back to the root
        let mut graph = StrategyGraph::new(Problem::new(2, 3).unwrap());
        let root = graph.root_id();
        let two = graph.rethrow(root).unwrap().cyclic_child().node();
        let four = graph.rethrow(two).unwrap().cyclic_child().node();
        let before = graph.node_count();

        let action = graph.try_reduce(four, 3).unwrap();
        let Action::TryReduce { err_rate, ok, err, .. } = action else { panic!("expected a try reduce") };
        assert_eq!(err, Child::BackEdge(root));
        assert_eq!(err_rate, frac(1, 4));
        assert!(graph.node(ok).unwrap().problem().is_solved());
        // only the ok node is new
        assert_eq!(graph.node_count(), before + 1);
        assert_eq!(graph.find_an_open_node(), None);
    }

    #[test]
    fn separate_branches_are_not_merged() {
        // 5 -> 3 splits into 1 -> 1 and 2 -> 3
        let mut graph = StrategyGraph::new(Problem::with_current(2, 5, 3).unwrap());
        let root = graph.root_id();
        let Action::TryReduce { err: Child::NewNode(two), .. } = graph.try_reduce(root, 3).unwrap() else {
            panic!("the err branch should be new");
        };
        let Action::Rethrow { child: Child::NewNode(four) } = graph.rethrow(two).unwrap() else {
            panic!("rethrow should create a node");
        };
        // 4 % 3 = 1 is nowhere on this line, so it is a new node even though 1 -> 3 is not
        let Action::TryReduce { err: Child::NewNode(_), .. } = graph.try_reduce(four, 3).unwrap() else {
            panic!("1 -> 3 is not an ancestor here");
        };
    }

    #[test]
    fn replacing_an_action_drops_the_old_branch() {
        let mut graph = StrategyGraph::new(Problem::with_current(12, 12, 21).unwrap());
        let root = graph.root_id();
        graph.rethrow(root).unwrap();
        assert_eq!(graph.node_count(), 2);
        graph.try_reduce(root, 7).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert!(matches!(graph.root().action(), Some(Action::TryReduce { factor: 7, .. })));
    }

    #[test]
    fn dropped_branches_refuse_actions() {
        let mut graph = StrategyGraph::new(Problem::with_current(12, 12, 21).unwrap());
        let root = graph.root_id();
        let old = graph.rethrow(root).unwrap().cyclic_child().node();
        let deeper = graph.reduce(old, 3).unwrap().cyclic_child().node();
        let Action::TryReduce { ok, err, .. } = graph.try_reduce(root, 7).unwrap() else { panic!() };

        assert_eq!(graph.rethrow(old), Err(CubiqueError::DetachedNode(old)));
        assert_eq!(graph.apply(deeper, Decision::Rethrow), Err(CubiqueError::DetachedNode(deeper)));
        assert!(graph.node(old).is_ok());
        assert!(!graph.node_ids().contains(&old));

        // both branches of the new action are live
        assert!(graph.rethrow(err.node()).is_ok());
        assert!(graph.rethrow(ok).is_ok());
    }

    #[test]
    fn visits_err_before_ok() {
        let mut graph = StrategyGraph::new(Problem::with_current(12, 48, 7).unwrap());
        let root = graph.root_id();
        let Action::TryReduce { ok, err, .. } = graph.try_reduce(root, 7).unwrap() else { panic!() };
        assert_eq!(graph.node_ids(), vec![root, err.node(), ok]);
        assert_eq!(
            graph.to_string(),
            "48 -> 7: try to reduce by 7 (error rate = 1/8),\n6 -> 7: open,\n1 -> 1: solved"
        );
    }

    #[test]
    fn balanced_solve_leaves_nothing_open() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        let actions = graph.solve().unwrap();
        assert!(actions > 0);
        assert_eq!(graph.find_an_open_node(), None);
        graph.visit_nodes(|_, node| assert!(!node.is_open()));
    }

    #[test]
    fn naive_solve_leaves_nothing_open() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        graph.solve_naive().unwrap();
        assert_eq!(graph.find_an_open_node(), None);
    }

    #[test]
    fn solving_gives_up_past_the_budget() {
        let mut graph = StrategyGraph::new(Problem::new(12, 21).unwrap());
        let config = SolveConfig { max_actions: 2 };
        assert_eq!(
            graph.solve_with(&mut Balanced, &config),
            Err(CubiqueError::DidNotConverge { limit: 2 })
        );
    }
}
