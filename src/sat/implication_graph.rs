#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The implication graph: one node per variable recording why it holds its value.
//!
//! Nodes live in a single arena indexed by [`Variable`]. Edges are sets of
//! variable indices, never references, so the graph can be unwound and rebuilt
//! freely during backjumping. An edge `a -> b` means the value of `a`, together
//! with other antecedents of `b`, forced the value of `b`.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::cnf::{Cnf, DecisionLevel};
use crate::sat::error::InvariantViolation;
use crate::sat::literal::Variable;
use crate::sat::trail::DecisionTrail;
use rustc_hash::FxHashSet;

/// Graph node for one variable.
///
/// A node with no value is unassigned and has no edges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImplicationNode {
    variable: Variable,
    value: Option<bool>,
    level: Option<DecisionLevel>,
    implied_by: FxHashSet<Variable>,
    implies: FxHashSet<Variable>,
    /// Indices of every clause mentioning this variable, ascending.
    clauses: Vec<usize>,
}

impl ImplicationNode {
    fn new(variable: Variable) -> Self {
        Self {
            variable,
            ..Self::default()
        }
    }

    /// The variable this node stands for.
    #[must_use]
    pub const fn variable(&self) -> Variable {
        self.variable
    }

    /// The recorded value, `None` while unassigned.
    #[must_use]
    pub const fn value(&self) -> Option<bool> {
        self.value
    }

    /// The decision level the value was recorded at.
    #[must_use]
    pub const fn level(&self) -> Option<DecisionLevel> {
        self.level
    }

    /// Antecedents: variables whose values forced this one.
    #[must_use]
    pub const fn implied_by(&self) -> &FxHashSet<Variable> {
        &self.implied_by
    }

    /// Consequents: variables this one helped force.
    #[must_use]
    pub const fn implies(&self) -> &FxHashSet<Variable> {
        &self.implies
    }

    /// Indices of the clauses mentioning this variable, ascending.
    #[must_use]
    pub fn clauses(&self) -> &[usize] {
        &self.clauses
    }

    fn mentions(&self, clause_idx: usize) -> bool {
        self.clauses.binary_search(&clause_idx).is_ok()
    }

    fn reset(&mut self) {
        self.value = None;
        self.level = None;
        self.implied_by.clear();
        self.implies.clear();
    }
}

/// Arena of [`ImplicationNode`]s indexed by variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImplicationGraph {
    nodes: Vec<ImplicationNode>,
}

impl ImplicationGraph {
    /// Creates one unassigned node per variable and indexes every clause of
    /// `cnf` under the variables it mentions.
    #[must_use]
    pub fn new(cnf: &Cnf) -> Self {
        let mut graph = Self {
            nodes: (0..cnf.num_vars).map(ImplicationNode::new).collect(),
        };
        for (idx, clause) in cnf.iter().enumerate() {
            graph.register_clause(idx, clause);
        }
        graph
    }

    /// Adds clause `idx` to the clause list of each of its variables.
    ///
    /// Indices must be registered in ascending order.
    pub fn register_clause(&mut self, idx: usize, clause: &Clause) {
        for var in clause.variables() {
            let clauses = &mut self.nodes[var].clauses;
            if clauses.last() != Some(&idx) {
                clauses.push(idx);
            }
        }
    }

    /// Number of nodes, one per variable.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates over the nodes in variable order.
    pub fn iter(&self) -> impl Iterator<Item = &ImplicationNode> {
        self.nodes.iter()
    }

    /// The node of `var`.
    #[must_use]
    pub fn node(&self, var: Variable) -> &ImplicationNode {
        &self.nodes[var]
    }

    /// The recorded value of `var`.
    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.nodes.get(var).and_then(ImplicationNode::value)
    }

    /// The recorded level of `var`.
    #[must_use]
    pub fn level(&self, var: Variable) -> Option<DecisionLevel> {
        self.nodes.get(var).and_then(ImplicationNode::level)
    }

    /// Antecedents of `var`.
    #[must_use]
    pub fn implied_by(&self, var: Variable) -> &FxHashSet<Variable> {
        &self.nodes[var].implied_by
    }

    /// Consequents of `var`.
    #[must_use]
    pub fn implies(&self, var: Variable) -> &FxHashSet<Variable> {
        &self.nodes[var].implies
    }

    /// Records `var = value` at `level` and scans the clauses of `var` for
    /// clauses left with a single open literal.
    ///
    /// The variable is pushed onto the trail only the first time it is assigned
    /// since it was last unassigned. Every variable found to be forced is added
    /// to `implies(var)`; the return value tells whether there were any, in which
    /// case the caller should run [`Self::update_associations`].
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::UnrecordedAssignment`] if `assignment` does not
    /// already hold `value` for `var`.
    pub fn assign(
        &mut self,
        var: Variable,
        value: bool,
        level: DecisionLevel,
        assignment: &Assignment,
        trail: &mut DecisionTrail,
        clauses: &Cnf,
    ) -> Result<bool, InvariantViolation> {
        if assignment.value(var) != Some(value) {
            return Err(InvariantViolation::UnrecordedAssignment(var));
        }

        let node = &mut self.nodes[var];
        if node.value.is_none() {
            trail.push(var);
        }
        node.value = Some(value);
        node.level = Some(level);

        let mut exposed = false;
        for &idx in &node.clauses {
            if let Some(open) = clauses[idx].sole_open_literal(assignment) {
                node.implies.insert(open.variable());
                exposed = true;
            }
        }
        Ok(exposed)
    }

    /// Links `var` to the variables it forces.
    ///
    /// For every `target` in `implies(var)`, each clause shared by `var` and
    /// `target` whose only open literal is on `target` contributes all of its
    /// other variables as antecedents of `target`.
    pub fn update_associations(&mut self, var: Variable, assignment: &Assignment, clauses: &Cnf) {
        let targets: Vec<Variable> = self.nodes[var].implies.iter().copied().collect();

        for target in targets {
            let shared: Vec<usize> = self.nodes[var]
                .clauses
                .iter()
                .copied()
                .filter(|&idx| self.nodes[target].mentions(idx))
                .collect();

            for idx in shared {
                let clause = &clauses[idx];
                if clause
                    .sole_open_literal(assignment)
                    .is_none_or(|open| open.variable() != target)
                {
                    continue;
                }
                for antecedent in clause.variables().filter(|&v| v != target) {
                    self.nodes[target].implied_by.insert(antecedent);
                    if antecedent != var {
                        self.nodes[antecedent].implies.insert(target);
                    }
                }
            }
        }
    }

    /// Records every other variable of `clause` as an antecedent of `var`.
    pub fn record_reason(&mut self, var: Variable, clause: &Clause) {
        for antecedent in clause.variables().filter(|&v| v != var) {
            self.nodes[var].implied_by.insert(antecedent);
            self.nodes[antecedent].implies.insert(var);
        }
    }

    /// Drops all incoming edges of `var`. Decisions have no antecedents.
    pub fn clear_antecedents(&mut self, var: Variable) {
        let antecedents = std::mem::take(&mut self.nodes[var].implied_by);
        for antecedent in antecedents {
            self.nodes[antecedent].implies.remove(&var);
        }
    }

    /// Pops `var` off the trail and resets its node.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::TrailMismatch`] if `var` is not on top of the trail.
    pub fn unassign(
        &mut self,
        var: Variable,
        trail: &mut DecisionTrail,
    ) -> Result<(), InvariantViolation> {
        let popped = trail.pop();
        if popped != Some(var) {
            return Err(InvariantViolation::TrailMismatch {
                expected: var,
                found: popped,
            });
        }
        self.nodes[var].reset();
        Ok(())
    }

    /// Unassigns every node whose level is at least `target`, most recent
    /// first, and returns the unwound variables in that order.
    ///
    /// Edges into unassigned nodes are dropped afterwards, and the graph is
    /// checked against the assignment.
    ///
    /// # Errors
    ///
    /// Fails if a trail entry has no level, or if after unwinding some node
    /// still holds a level `>= target` or disagrees with `assignment`.
    pub fn backjump(
        &mut self,
        target: DecisionLevel,
        assignment: &mut Assignment,
        trail: &mut DecisionTrail,
    ) -> Result<Vec<Variable>, InvariantViolation> {
        let mut unwound = Vec::new();
        while let Some(top) = trail.last() {
            let level = self.nodes[top]
                .level
                .ok_or(InvariantViolation::MissingLevel(top))?;
            if level < target {
                break;
            }
            self.unassign(top, trail)?;
            assignment.unassign(top);
            unwound.push(top);
        }

        for node in &mut self.nodes {
            if node.value.is_none() {
                node.implied_by.clear();
                node.implies.clear();
            } else {
                node.implies.retain(|&v| assignment.is_assigned(v));
            }
        }

        for node in &self.nodes {
            if let Some(level) = node.level.filter(|&level| level >= target) {
                return Err(InvariantViolation::LevelSurvivedBackjump {
                    variable: node.variable,
                    level,
                    target,
                });
            }
            if node.value != assignment.value(node.variable) {
                return Err(InvariantViolation::GraphAssignmentMismatch(node.variable));
            }
        }

        Ok(unwound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // (x0 | x1) & (!x1 | x2)
    fn chain() -> Cnf {
        Cnf::from_pairs(3, &[vec![(0, 0), (0, 1)], vec![(1, 1), (0, 2)]]).unwrap()
    }

    fn set(
        graph: &mut ImplicationGraph,
        assignment: &mut Assignment,
        trail: &mut DecisionTrail,
        cnf: &Cnf,
        var: Variable,
        value: bool,
        level: DecisionLevel,
    ) -> bool {
        assignment.assign(var, value);
        graph
            .assign(var, value, level, assignment, trail, cnf)
            .unwrap()
    }

    #[test]
    fn test_static_clause_lists() {
        let cnf = chain();
        let graph = ImplicationGraph::new(&cnf);

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.node(0).clauses(), &[0]);
        assert_eq!(graph.node(1).clauses(), &[0, 1]);
        assert_eq!(graph.node(2).clauses(), &[1]);
    }

    #[test]
    fn test_assign_exposes_implications() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);
        let mut assignment = Assignment::new(3);
        let mut trail = DecisionTrail::new(3);

        assert!(set(&mut graph, &mut assignment, &mut trail, &cnf, 0, false, 0));
        assert!(graph.implies(0).contains(&1));

        graph.update_associations(0, &assignment, &cnf);
        assert!(graph.implied_by(1).contains(&0));

        assert!(set(&mut graph, &mut assignment, &mut trail, &cnf, 1, true, 0));
        graph.update_associations(1, &assignment, &cnf);
        assert!(graph.implied_by(2).contains(&1));
        assert!(!graph.implied_by(2).contains(&0));

        assert_eq!(trail.iter().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_assign_requires_matching_assignment() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);
        let assignment = Assignment::new(3);
        let mut trail = DecisionTrail::new(3);

        assert_eq!(
            graph.assign(0, true, 0, &assignment, &mut trail, &cnf),
            Err(InvariantViolation::UnrecordedAssignment(0))
        );
        assert!(trail.is_empty());
    }

    #[test]
    fn test_reassign_pushes_trail_once() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);
        let mut assignment = Assignment::new(3);
        let mut trail = DecisionTrail::new(3);

        set(&mut graph, &mut assignment, &mut trail, &cnf, 2, true, 0);
        set(&mut graph, &mut assignment, &mut trail, &cnf, 2, true, 0);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_unassign_out_of_order() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);
        let mut assignment = Assignment::new(3);
        let mut trail = DecisionTrail::new(3);

        set(&mut graph, &mut assignment, &mut trail, &cnf, 0, true, 0);
        set(&mut graph, &mut assignment, &mut trail, &cnf, 2, true, 1);

        assert_eq!(
            graph.unassign(0, &mut trail),
            Err(InvariantViolation::TrailMismatch {
                expected: 0,
                found: Some(2)
            })
        );
    }

    #[test]
    fn test_backjump_unwinds_levels() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);
        let mut assignment = Assignment::new(3);
        let mut trail = DecisionTrail::new(3);

        set(&mut graph, &mut assignment, &mut trail, &cnf, 0, false, 0);
        graph.update_associations(0, &assignment, &cnf);
        set(&mut graph, &mut assignment, &mut trail, &cnf, 1, true, 0);
        graph.update_associations(1, &assignment, &cnf);
        set(&mut graph, &mut assignment, &mut trail, &cnf, 2, true, 1);

        let unwound = graph.backjump(1, &mut assignment, &mut trail).unwrap();
        assert_eq!(unwound, vec![2]);
        assert_eq!(graph.level(2), None);
        assert!(graph.implied_by(2).is_empty());
        assert!(graph.implies(1).is_empty());
        assert_eq!(assignment.value(2), None);
        assert_eq!(graph.level(1), Some(0));

        let unwound = graph.backjump(0, &mut assignment, &mut trail).unwrap();
        assert_eq!(unwound, vec![1, 0]);
        assert!(trail.is_empty());
        assert_eq!(assignment.assigned_count(), 0);
        assert!(graph.iter().all(|node| node.level().is_none()));
    }

    #[test]
    fn test_backjump_detects_graph_mismatch() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);
        let mut assignment = Assignment::new(3);
        let mut trail = DecisionTrail::new(3);

        set(&mut graph, &mut assignment, &mut trail, &cnf, 0, true, 0);
        assignment.assign(1, true);

        assert_eq!(
            graph.backjump(1, &mut assignment, &mut trail),
            Err(InvariantViolation::GraphAssignmentMismatch(1))
        );
    }

    #[test]
    fn test_record_and_clear_reason() {
        let cnf = chain();
        let mut graph = ImplicationGraph::new(&cnf);

        graph.record_reason(1, &cnf[0]);
        assert!(graph.implied_by(1).contains(&0));
        assert!(graph.implies(0).contains(&1));

        graph.clear_antecedents(1);
        assert!(graph.implied_by(1).is_empty());
        assert!(graph.implies(0).is_empty());
    }
}
