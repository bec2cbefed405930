#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict-driven clause learning with non-chronological backjumping.
//!
//! The search is a state machine over [`SearchState`]. Variables are decided
//! strictly in index order, trying `false` first. Every conflict is analysed
//! through the implication graph into a learned clause, which is appended to
//! the baseline formula, and the search unwinds to the level computed from
//! that clause.
//!
//! The working formula is shrunk destructively by propagation. On every
//! backjump it is rebuilt from the baseline (original plus learned clauses)
//! and the surviving assignment is replayed into it.

use crate::sat::assignment::Assignment;
use crate::sat::backjump::backjump_level;
use crate::sat::clause::Clause;
use crate::sat::cnf::{Cnf, DecisionLevel, ROOT_LEVEL};
use crate::sat::conflict_analysis::derive_learned_clause;
use crate::sat::error::{InvariantViolation, SolverError};
use crate::sat::implication_graph::ImplicationGraph;
use crate::sat::literal::Variable;
use crate::sat::propagation::{GraphContext, Propagation, ValueEffect, apply_value, propagate_units};
use crate::sat::solver::{SolutionStats, Solutions, Solver};
use crate::sat::trail::DecisionTrail;
use bit_vec::BitVec;
use tracing::{debug, info, trace};

/// Where the search loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchState {
    /// Assign the given variable at a new decision level.
    Deciding(Variable),
    /// Run unit propagation at the current level.
    Propagating,
    /// A clause is falsified and must be analysed.
    ConflictDetected,
    /// Unwind every assignment at or above the given level.
    Backjumping(DecisionLevel),
    /// Every variable holds a value and no clause is falsified.
    Solved,
    /// A conflict arose with no decision to undo.
    Unsatisfiable,
}

/// One analysed conflict.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConflictRecord {
    /// Level at which the clause was falsified.
    pub conflict_level: DecisionLevel,
    /// Level the search unwound to.
    pub backjump_level: DecisionLevel,
    /// Clause derived from the conflict.
    pub learned: Clause,
}

fn level_index(level: DecisionLevel) -> usize {
    usize::try_from(level).unwrap_or(0)
}

/// The clause-learning search engine and its run state.
///
/// All state is rebuilt at the start of every [`Solver::solve`] call.
#[derive(Debug, Clone)]
pub struct Cdcl {
    original: Cnf,
    /// Original clauses followed by every learned clause, never shrunk.
    baseline: Cnf,
    /// Index-aligned with `baseline`, shrunk by propagation.
    working: Cnf,
    assignment: Assignment,
    graph: ImplicationGraph,
    trail: DecisionTrail,
    /// `decisions[l]` is the variable decided at level `l`.
    decisions: Vec<Variable>,
    /// Variables whose `false` branch failed at their last decision level.
    zero_failed: BitVec,
    level: DecisionLevel,
    stats: SolutionStats,
    history: Vec<ConflictRecord>,
    state: SearchState,
}

impl Cdcl {
    /// Current state of the search loop.
    #[must_use]
    pub const fn state(&self) -> SearchState {
        self.state
    }

    /// The formula as given, without learned clauses.
    #[must_use]
    pub const fn original(&self) -> &Cnf {
        &self.original
    }

    /// The current partial assignment.
    #[must_use]
    pub const fn assignment(&self) -> &Assignment {
        &self.assignment
    }

    /// The implication graph of the current assignment.
    #[must_use]
    pub const fn graph(&self) -> &ImplicationGraph {
        &self.graph
    }

    /// Assigned variables in assignment order.
    #[must_use]
    pub const fn trail(&self) -> &DecisionTrail {
        &self.trail
    }

    /// Clauses learned by the last solve call, in learning order.
    #[must_use]
    pub fn learned_clauses(&self) -> &[Clause] {
        &self.baseline.clauses[self.original.len()..]
    }

    /// Every conflict of the last solve call with the level it unwound to.
    #[must_use]
    pub fn conflict_history(&self) -> &[ConflictRecord] {
        &self.history
    }

    fn reset(&mut self) {
        let n = self.original.num_vars;
        self.baseline = self.original.clone();
        self.working = self.original.clone();
        self.assignment = Assignment::new(n);
        self.graph = ImplicationGraph::new(&self.original);
        self.trail = DecisionTrail::new(n);
        self.decisions.clear();
        self.zero_failed = BitVec::from_elem(n, false);
        self.level = ROOT_LEVEL;
        self.stats = SolutionStats::default();
        self.history.clear();
        self.state = if self.original.iter().any(Clause::is_empty) {
            SearchState::Unsatisfiable
        } else {
            SearchState::Propagating
        };
    }

    fn step(&mut self) -> Result<SearchState, SolverError> {
        match self.state {
            SearchState::Deciding(var) => self.decide(var),
            SearchState::Propagating => self.propagate(),
            SearchState::ConflictDetected => self.analyse_conflict(),
            SearchState::Backjumping(target) => self.backjump(target),
            terminal @ (SearchState::Solved | SearchState::Unsatisfiable) => Ok(terminal),
        }
    }

    fn decide(&mut self, var: Variable) -> Result<SearchState, SolverError> {
        self.graph.clear_antecedents(var);
        self.level += 1;

        let value = self.zero_failed.get(var).unwrap_or(false);
        if value {
            self.zero_failed.set(var, false);
        }

        self.assignment.assign(var, value);
        self.decisions.push(var);
        self.stats.decisions += 1;
        debug!(variable = var, value, level = self.level, "decision");

        if self.graph.assign(
            var,
            value,
            self.level,
            &self.assignment,
            &mut self.trail,
            &self.baseline,
        )? {
            self.graph
                .update_associations(var, &self.assignment, &self.baseline);
        }

        if !self.working.is_consistent(&self.assignment) {
            return Ok(SearchState::ConflictDetected);
        }
        Ok(match apply_value(var, value, &mut self.working) {
            ValueEffect::Fail => SearchState::ConflictDetected,
            ValueEffect::Stable | ValueEffect::NewUnit => SearchState::Propagating,
        })
    }

    fn propagate(&mut self) -> Result<SearchState, SolverError> {
        let ctx = GraphContext {
            graph: &mut self.graph,
            trail: &mut self.trail,
            clauses: &self.baseline,
            level: self.level,
        };
        let outcome = propagate_units(&mut self.working, &mut self.assignment, Some(ctx))?;
        self.stats.propagations += outcome.implied();

        Ok(match outcome {
            Propagation::Conflict { .. } if self.level == ROOT_LEVEL => {
                debug!("conflict at root level");
                SearchState::Unsatisfiable
            }
            Propagation::Conflict { .. } => SearchState::ConflictDetected,
            Propagation::Fixpoint { .. } => self
                .assignment
                .first_unassigned()
                .map_or(SearchState::Solved, SearchState::Deciding),
        })
    }

    /// Index of a falsified baseline clause, preferring one that mentions the
    /// most recently assigned variable.
    fn falsified_clause(&self) -> Option<usize> {
        let top = self.trail.last();
        self.baseline
            .iter()
            .position(|clause| {
                top.is_some_and(|var| clause.contains_variable(var))
                    && clause.is_falsified(&self.assignment)
            })
            .or_else(|| self.baseline.first_falsified(&self.assignment))
    }

    fn analyse_conflict(&mut self) -> Result<SearchState, SolverError> {
        let conflict_level = self.level;
        if conflict_level == ROOT_LEVEL {
            return Ok(SearchState::Unsatisfiable);
        }
        self.stats.conflicts += 1;

        let idx = self
            .falsified_clause()
            .ok_or(InvariantViolation::NoFalsifiedClause(conflict_level))?;
        let conflict = self.baseline[idx].clone();
        let conflict_var = conflict
            .variables()
            .max_by_key(|&var| self.trail.position(var))
            .ok_or(InvariantViolation::NoFalsifiedClause(conflict_level))?;

        if self.decisions.contains(&conflict_var) {
            return Err(InvariantViolation::DecisionInConflict(conflict_var).into());
        }
        trace!(clause = %conflict, variable = conflict_var, "falsified clause");

        self.graph.record_reason(conflict_var, &conflict);
        let learned = derive_learned_clause(conflict_var, &self.graph, &self.trail, conflict_level)?;
        let target = backjump_level(&learned, conflict_level, &self.graph)?;

        for &var in &self.decisions[level_index(target)..level_index(conflict_level)] {
            self.zero_failed.set(var, false);
        }
        if let Some(&decision) = self.decisions.get(level_index(conflict_level)) {
            if self.assignment.value(decision) == Some(false) {
                self.zero_failed.set(decision, true);
            }
        }

        debug!(
            conflict_level,
            backjump_level = target,
            learned = %learned,
            "learned clause"
        );

        let idx = self.baseline.add_clause(learned.clone());
        self.graph.register_clause(idx, &learned);
        self.stats.learnt_clauses += 1;
        self.history.push(ConflictRecord {
            conflict_level,
            backjump_level: target,
            learned,
        });

        Ok(SearchState::Backjumping(target))
    }

    fn backjump(&mut self, target: DecisionLevel) -> Result<SearchState, SolverError> {
        let unwound = self
            .graph
            .backjump(target, &mut self.assignment, &mut self.trail)?;
        self.decisions.truncate(level_index(target));
        self.level = target - 1;
        self.stats.backjumps += 1;
        if target == 0 {
            self.stats.restarts += 1;
        }
        debug!(target, unwound = unwound.len(), "backjump");

        self.working = self.baseline.clone();
        for var in self.trail.iter() {
            let value = self
                .assignment
                .value(var)
                .ok_or(InvariantViolation::UnrecordedAssignment(var))?;
            if apply_value(var, value, &mut self.working) == ValueEffect::Fail {
                return Ok(if self.level == ROOT_LEVEL {
                    SearchState::Unsatisfiable
                } else {
                    SearchState::ConflictDetected
                });
            }
        }

        Ok(SearchState::Propagating)
    }
}

impl Solver for Cdcl {
    fn new(cnf: Cnf) -> Self {
        let n = cnf.num_vars;
        Self {
            baseline: cnf.clone(),
            working: cnf.clone(),
            assignment: Assignment::new(n),
            graph: ImplicationGraph::new(&cnf),
            trail: DecisionTrail::new(n),
            decisions: Vec::new(),
            zero_failed: BitVec::from_elem(n, false),
            level: ROOT_LEVEL,
            stats: SolutionStats::default(),
            history: Vec::new(),
            state: SearchState::Propagating,
            original: cnf,
        }
    }

    fn solve(&mut self) -> Result<Option<Solutions>, SolverError> {
        self.reset();

        loop {
            match self.state {
                SearchState::Solved => {
                    info!(
                        decisions = self.stats.decisions,
                        conflicts = self.stats.conflicts,
                        "satisfiable"
                    );
                    return Ok(self.solutions());
                }
                SearchState::Unsatisfiable => {
                    info!(
                        decisions = self.stats.decisions,
                        conflicts = self.stats.conflicts,
                        "unsatisfiable"
                    );
                    return Ok(None);
                }
                _ => self.state = self.step()?,
            }
        }
    }

    fn solutions(&self) -> Option<Solutions> {
        if self.state == SearchState::Solved {
            self.assignment.to_solutions()
        } else {
            None
        }
    }

    fn stats(&self) -> SolutionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::literal::Literal;

    fn run(num_vars: usize, clauses: &[Vec<(u8, Variable)>]) -> (Cdcl, Option<Solutions>) {
        let cnf = Cnf::from_pairs(num_vars, clauses).unwrap();
        let mut solver = Cdcl::new(cnf);
        let sol = solver.solve().unwrap();
        (solver, sol)
    }

    #[test]
    fn test_unit_sat() {
        let (solver, sol) = run(1, &[vec![(0, 0)]]);
        assert_eq!(sol, Some(Solutions::new(vec![true])));
        assert_eq!(solver.stats().decisions, 0);
        assert_eq!(solver.stats().propagations, 1);
        assert_eq!(solver.state(), SearchState::Solved);
    }

    #[test]
    fn test_contradictory_units_unsat_at_root() {
        let (solver, sol) = run(1, &[vec![(0, 0)], vec![(1, 0)]]);
        assert_eq!(sol, None);
        assert_eq!(solver.stats().decisions, 0);
        assert!(solver.stats().attempts() >= 1);
        assert!(solver.learned_clauses().is_empty());
    }

    #[test]
    fn test_empty_clause_unsat() {
        let cnf = Cnf::new(1, vec![Clause::default()]).unwrap();
        let mut solver = Cdcl::new(cnf);
        assert_eq!(solver.solve().unwrap(), None);
        assert_eq!(solver.stats().attempts(), 0);
    }

    #[test]
    fn test_no_clauses() {
        let (solver, sol) = run(2, &[]);
        assert_eq!(sol, Some(Solutions::new(vec![false, false])));
        assert_eq!(solver.stats().decisions, 2);
    }

    #[test]
    fn test_learns_unit_and_restarts() {
        // (x0 | !x1), (x1 | x2), (x1 | !x2)
        let (solver, sol) = run(
            3,
            &[vec![(0, 0), (1, 1)], vec![(0, 1), (0, 2)], vec![(0, 1), (1, 2)]],
        );

        // x0 = 0 forces x1 = 0, which clashes on x2. The UIP is x1.
        assert_eq!(
            solver.learned_clauses(),
            &[Clause::new([Literal::positive(1)])]
        );
        assert_eq!(
            solver.conflict_history()[0],
            ConflictRecord {
                conflict_level: 0,
                backjump_level: 0,
                learned: Clause::new([Literal::positive(1)]),
            }
        );
        assert_eq!(solver.stats().restarts, 1);
        assert_eq!(solver.stats().conflicts, 1);
        assert_eq!(sol, Some(Solutions::new(vec![true, true, false])));
    }

    #[test]
    fn test_unsat_after_decisions() {
        // (x0 | !x1), (!x0 | x2), (!x0 | !x2), (x0 | x1)
        let (solver, sol) = run(
            3,
            &[
                vec![(0, 0), (1, 1)],
                vec![(1, 0), (0, 2)],
                vec![(1, 0), (1, 2)],
                vec![(0, 0), (0, 1)],
            ],
        );
        assert_eq!(sol, None);
        assert!(solver.stats().decisions >= 1);
        assert!(!solver.learned_clauses().is_empty());
    }

    #[test]
    fn test_conflict_history_levels() {
        // Pigeonhole: 3 pigeons, 2 holes. p(i, h) = 2 * i + h.
        let mut clauses = Vec::new();
        for i in 0..3 {
            clauses.push(vec![(0, 2 * i), (0, 2 * i + 1)]);
        }
        for h in 0..2 {
            for i in 0..3 {
                for j in (i + 1)..3 {
                    clauses.push(vec![(1, 2 * i + h), (1, 2 * j + h)]);
                }
            }
        }
        let (solver, sol) = run(6, &clauses);

        assert_eq!(sol, None);
        assert!(!solver.conflict_history().is_empty());
        assert_eq!(solver.learned_clauses().len(), solver.stats().learnt_clauses);
        for record in solver.conflict_history() {
            assert!(record.backjump_level >= 0);
            assert!(record.backjump_level <= record.conflict_level);
        }
    }

    #[test]
    fn test_solve_is_repeatable() {
        let cnf = Cnf::from_pairs(
            3,
            &[vec![(0, 0), (1, 1)], vec![(0, 1), (0, 2)], vec![(0, 1), (1, 2)]],
        )
        .unwrap();
        let mut solver = Cdcl::new(cnf);
        let first = solver.solve().unwrap();
        let stats = solver.stats();
        let second = solver.solve().unwrap();

        assert_eq!(first, second);
        assert_eq!(stats, solver.stats());
        assert_eq!(solver.solutions(), second);
    }
}
