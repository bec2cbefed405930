#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The solver interface, its models and its statistics.

use crate::sat::cdcl::Cdcl;
use crate::sat::cnf::Cnf;
use crate::sat::error::SolverError;
use crate::sat::literal::{Literal, Variable};
use itertools::Itertools;
use std::fmt;

/// A complete model: one truth value per variable, indexed from 0.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Solutions(Vec<bool>);

impl Solutions {
    /// Wraps one value per variable.
    #[must_use]
    pub const fn new(values: Vec<bool>) -> Self {
        Self(values)
    }

    /// The value of `var`, or `None` if it is out of range.
    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.0.get(var).copied()
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the model covers no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(variable, value)` pairs in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, bool)> + '_ {
        self.0.iter().copied().enumerate()
    }

    /// The true literal of each variable.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.iter().map(|(var, value)| Literal::falsified_by(var, !value))
    }
}

impl From<Vec<bool>> for Solutions {
    fn from(values: Vec<bool>) -> Self {
        Self::new(values)
    }
}

/// Writes the model as signed DIMACS literals.
impl fmt::Display for Solutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.literals().join(" "))
    }
}

/// Counters collected over one solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SolutionStats {
    /// Variables assigned by choice.
    pub decisions: usize,
    /// Variables assigned because a unit clause forced them.
    pub propagations: usize,
    /// Conflicts analysed.
    pub conflicts: usize,
    /// Clauses added to the formula by conflict analysis.
    pub learnt_clauses: usize,
    /// Backjumps performed, one per learned clause.
    pub backjumps: usize,
    /// Backjumps that unwound every decision.
    pub restarts: usize,
}

impl SolutionStats {
    /// Every variable assignment attempted, whether decided or forced.
    #[must_use]
    pub const fn attempts(&self) -> usize {
        self.decisions + self.propagations
    }
}

/// A SAT solver over a fixed formula.
pub trait Solver {
    /// Creates a solver for `cnf`. No search happens until [`Solver::solve`].
    fn new(cnf: Cnf) -> Self;

    /// Runs the search from scratch.
    ///
    /// `Ok(None)` means the formula is unsatisfiable.
    ///
    /// # Errors
    ///
    /// [`SolverError::Invariant`] if the engine reaches an inconsistent state.
    fn solve(&mut self) -> Result<Option<Solutions>, SolverError>;

    /// The model found by the last call to [`Solver::solve`], if any.
    fn solutions(&self) -> Option<Solutions>;

    /// Counters of the last call to [`Solver::solve`].
    fn stats(&self) -> SolutionStats;
}

/// Outcome of a solve call together with its counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SolveReport {
    /// The model, or `None` if the formula is unsatisfiable.
    pub solutions: Option<Solutions>,
    /// Decisions plus forced assignments made during the search.
    pub attempts: usize,
    /// Full search counters.
    pub stats: SolutionStats,
}

impl SolveReport {
    /// Whether a model was found.
    #[must_use]
    pub const fn is_sat(&self) -> bool {
        self.solutions.is_some()
    }
}

/// Solves `cnf` with the clause-learning engine.
///
/// # Errors
///
/// See [`Solver::solve`].
pub fn solve(cnf: Cnf) -> Result<SolveReport, SolverError> {
    let mut solver = Cdcl::new(cnf);
    let solutions = solver.solve()?;
    let stats = solver.stats();
    Ok(SolveReport {
        solutions,
        attempts: stats.attempts(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_solutions() {
        let sol = Solutions::new(vec![true, false, true]);
        assert_eq!(sol.to_string(), "1 -2 3");
        assert_eq!(Solutions::default().to_string(), "");
    }

    #[test]
    fn test_solutions_access() {
        let sol = Solutions::from(vec![false, true]);
        assert_eq!(sol.len(), 2);
        assert_eq!(sol.value(1), Some(true));
        assert_eq!(sol.value(2), None);
        assert_eq!(
            sol.iter().collect::<Vec<_>>(),
            vec![(0, false), (1, true)]
        );
    }

    #[test]
    fn test_attempts() {
        let stats = SolutionStats {
            decisions: 3,
            propagations: 4,
            ..SolutionStats::default()
        };
        assert_eq!(stats.attempts(), 7);
    }

    #[test]
    fn test_solve_report() {
        let cnf = Cnf::from_pairs(2, &[vec![(0, 0), (0, 1)], vec![(1, 0)]]).unwrap();
        let report = solve(cnf.clone()).unwrap();

        assert!(report.is_sat());
        assert!(cnf.verify(report.solutions.as_ref().unwrap()));
        assert_eq!(report.attempts, report.stats.attempts());
        assert!(report.attempts >= 1);
    }
}
