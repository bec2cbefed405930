#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Formulas in conjunctive normal form and the partial-satisfaction checker.

use crate::sat::assignment::Assignment;
use crate::sat::clause::Clause;
use crate::sat::error::FormulaError;
use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use core::ops::{Index, IndexMut};
use std::fmt;

/// Nesting depth of the search at which a variable received its value.
///
/// Assignments forced before any decision live at [`ROOT_LEVEL`]; the first
/// decision opens level 0.
pub type DecisionLevel = i32;

/// Level of assignments made by the initial propagation pass.
pub const ROOT_LEVEL: DecisionLevel = -1;

/// A conjunction of clauses over `num_vars` variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Cnf {
    /// The clauses, in insertion order.
    pub clauses: Vec<Clause>,
    /// Number of variables; every literal's variable is below it.
    pub num_vars: usize,
}

impl Cnf {
    /// Builds a formula, checking that every literal names a declared variable.
    ///
    /// # Errors
    ///
    /// [`FormulaError::VariableOutOfRange`] if a literal's variable is `>= num_vars`.
    pub fn new<I>(num_vars: usize, clauses: I) -> Result<Self, FormulaError>
    where
        I: IntoIterator,
        I::Item: Into<Clause>,
    {
        let clauses: Vec<Clause> = clauses.into_iter().map(Into::into).collect();
        if let Some(variable) = clauses
            .iter()
            .flat_map(Clause::variables)
            .find(|&var| var >= num_vars)
        {
            return Err(FormulaError::VariableOutOfRange { variable, num_vars });
        }
        Ok(Self { clauses, num_vars })
    }

    /// Builds a formula from `(polarity, variable)` pairs, polarity `0` being the
    /// positive literal and `1` the negated one.
    ///
    /// # Errors
    ///
    /// Fails on a polarity outside `{0, 1}` or a variable `>= num_vars`.
    pub fn from_pairs(
        num_vars: usize,
        clauses: &[Vec<(u8, Variable)>],
    ) -> Result<Self, FormulaError> {
        let clauses = clauses
            .iter()
            .map(|clause| {
                clause
                    .iter()
                    .map(|&(polarity, var)| Literal::from_pair(polarity, var))
                    .collect::<Result<Clause, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(num_vars, clauses)
    }

    /// Number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Whether the formula has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Iterates over the clauses.
    pub fn iter(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    /// Iterates mutably over the clauses.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Clause> {
        self.clauses.iter_mut()
    }

    /// Appends a clause and returns its index.
    pub fn add_clause(&mut self, clause: Clause) -> usize {
        self.clauses.push(clause);
        self.clauses.len() - 1
    }

    /// Whether no clause is falsified yet.
    ///
    /// A clause is falsified only when every literal's variable is assigned and
    /// none of them is true, so an empty clause is always falsified. This is not
    /// full satisfaction: a clause with an unassigned variable passes.
    #[must_use]
    pub fn is_consistent(&self, assignment: &Assignment) -> bool {
        !self.clauses.iter().any(|c| c.is_falsified(assignment))
    }

    /// Index of the first falsified clause, if any.
    #[must_use]
    pub fn first_falsified(&self, assignment: &Assignment) -> Option<usize> {
        self.clauses.iter().position(|c| c.is_falsified(assignment))
    }

    /// Evaluates every clause under a complete model.
    #[must_use]
    pub fn verify(&self, solutions: &Solutions) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|lit| solutions.value(lit.variable()).is_some_and(|v| lit.is_satisfied_by(v)))
        })
    }

    /// Total number of literal occurrences.
    #[must_use]
    pub fn num_literals(&self) -> usize {
        self.clauses.iter().map(Clause::len).sum()
    }
}

impl Index<usize> for Cnf {
    type Output = Clause;

    fn index(&self, index: usize) -> &Self::Output {
        &self.clauses[index]
    }
}

impl IndexMut<usize> for Cnf {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.clauses[index]
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "p cnf {} {}", self.num_vars, self.clauses.len())?;
        for clause in &self.clauses {
            writeln!(f, "{clause}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Cnf {
        Cnf::from_pairs(
            5,
            &[
                vec![(1, 0), (0, 2), (0, 3)],
                vec![(0, 1), (1, 4)],
                vec![(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)],
            ],
        )
        .unwrap()
    }

    fn partial(num_vars: usize, values: &[(Variable, bool)]) -> Assignment {
        let mut a = Assignment::new(num_vars);
        for &(var, value) in values {
            a.assign(var, value);
        }
        a
    }

    #[test]
    fn test_is_consistent_partial_assignments() {
        let f = sample();

        assert!(f.is_consistent(&partial(5, &[(1, true), (3, false), (4, true)])));
        assert!(!f.is_consistent(&partial(
            5,
            &[(0, true), (1, false), (2, false), (3, false), (4, false)]
        )));
        assert!(!f.is_consistent(&partial(
            5,
            &[(0, false), (1, false), (2, false), (3, false), (4, true)]
        )));
        assert!(f.is_consistent(&partial(5, &[(4, true)])));
        assert!(!f.is_consistent(&partial(5, &[(4, true), (1, false)])));
    }

    #[test]
    fn test_empty_clause_is_falsified() {
        let f = Cnf::new(1, vec![Clause::default()]).unwrap();
        assert!(!f.is_consistent(&Assignment::new(1)));
        assert_eq!(f.first_falsified(&Assignment::new(1)), Some(0));
    }

    #[test]
    fn test_rejects_out_of_range_variable() {
        let err = Cnf::from_pairs(2, &[vec![(0, 2)]]).unwrap_err();
        assert_eq!(
            err,
            FormulaError::VariableOutOfRange {
                variable: 2,
                num_vars: 2
            }
        );
    }

    #[test]
    fn test_rejects_bad_polarity() {
        let err = Cnf::from_pairs(2, &[vec![(3, 0)]]).unwrap_err();
        assert_eq!(err, FormulaError::InvalidPolarity(3));
    }

    #[test]
    fn test_verify() {
        let f = sample();
        assert!(f.verify(&Solutions::new(vec![false, false, false, true, false])));
        assert!(!f.verify(&Solutions::new(vec![true, false, false, false, false])));
    }

    #[test]
    fn test_display_dimacs() {
        let f = Cnf::from_pairs(2, &[vec![(0, 0), (1, 1)], vec![(1, 0)]]).unwrap();
        assert_eq!(f.to_string(), "p cnf 2 2\n1 -2 0\n-1 0\n");
        assert_eq!(f.num_literals(), 3);
    }
}
