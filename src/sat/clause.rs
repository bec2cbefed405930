// #![warn(
//     clippy::all,
//     clippy::restriction,
//     clippy::pedantic,
//     clippy::nursery,
//     clippy::cargo,
// )]
//! Clauses: disjunctions of literals.

use crate::sat::assignment::Assignment;
use crate::sat::literal::{Literal, Variable};
use core::ops::Index;
use itertools::Itertools;
use smallvec::SmallVec;
use std::fmt;

/// Inline capacity of a clause before it spills to the heap.
const INLINE_LITERALS: usize = 8;

/// A disjunction of distinct literals.
///
/// Duplicate literals are collapsed on construction. A clause containing both
/// polarities of a variable is kept as is (it is a tautology).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Clause {
    literals: SmallVec<[Literal; INLINE_LITERALS]>,
}

impl Clause {
    /// Creates a clause from `literals`, dropping repeated literals while
    /// keeping first-occurrence order.
    pub fn new<I: IntoIterator<Item = Literal>>(literals: I) -> Self {
        let mut storage = SmallVec::new();
        for lit in literals {
            if !storage.contains(&lit) {
                storage.push(lit);
            }
        }
        Self { literals: storage }
    }

    /// Number of literals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    /// Whether the clause has no literals left. An empty clause is a conflict.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// Whether the clause has exactly one literal.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.len() == 1
    }

    /// Iterates over the literals.
    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.literals.iter()
    }

    /// Iterates over the variable of each literal.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.literals.iter().map(|lit| lit.variable())
    }

    /// Whether some literal is on `var`.
    #[must_use]
    pub fn contains_variable(&self, var: Variable) -> bool {
        self.literals.iter().any(|lit| lit.variable() == var)
    }

    /// Removes every literal on `var`. Returns whether anything was removed.
    pub fn remove_variable(&mut self, var: Variable) -> bool {
        let before = self.literals.len();
        self.literals.retain(|lit| lit.variable() != var);
        self.literals.len() != before
    }

    /// Drops every literal except `keep`.
    pub fn retain_only(&mut self, keep: Literal) {
        self.literals.retain(|lit| *lit == keep);
    }

    /// Three-valued evaluation: `Some(true)` if a literal is true, `Some(false)` if
    /// every literal is false (or the clause is empty), `None` otherwise.
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> Option<bool> {
        let mut undetermined = false;
        for &lit in &self.literals {
            match assignment.literal_value(lit) {
                Some(true) => return Some(true),
                Some(false) => {}
                None => undetermined = true,
            }
        }
        if undetermined { None } else { Some(false) }
    }

    /// Whether every literal is assigned false.
    #[must_use]
    pub fn is_falsified(&self, assignment: &Assignment) -> bool {
        self.evaluate(assignment) == Some(false)
    }

    /// The single literal of this clause that is not falsified, provided it is
    /// unassigned and every other literal is false.
    ///
    /// This is the shape of a clause that forces a value: once every other
    /// literal is false, the remaining one must become true.
    #[must_use]
    pub fn sole_open_literal(&self, assignment: &Assignment) -> Option<Literal> {
        let mut open = None;
        for &lit in &self.literals {
            match assignment.literal_value(lit) {
                Some(false) => {}
                Some(true) => return None,
                None if open.is_some() => return None,
                None => open = Some(lit),
            }
        }
        open
    }
}

impl Index<usize> for Clause {
    type Output = Literal;

    fn index(&self, index: usize) -> &Self::Output {
        &self.literals[index]
    }
}

impl From<Vec<Literal>> for Clause {
    fn from(literals: Vec<Literal>) -> Self {
        Self::new(literals)
    }
}

impl From<&[Literal]> for Clause {
    fn from(literals: &[Literal]) -> Self {
        Self::new(literals.iter().copied())
    }
}

impl FromIterator<Literal> for Clause {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "0");
        }
        write!(f, "{} 0", self.literals.iter().join(" "))
    }
}
