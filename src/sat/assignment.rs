//! Partial assignments of truth values to variables.

use crate::sat::literal::{Literal, Variable};
use crate::sat::solver::Solutions;
use core::ops::Index;

/// The state of a single variable.
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default, Hash, PartialOrd, Ord)]
pub enum VarState {
    /// No value yet.
    #[default]
    Unassigned,
    /// Holds the given value.
    Assigned(bool),
}

impl VarState {
    /// Whether the variable holds a value.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }

    /// Whether the variable has no value yet.
    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        !self.is_assigned()
    }

    /// The held value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<bool> {
        match self {
            Self::Assigned(b) => Some(*b),
            Self::Unassigned => None,
        }
    }
}

/// A partial mapping from variables to truth values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    states: Vec<VarState>,
    assigned: usize,
}

impl Index<Variable> for Assignment {
    type Output = VarState;

    fn index(&self, index: Variable) -> &Self::Output {
        &self.states[index]
    }
}

impl Assignment {
    /// Creates an assignment with all `num_vars` variables unassigned.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            states: vec![VarState::Unassigned; num_vars],
            assigned: 0,
        }
    }

    /// Sets `var` to `value`, overwriting any previous value.
    pub fn assign(&mut self, var: Variable, value: bool) {
        if self.states[var].is_unassigned() {
            self.assigned += 1;
        }
        self.states[var] = VarState::Assigned(value);
    }

    /// Clears the value of `var`.
    pub fn unassign(&mut self, var: Variable) {
        if self.states[var].is_assigned() {
            self.assigned -= 1;
        }
        self.states[var] = VarState::Unassigned;
    }

    /// The value of `var`, or `None` if it is unassigned or out of range.
    #[must_use]
    pub fn value(&self, var: Variable) -> Option<bool> {
        self.states.get(var).and_then(VarState::value)
    }

    /// Whether `var` holds a value.
    #[must_use]
    pub fn is_assigned(&self, var: Variable) -> bool {
        self.value(var).is_some()
    }

    /// Truth value of `lit`, or `None` while its variable is unassigned.
    #[must_use]
    pub fn literal_value(&self, lit: Literal) -> Option<bool> {
        self.value(lit.variable())
            .map(|value| lit.is_satisfied_by(value))
    }

    /// Number of variables holding a value.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.assigned
    }

    /// Whether every variable holds a value.
    #[must_use]
    pub fn all_assigned(&self) -> bool {
        self.assigned == self.states.len()
    }

    /// Lowest-index unassigned variable.
    #[must_use]
    pub fn first_unassigned(&self) -> Option<Variable> {
        self.states.iter().position(VarState::is_unassigned)
    }

    /// Iterates over `(variable, state)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (Variable, VarState)> + '_ {
        self.states.iter().copied().enumerate()
    }

    /// The complete model, if every variable has a value.
    #[must_use]
    pub fn to_solutions(&self) -> Option<Solutions> {
        self.states
            .iter()
            .map(VarState::value)
            .collect::<Option<Vec<_>>>()
            .map(Solutions::new)
    }
}
