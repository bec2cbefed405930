#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The decision trail.

use crate::sat::literal::Variable;
use std::ops::Index;

/// Variables in the order they received a value, by decision or by propagation.
///
/// One trail belongs to one search run. The implication graph pushes onto it
/// when a node is assigned and pops from it when a node is unassigned, so the
/// top of the trail is always the most recently assigned variable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecisionTrail {
    order: Vec<Variable>,
    positions: Vec<Option<usize>>,
}

impl Index<usize> for DecisionTrail {
    type Output = Variable;

    fn index(&self, index: usize) -> &Self::Output {
        &self.order[index]
    }
}

impl DecisionTrail {
    /// Creates an empty trail for `num_vars` variables.
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            order: Vec::with_capacity(num_vars),
            positions: vec![None; num_vars],
        }
    }

    /// Number of assigned variables on the trail.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates from the oldest assignment to the newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Variable> + '_ {
        self.order.iter().copied()
    }

    /// The most recently assigned variable.
    #[must_use]
    pub fn last(&self) -> Option<Variable> {
        self.order.last().copied()
    }

    /// Index of `var` on the trail, if it is assigned.
    #[must_use]
    pub fn position(&self, var: Variable) -> Option<usize> {
        self.positions.get(var).copied().flatten()
    }

    /// Whether `var` is on the trail.
    #[must_use]
    pub fn contains(&self, var: Variable) -> bool {
        self.position(var).is_some()
    }

    /// Appends `var` as the most recent assignment.
    pub fn push(&mut self, var: Variable) {
        self.positions[var] = Some(self.order.len());
        self.order.push(var);
    }

    /// Removes and returns the most recent assignment.
    pub fn pop(&mut self) -> Option<Variable> {
        let var = self.order.pop()?;
        self.positions[var] = None;
        Some(var)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_positions() {
        let mut trail = DecisionTrail::new(4);
        trail.push(2);
        trail.push(0);
        trail.push(3);

        assert_eq!(trail.len(), 3);
        assert_eq!(trail.last(), Some(3));
        assert_eq!(trail.position(0), Some(1));
        assert_eq!(trail.position(1), None);
        assert_eq!(trail[0], 2);

        assert_eq!(trail.pop(), Some(3));
        assert!(!trail.contains(3));
        assert_eq!(trail.iter().rev().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_pop_until_empty() {
        let mut trail = DecisionTrail::new(2);
        trail.push(1);
        trail.push(0);
        assert_eq!(trail.pop(), Some(0));
        assert_eq!(trail.pop(), Some(1));

        assert!(trail.is_empty());
        assert_eq!(trail.position(1), None);
        assert_eq!(trail.pop(), None);
    }
}
