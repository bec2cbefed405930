#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Unit propagation over a destructively shrinking working formula.
//!
//! Every assignment is applied to the working formula with [`apply_value`]:
//! clauses satisfied by the value collapse to the satisfying literal and
//! falsified literals are stripped. A clause that drops to one literal is a
//! unit; one that drops to none is a conflict. Because the working formula is
//! mutated in place, the caller keeps a pristine baseline to restore from.

use crate::sat::assignment::Assignment;
use crate::sat::cnf::{Cnf, DecisionLevel};
use crate::sat::error::SolverError;
use crate::sat::implication_graph::ImplicationGraph;
use crate::sat::literal::Variable;
use crate::sat::trail::DecisionTrail;
use tracing::trace;

/// What applying a value did to the working formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueEffect {
    /// Some clause lost its last literal.
    Fail,
    /// No clause became empty or unit.
    #[default]
    Stable,
    /// Some clause was reduced to a single literal.
    NewUnit,
}

/// Result of running propagation to a fixpoint or a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Propagation {
    /// No unit clause is left with an unassigned variable.
    Fixpoint {
        /// Variables assigned by this run.
        implied: usize,
    },
    /// A clause was falsified, either emptied or as a contradictory unit.
    Conflict {
        /// Variables assigned by this run before the conflict.
        implied: usize,
    },
}

impl Propagation {
    /// Variables assigned by this run.
    #[must_use]
    pub const fn implied(self) -> usize {
        match self {
            Self::Fixpoint { implied } | Self::Conflict { implied } => implied,
        }
    }

    /// Whether the run stopped at a falsified clause.
    #[must_use]
    pub const fn is_conflict(self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// The implication graph state propagation records forced values into.
///
/// `clauses` is the baseline formula the graph's clause lists index into. It
/// must be index-aligned with the working formula being propagated.
#[derive(Debug)]
pub struct GraphContext<'a> {
    /// Graph receiving one node update per forced variable.
    pub graph: &'a mut ImplicationGraph,
    /// Trail the forced variables are pushed onto.
    pub trail: &'a mut DecisionTrail,
    /// Baseline clauses, never shrunk.
    pub clauses: &'a Cnf,
    /// Level the forced variables are recorded at.
    pub level: DecisionLevel,
}

/// Applies `var = value` to every clause of `formula` mentioning `var`.
#[must_use]
pub fn apply_value(var: Variable, value: bool, formula: &mut Cnf) -> ValueEffect {
    let mut effect = ValueEffect::Stable;

    for clause in formula.iter_mut() {
        let satisfied = clause
            .iter()
            .find(|lit| lit.variable() == var && lit.is_satisfied_by(value))
            .copied();
        if let Some(satisfied) = satisfied {
            clause.retain_only(satisfied);
            continue;
        }

        if !clause.remove_variable(var) {
            continue;
        }

        match clause.len() {
            0 => return ValueEffect::Fail,
            1 => effect = ValueEffect::NewUnit,
            _ => {}
        }
    }

    effect
}

/// Assigns the forcing value of every unit clause until no new unit appears
/// in a full pass or a clause is falsified.
///
/// With a [`GraphContext`], each forced variable is recorded in the graph at
/// the context's level together with the clause that forced it.
///
/// # Errors
///
/// Propagates invariant violations raised by the implication graph.
pub fn propagate_units(
    formula: &mut Cnf,
    assignment: &mut Assignment,
    mut graph: Option<GraphContext<'_>>,
) -> Result<Propagation, SolverError> {
    let mut implied = 0;

    loop {
        let mut rescan = false;

        for idx in 0..formula.len() {
            if !formula[idx].is_unit() {
                continue;
            }
            let lit = formula[idx][0];
            let var = lit.variable();

            match assignment.value(var) {
                Some(current) if lit.is_satisfied_by(current) => continue,
                Some(_) => {
                    trace!(variable = var, clause = idx, "contradictory unit clause");
                    return Ok(Propagation::Conflict { implied });
                }
                None => {}
            }

            let value = lit.forcing_value();
            assignment.assign(var, value);
            implied += 1;
            trace!(variable = var, value, clause = idx, "propagated");

            if let Some(ctx) = graph.as_mut() {
                ctx.graph.record_reason(var, &ctx.clauses[idx]);
                if ctx
                    .graph
                    .assign(var, value, ctx.level, assignment, ctx.trail, ctx.clauses)?
                {
                    ctx.graph.update_associations(var, assignment, ctx.clauses);
                }
            }

            if !formula.is_consistent(assignment) {
                return Ok(Propagation::Conflict { implied });
            }

            match apply_value(var, value, formula) {
                ValueEffect::Fail => return Ok(Propagation::Conflict { implied }),
                ValueEffect::NewUnit => rescan = true,
                ValueEffect::Stable => {}
            }
        }

        if !rescan {
            return Ok(Propagation::Fixpoint { implied });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::ROOT_LEVEL;

    #[test]
    fn test_apply_value_shrinks_and_collapses() {
        let mut f = Cnf::from_pairs(3, &[vec![(0, 0), (0, 1)], vec![(1, 0), (0, 2), (0, 1)]])
            .unwrap();

        assert_eq!(apply_value(0, false, &mut f), ValueEffect::NewUnit);
        assert_eq!(f[0].len(), 1);
        assert_eq!(f[0][0].variable(), 1);
        assert_eq!(f[1].len(), 1);
        assert!(f[1][0].is_negated());
    }

    #[test]
    fn test_apply_value_fail_and_stable() {
        let mut f = Cnf::from_pairs(2, &[vec![(0, 0)], vec![(0, 1), (1, 0)]]).unwrap();
        assert_eq!(apply_value(0, false, &mut f), ValueEffect::Fail);

        let mut f = Cnf::from_pairs(3, &[vec![(0, 0), (0, 1), (0, 2)]]).unwrap();
        assert_eq!(apply_value(0, false, &mut f), ValueEffect::Stable);
        assert_eq!(f[0].len(), 2);
    }

    #[test]
    fn test_apply_value_keeps_satisfied_tautology() {
        let mut f = Cnf::from_pairs(1, &[vec![(1, 0), (0, 0)]]).unwrap();
        assert_eq!(apply_value(0, true, &mut f), ValueEffect::Stable);
        assert_eq!(f[0].len(), 1);
        assert!(!f[0][0].is_negated());
    }

    #[test]
    fn test_propagation_chain() {
        // x0, (!x0 | x1), (!x1 | x2)
        let mut f = Cnf::from_pairs(
            3,
            &[vec![(0, 0)], vec![(1, 0), (0, 1)], vec![(1, 1), (0, 2)]],
        )
        .unwrap();
        let mut a = Assignment::new(3);

        let outcome = propagate_units(&mut f, &mut a, None).unwrap();
        assert_eq!(outcome, Propagation::Fixpoint { implied: 3 });
        assert!(a.all_assigned());
        assert_eq!(a.value(2), Some(true));
    }

    #[test]
    fn test_contradictory_units_conflict() {
        let mut f = Cnf::from_pairs(1, &[vec![(0, 0)], vec![(1, 0)]]).unwrap();
        let mut a = Assignment::new(1);

        let outcome = propagate_units(&mut f, &mut a, None).unwrap();
        assert!(outcome.is_conflict());
        assert_eq!(outcome.implied(), 1);
    }

    #[test]
    fn test_propagation_records_graph() {
        let baseline = Cnf::from_pairs(2, &[vec![(0, 0)], vec![(1, 0), (0, 1)]]).unwrap();
        let mut working = baseline.clone();
        let mut a = Assignment::new(2);
        let mut graph = ImplicationGraph::new(&baseline);
        let mut trail = DecisionTrail::new(2);

        let ctx = GraphContext {
            graph: &mut graph,
            trail: &mut trail,
            clauses: &baseline,
            level: ROOT_LEVEL,
        };
        let outcome = propagate_units(&mut working, &mut a, Some(ctx)).unwrap();

        assert_eq!(outcome, Propagation::Fixpoint { implied: 2 });
        assert_eq!(trail.iter().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(graph.level(1), Some(ROOT_LEVEL));
        assert!(graph.implied_by(1).contains(&0));
        assert!(graph.implied_by(0).is_empty());
    }

    #[test]
    fn test_propagation_collapses_satisfied_clauses() {
        // x0, (x0 | x1 | x2), (!x0 | x2)
        let mut f = Cnf::from_pairs(
            3,
            &[vec![(0, 0)], vec![(0, 0), (0, 1), (0, 2)], vec![(1, 0), (0, 2)]],
        )
        .unwrap();
        let mut a = Assignment::new(3);

        let outcome = propagate_units(&mut f, &mut a, None).unwrap();

        assert_eq!(outcome, Propagation::Fixpoint { implied: 2 });
        assert_eq!(f[1].len(), 1);
        assert_eq!(f[1][0], crate::sat::literal::Literal::positive(0));
        assert_eq!(a.value(1), None);
        assert_eq!(a.value(2), Some(true));
    }
}
