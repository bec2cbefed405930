#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Conflict analysis: learned clauses by resolution to the first UIP.

use crate::sat::clause::Clause;
use crate::sat::cnf::{DecisionLevel, ROOT_LEVEL};
use crate::sat::error::InvariantViolation;
use crate::sat::implication_graph::ImplicationGraph;
use crate::sat::literal::{Literal, Variable};
use crate::sat::trail::DecisionTrail;
use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
struct Resolution {
    seen: FxHashSet<Variable>,
    literals: Vec<Literal>,
    pending: usize,
}

impl Resolution {
    /// Folds the antecedents of `var` into the clause under construction.
    fn absorb(
        &mut self,
        graph: &ImplicationGraph,
        var: Variable,
        level: DecisionLevel,
    ) -> Result<(), InvariantViolation> {
        for &antecedent in graph.implied_by(var) {
            if !self.seen.insert(antecedent) {
                continue;
            }
            let value = graph
                .value(antecedent)
                .ok_or(InvariantViolation::MissingValue(antecedent))?;
            let ante_level = graph
                .level(antecedent)
                .ok_or(InvariantViolation::MissingLevel(antecedent))?;

            if ante_level == level {
                self.pending += 1;
            } else if ante_level != ROOT_LEVEL {
                self.literals.push(Literal::falsified_by(antecedent, value));
            }
        }
        Ok(())
    }
}

/// Derives a learned clause from the antecedents of `conflict_var`.
///
/// The antecedents of the conflicting variable are resolved against the
/// trail, most recent first, until a single variable of the current `level`
/// remains: the unique implication point. Root-level antecedents are dropped
/// since the formula alone forces them.
///
/// Every literal of the result is false under the current assignment and
/// exactly one of them belongs to `level`.
///
/// # Errors
///
/// Fails if a current-level variable without antecedents is reached while
/// others are still pending, or if the trail runs out first.
pub fn derive_learned_clause(
    conflict_var: Variable,
    graph: &ImplicationGraph,
    trail: &DecisionTrail,
    level: DecisionLevel,
) -> Result<Clause, InvariantViolation> {
    let mut resolution = Resolution::default();
    resolution.seen.insert(conflict_var);
    resolution.absorb(graph, conflict_var, level)?;

    let uip = if resolution.pending == 0 {
        conflict_var
    } else {
        let mut uip = None;
        for var in trail.iter().rev() {
            if var == conflict_var
                || !resolution.seen.contains(&var)
                || graph.level(var) != Some(level)
            {
                continue;
            }

            resolution.pending -= 1;
            if resolution.pending == 0 {
                uip = Some(var);
                break;
            }
            if graph.implied_by(var).is_empty() {
                return Err(InvariantViolation::MissingAntecedents {
                    variable: var,
                    pending: resolution.pending,
                });
            }
            resolution.absorb(graph, var, level)?;
        }
        uip.ok_or(InvariantViolation::UipNotFound(level))?
    };

    let value = graph
        .value(uip)
        .ok_or(InvariantViolation::MissingValue(uip))?;
    resolution.literals.push(Literal::falsified_by(uip, value));

    Ok(Clause::new(resolution.literals))
}
