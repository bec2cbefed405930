#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Backjump targets for learned clauses.

use crate::sat::clause::Clause;
use crate::sat::cnf::DecisionLevel;
use crate::sat::error::InvariantViolation;
use crate::sat::implication_graph::ImplicationGraph;

/// The level to unwind to after learning `learned` at `conflict_level`.
///
/// This is the highest level among the literals that do not belong to the
/// conflict level, or 0 when there are none. The search restarts from the
/// root in the latter case.
///
/// # Errors
///
/// Fails if a literal's variable has no level, or if the result would lie
/// above `conflict_level`.
pub fn backjump_level(
    learned: &Clause,
    conflict_level: DecisionLevel,
    graph: &ImplicationGraph,
) -> Result<DecisionLevel, InvariantViolation> {
    let mut target: DecisionLevel = 0;
    for var in learned.variables() {
        let level = graph
            .level(var)
            .ok_or(InvariantViolation::MissingLevel(var))?;
        if level != conflict_level {
            target = target.max(level);
        }
    }

    if target > conflict_level {
        return Err(InvariantViolation::BackjumpAboveConflict {
            target,
            conflict_level,
        });
    }
    Ok(target)
}
