//! Error types for formula construction, DIMACS parsing and the search engine.
//!
//! Unsatisfiability is not an error: it is reported through the solver's
//! outcome. The types here cover malformed input and broken internal
//! invariants of the search.

use crate::sat::cnf::DecisionLevel;
use crate::sat::literal::Variable;
use std::io;
use thiserror::Error;

/// A formula that cannot be built from the given literals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Literal polarity outside `{0, 1}`.
    #[error("literal polarity must be 0 or 1, got {0}")]
    InvalidPolarity(u8),

    /// A literal mentions a variable the formula does not declare.
    #[error("variable {variable} is out of range for a formula over {num_vars} variables")]
    VariableOutOfRange {
        /// Offending variable index.
        variable: Variable,
        /// Declared variable count.
        num_vars: usize,
    },
}

/// Failure to read a DIMACS CNF document.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Underlying reader failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A token that is not a signed integer where a literal was expected.
    #[error("line {line}: cannot parse literal '{token}'")]
    InvalidLiteral {
        /// One-based line number.
        line: usize,
        /// The offending token.
        token: String,
    },

    /// A `p` line that is not of the form `p cnf <vars> <clauses>`.
    #[error("line {line}: malformed problem line '{content}'")]
    InvalidHeader {
        /// One-based line number.
        line: usize,
        /// The full problem line.
        content: String,
    },

    /// A variable count, declared or implied by a literal, above
    /// [`crate::sat::dimacs::MAX_VARIABLES`].
    #[error("line {line}: {count} variables exceeds the supported maximum")]
    TooManyVariables {
        /// One-based line number.
        line: usize,
        /// The requested variable count.
        count: u64,
    },

    /// The clauses do not form a valid formula.
    #[error(transparent)]
    Formula(#[from] FormulaError),
}

/// An internal consistency check of the search failed.
///
/// These indicate a bug in the engine, never a property of the input formula.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The graph was asked to record a value the assignment does not hold.
    #[error("variable {0} recorded in the implication graph without a matching assignment")]
    UnrecordedAssignment(Variable),

    /// A node was popped off the trail out of order.
    #[error("trail pop returned {found:?} while unassigning variable {expected}")]
    TrailMismatch {
        /// Variable being unassigned.
        expected: Variable,
        /// Variable actually on top of the trail.
        found: Option<Variable>,
    },

    /// An assigned variable on the trail carries no decision level.
    #[error("variable {0} is on the trail but has no decision level")]
    MissingLevel(Variable),

    /// A variable reached through the graph carries no value.
    #[error("variable {0} is referenced by the implication graph but has no value")]
    MissingValue(Variable),

    /// A node survived a backjump at a level it should have been unwound from.
    #[error("variable {variable} kept level {level} after backjumping to level {target}")]
    LevelSurvivedBackjump {
        /// The stale node.
        variable: Variable,
        /// Its recorded level.
        level: DecisionLevel,
        /// The backjump target.
        target: DecisionLevel,
    },

    /// Node state and assignment disagree after a backjump.
    #[error("variable {0} disagrees between the assignment and the implication graph")]
    GraphAssignmentMismatch(Variable),

    /// A conflict was signalled but no clause is falsified.
    #[error("conflict reported at level {0} but no clause is falsified")]
    NoFalsifiedClause(DecisionLevel),

    /// A conflict clause resolved on a decision variable.
    #[error("decision variable {0} cannot be the implied variable of a conflict")]
    DecisionInConflict(Variable),

    /// Resolution reached a current-level variable without antecedents while
    /// other current-level variables were still pending.
    #[error("variable {variable} has no antecedents but {pending} current-level literals remain")]
    MissingAntecedents {
        /// Variable without antecedents.
        variable: Variable,
        /// Number of unresolved current-level literals.
        pending: usize,
    },

    /// The trail was exhausted before a unique implication point was found.
    #[error("no unique implication point found at level {0}")]
    UipNotFound(DecisionLevel),

    /// The computed backjump target lies above the conflict level.
    #[error("backjump target {target} exceeds conflict level {conflict_level}")]
    BackjumpAboveConflict {
        /// Computed target.
        target: DecisionLevel,
        /// Level of the conflict.
        conflict_level: DecisionLevel,
    },
}

/// Errors surfaced by [`crate::sat::solver::Solver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The engine detected a broken internal invariant.
    #[error("internal invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}
