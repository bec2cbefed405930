#![deny(missing_docs)]
//! A conflict-driven clause-learning SAT solver with non-chronological backjumping.
//!
//! Formulas are built with [`sat::cnf::Cnf`] from typed literals, from
//! `(polarity, variable)` pairs, or from DIMACS text via [`sat::dimacs`], and
//! solved with [`sat::solver::solve`] or the [`sat::cdcl::Cdcl`] engine directly.

/// The `sat` module implements the formula model, the implication graph and the
/// clause-learning search.
pub mod sat;
