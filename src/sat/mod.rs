#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
pub mod assignment;
pub mod backjump;
pub mod cdcl;
pub mod clause;
pub mod cnf;
pub mod conflict_analysis;
pub mod dimacs;
pub mod error;
pub mod implication_graph;
pub mod literal;
pub mod propagation;
pub mod solver;
pub mod trail;
