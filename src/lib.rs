//! Boolean filter expression trees.
//!
//! An expression is a forest of AND/OR operator nodes over criteria leaves.
//! [`application::ExpressionStore`] owns the current snapshot, applies
//! structural edits (add, remove, move, operator change) without ever breaking
//! id uniqueness or acyclicity, and hands every resulting snapshot to its
//! subscribers.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod util;
