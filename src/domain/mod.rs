//! Domain layer: expression tree model and structural edits
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod display;
pub mod entities;
pub mod error;
pub mod tree;

pub use display::TreeDisplay;
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use tree::{ExpressionTree, NodePath, TreeIterator, UnknownTargetPolicy};
