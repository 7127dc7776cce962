//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::NodeId;

/// Domain errors describe why a structural edit cannot be applied.
///
/// None of these are fatal: the store turns them into a rejected edit and
/// keeps the previous snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("node not found: {0}")]
    UnknownNode(NodeId),

    #[error("node is not an operator: {0}")]
    NotAnOperator(NodeId),

    #[error("cannot move {0} onto itself")]
    SelfMove(NodeId),

    #[error("cannot move {dragged} into its own descendant {target}")]
    CycleDetected { dragged: NodeId, target: NodeId },

    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("no top-level operator left to receive {0}")]
    NoFallbackTarget(NodeId),
}

/// Result type for tree operations.
pub type DomainResult<T> = Result<T, DomainError>;
