//! Error types for tree operations

use crate::tree::NodeId;
use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {node} is not a child of {parent}")]
    NotAChild { parent: NodeId, node: NodeId },

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} is not text")]
    NotText(NodeId),

    #[error("Moving {0} would create a cycle")]
    CycleDetected(NodeId),

    #[error("Node {0} has no parent")]
    Detached(NodeId),

    #[error("Offset {offset} out of bounds for text of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
}
