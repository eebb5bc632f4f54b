use thiserror::Error;

use crate::model::{Direction, EdgeId, NodeId};

/// Errors surfaced by graph and editor operations.
///
/// Every operation that returns one of these leaves the diagram unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Node '{0}' does not exist")]
    UnknownNode(NodeId),

    #[error("Edge '{0}' does not exist")]
    UnknownEdge(EdgeId),

    #[error("Node '{node}' has no {direction} port {index} (it has {count})")]
    PortOutOfRange {
        node: NodeId,
        direction: Direction,
        index: u32,
        count: u32,
    },

    #[error("Block type '{0}' is not in the catalog")]
    UnknownBlockType(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Structural ambiguity: {0}")]
    StructuralAmbiguity(String),
}

impl EditorError {
    /// True for every error that names something that is not there (the
    /// `InvalidReference` family).
    pub fn is_invalid_reference(&self) -> bool {
        !matches!(self, EditorError::StructuralAmbiguity(_))
    }
}

pub type EditorResult<T> = Result<T, EditorError>;
