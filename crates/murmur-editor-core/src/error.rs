use crate::types::NodeId;

/// Errors from structural document operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentError {
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    #[error("node {0} is not attached to the document")]
    Detached(NodeId),

    #[error("offset {offset} out of bounds for node {node} (len {len})")]
    OffsetOutOfBounds {
        node: NodeId,
        offset: usize,
        len: usize,
    },

    #[error("node {node} is not {expected}")]
    WrongNodeKind {
        node: NodeId,
        expected: &'static str,
    },

    #[error("cannot move node {0} inside its own subtree")]
    Cycle(NodeId),
}
