//! Error types for node tree operations.
//!
//! Every variant that refers to a location carries the path rebuilt from the
//! offending node's parent link, so diagnostics point at the exact spot in the
//! tree even when the failure happens deep inside a recursive descent.

use thiserror::Error;

/// Structured error types for node tree operations.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NodeError {
    /// A path tried to descend through a node that is not a container.
    #[error("Invalid path: '{path}' is a {kind} node and cannot contain children")]
    InvalidPath { path: String, kind: &'static str },

    /// A list segment was not a valid index.
    #[error("Invalid list index '{segment}' at '{path}'")]
    InvalidIndex { path: String, segment: String },

    /// A list index was past the end of the list.
    #[error("List index {index} out of bounds at '{path}' (len {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// A key collided with an existing key after normalization.
    #[error("Duplicate key '{key}' at '{path}' (already present as '{existing}')")]
    DuplicateKey {
        path: String,
        key: String,
        existing: String,
    },

    /// The operation needs a non-empty path.
    #[error("Empty path is not allowed for {operation}")]
    EmptyPath { operation: &'static str },

    /// `as_text` was called on a node that has no scalar text form.
    #[error("A {kind} node has no text form")]
    NoTextForm { kind: &'static str },

    /// The node is not attached below the container it was resolved against.
    #[error("Node is not a sub node of '{container}'")]
    NotASubNode { container: String },
}

impl NodeError {
    /// Check if this error was caused by traversing through a non-container.
    pub fn is_invalid_path(&self) -> bool {
        matches!(self, NodeError::InvalidPath { .. })
    }

    /// Check if this error is a normalized key collision.
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, NodeError::DuplicateKey { .. })
    }

    /// Check if this error concerns list indexing.
    pub fn is_index_error(&self) -> bool {
        matches!(
            self,
            NodeError::InvalidIndex { .. } | NodeError::IndexOutOfBounds { .. }
        )
    }

    /// Get the tree location if this error is tied to one.
    pub fn path(&self) -> Option<&str> {
        match self {
            NodeError::InvalidPath { path, .. }
            | NodeError::InvalidIndex { path, .. }
            | NodeError::IndexOutOfBounds { path, .. }
            | NodeError::DuplicateKey { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<NodeError> for crate::Error {
    fn from(err: NodeError) -> Self {
        crate::Error::Node(err)
    }
}
