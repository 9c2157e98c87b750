//! Error types for path manipulation.

use thiserror::Error;

/// Errors produced by [`Path`](super::Path) operations.
#[non_exhaustive]
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// `sub_path` was called on a path with a single segment.
    #[error("Path '{path}' is a base path and has no sub path")]
    BasePath { path: String },

    /// The operation needs at least one segment.
    #[error("Path is empty")]
    Empty,
}

impl From<PathError> for crate::Error {
    fn from(err: PathError) -> Self {
        crate::Error::Path(err)
    }
}
