//! Error types for section mapping.

use thiserror::Error;

use crate::{convert::ConvertError, node::NodeError, path::Path};

/// Structured error types for the structural mapper.
///
/// `DuplicatedPath` and `FieldAccess` report defects in a section's
/// description and always abort, even when raised by a section nested in a
/// collection. `Conversion` reports a field that could not be converted; for
/// bad data it is only raised in fail-fast mode.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MappingError {
    /// Two fields of one section resolve to the same normalized path.
    #[error("Fields '{first}' and '{second}' of {section} both map to '{path}'")]
    DuplicatedPath {
        section: String,
        path: Path,
        first: String,
        second: String,
    },

    /// A field could not be read or assigned.
    #[error("Cannot access field '{field}' of {section} at '{path}': {reason}")]
    FieldAccess {
        path: Path,
        section: String,
        field: String,
        reason: String,
    },

    /// A field value failed to convert.
    #[error("Conversion failed at '{path}': {source}")]
    Conversion {
        path: Path,
        #[source]
        source: ConvertError,
    },

    /// Field paths of a section conflict inside the produced tree.
    #[error(transparent)]
    Node(#[from] NodeError),
}

impl MappingError {
    /// Check if this error is a defect in a section description.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            MappingError::DuplicatedPath { .. }
                | MappingError::FieldAccess { .. }
                | MappingError::Node(_)
        )
    }

    pub fn is_duplicated_path(&self) -> bool {
        matches!(self, MappingError::DuplicatedPath { .. })
    }

    /// Check if best-effort mapping may skip past this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MappingError::Conversion { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    pub fn is_conversion_error(&self) -> bool {
        matches!(self, MappingError::Conversion { .. })
    }

    /// Get the path the error occurred at, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            MappingError::DuplicatedPath { path, .. }
            | MappingError::FieldAccess { path, .. }
            | MappingError::Conversion { path, .. } => Some(path),
            MappingError::Node(_) => None,
        }
    }

    /// Re-roots the error's path below `prefix`; used when a nested section
    /// fails.
    pub(crate) fn under(self, prefix: &Path) -> Self {
        match self {
            MappingError::DuplicatedPath {
                section,
                path,
                first,
                second,
            } => MappingError::DuplicatedPath {
                section,
                path: prefix.clone().join(&path),
                first,
                second,
            },
            MappingError::FieldAccess {
                path,
                section,
                field,
                reason,
            } => MappingError::FieldAccess {
                path: prefix.clone().join(&path),
                section,
                field,
                reason,
            },
            MappingError::Conversion { path, source } => MappingError::Conversion {
                path: prefix.clone().join(&path),
                source,
            },
            other => other,
        }
    }
}

impl From<MappingError> for crate::Error {
    fn from(err: MappingError) -> Self {
        crate::Error::Mapping(err)
    }
}
