//! Error types for codecs.

use thiserror::Error;

use crate::convert::errors::BoxedCause;

/// Errors raised while rendering or parsing a tree.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// Reading or writing the underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input is not valid for the format, or the tree cannot be
    /// expressed in it.
    #[error("Invalid {format} document: {source}")]
    Format {
        format: String,
        #[source]
        source: BoxedCause,
    },
}

impl CodecError {
    /// Builds a [`CodecError::Format`] for `format` from any error or message.
    pub fn format(format: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        CodecError::Format {
            format: format.into(),
            source: cause.into(),
        }
    }

    pub fn is_io_error(&self) -> bool {
        matches!(self, CodecError::Io(_))
    }

    pub fn is_format_error(&self) -> bool {
        matches!(self, CodecError::Format { .. })
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}
