//! Error types for value ↔ node conversion.

use std::fmt;

use thiserror::Error;

use crate::mapper::MappingError;

/// Boxed cause attached to a failed conversion.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync>;

/// Structured error types for converter lookup and conversion.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The registry chain has no converter for the type.
    #[error("No converter found for type {type_name}")]
    NoConverterFound { type_name: String },

    /// Several supertypes match at the same distance; the registry is
    /// misconfigured.
    #[error(
        "Ambiguous converters for type {type_name}: {candidates:?} all match at distance {distance}"
    )]
    AmbiguousConverter {
        type_name: String,
        candidates: Vec<String>,
        distance: u32,
    },

    /// A converter rejected a value or node.
    #[error("Conversion failed in '{converter}' for {offending}: {message}")]
    ConversionFailed {
        converter: String,
        offending: String,
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// A converter returned a value of a different type than requested.
    #[error("Converter '{converter}' produced a value that is not a {expected}")]
    TypeMismatch { converter: String, expected: String },

    /// A section nested inside a collection failed to map.
    #[error("Nested section failed to map: {0}")]
    Section(#[source] Box<MappingError>),
}

impl ConvertError {
    /// Builds a [`ConvertError::ConversionFailed`] without a cause.
    pub fn conversion(
        converter: impl Into<String>,
        offending: impl fmt::Display,
        message: impl Into<String>,
    ) -> Self {
        ConvertError::ConversionFailed {
            converter: converter.into(),
            offending: offending.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches a cause to a [`ConvertError::ConversionFailed`]; other variants
    /// are returned unchanged.
    pub fn with_source(self, cause: impl Into<BoxedCause>) -> Self {
        match self {
            ConvertError::ConversionFailed {
                converter,
                offending,
                message,
                ..
            } => ConvertError::ConversionFailed {
                converter,
                offending,
                message,
                source: Some(cause.into()),
            },
            other => other,
        }
    }

    /// Check if this error is a rejected value rather than a lookup failure.
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            ConvertError::ConversionFailed { .. } | ConvertError::TypeMismatch { .. }
        )
    }

    /// Check if this error is bad data rather than a missing or ambiguous
    /// converter or a broken section description. Only recoverable errors
    /// are skipped in best-effort mapping.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ConvertError::ConversionFailed { .. } | ConvertError::TypeMismatch { .. } => true,
            ConvertError::Section(inner) => inner.is_recoverable(),
            ConvertError::NoConverterFound { .. } | ConvertError::AmbiguousConverter { .. } => {
                false
            }
        }
    }

    /// Check if the registry chain had no converter.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvertError::NoConverterFound { .. })
    }

    /// Check if this error points at a misconfigured registry.
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, ConvertError::AmbiguousConverter { .. })
    }

    /// Get the converter name if a specific converter failed.
    pub fn converter(&self) -> Option<&str> {
        match self {
            ConvertError::ConversionFailed { converter, .. }
            | ConvertError::TypeMismatch { converter, .. } => Some(converter),
            _ => None,
        }
    }
}

impl From<ConvertError> for crate::Error {
    fn from(err: ConvertError) -> Self {
        crate::Error::Convert(err)
    }
}
