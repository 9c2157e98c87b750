//!
//! cfgtree: bidirectional mapping between configuration structs and typed node trees.
//! This library provides the building blocks for loading, documenting and saving structured configuration.
//!
//! ## Core Concepts
//!
//! * **Paths (`path::Path`)**: Ordered segment sequences addressing a node, rendered with a configurable delimiter.
//! * **Nodes (`node::Node`)**: The typed tree. A node is a scalar, a list, a map, a null or an error placeholder, and may carry comment lines and an `inherited` flag.
//!     * **MapNode (`node::MapNode`)**: Keyed container with policy-driven key normalization; nulls are tombstones.
//!     * **ListNode (`node::ListNode`)**: Ordered, 0-indexed container.
//! * **Converters (`convert::ConverterRegistry`)**: A frozen registry of value ↔ node converters with exact, ancestor-ranked and fallback lookup.
//! * **Sections (`mapper::Section`)**: Structs describing their persisted fields, mapped to and from map nodes by the `mapper::StructuralMapper`.
//! * **Codecs (`codec::Codec`)**: The contract formats implement to turn a tree into bytes and back.
//!
//! Data flows as: bytes → `Codec::load` → `MapNode` → `StructuralMapper::fill` → section, and back through
//! `StructuralMapper::convert` and `Codec::save`.

pub mod codec;
pub mod convert;
pub mod mapper;
pub mod node;
pub mod path;

pub use codec::Codec;
pub use convert::{Convert, ConverterRegistry};
pub use mapper::{Section, StructuralMapper};
pub use node::{Container, MapNode, Node};
pub use path::Path;

/// Result type used throughout the cfgtree library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the cfgtree library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Structured path errors from the path module
    #[error(transparent)]
    Path(path::PathError),

    /// Structured tree errors from the node module
    #[error(transparent)]
    Node(node::NodeError),

    /// Structured conversion errors from the convert module
    #[error(transparent)]
    Convert(convert::ConvertError),

    /// Structured mapping errors from the mapper module
    #[error(transparent)]
    Mapping(mapper::MappingError),

    /// Structured codec errors from the codec module
    #[error(transparent)]
    Codec(codec::CodecError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Path(_) => "path",
            Error::Node(_) => "node",
            Error::Convert(_) => "convert",
            Error::Mapping(_) => "mapper",
            Error::Codec(_) => "codec",
            Error::Io(_) => "io",
        }
    }

    /// Check if this error means no converter could be found for a type.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Convert(convert_err) => convert_err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is a value that failed to convert.
    pub fn is_conversion_error(&self) -> bool {
        match self {
            Error::Convert(convert_err) => convert_err.is_conversion_error(),
            Error::Mapping(mapping_err) => mapping_err.is_conversion_error(),
            _ => false,
        }
    }

    /// Check if this error is a defect in how sections or registries are
    /// set up, rather than in the data.
    pub fn is_structural_error(&self) -> bool {
        match self {
            Error::Convert(convert_err) => convert_err.is_configuration_error(),
            Error::Mapping(mapping_err) => mapping_err.is_structural(),
            _ => false,
        }
    }

    /// Check if this error is a path traversal through a non-container.
    pub fn is_invalid_path(&self) -> bool {
        match self {
            Error::Node(node_err) => node_err.is_invalid_path(),
            Error::Mapping(mapper::MappingError::Node(node_err)) => node_err.is_invalid_path(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Codec(codec_err) => codec_err.is_io_error(),
            _ => false,
        }
    }

    /// Check if this error is a malformed external document.
    pub fn is_format_error(&self) -> bool {
        match self {
            Error::Codec(codec_err) => codec_err.is_format_error(),
            _ => false,
        }
    }
}
