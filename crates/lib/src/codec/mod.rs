//! The boundary to external formats.
//!
//! A [`Codec`] renders a [`MapNode`] tree to bytes and parses it back. Formats
//! live outside this crate; they only need to preserve the scalar text forms
//! produced by the built-in converters.

use std::io::{Read, Write};

use crate::node::MapNode;

pub mod errors;

pub use errors::CodecError;

/// A format-specific serializer between a tree and a byte stream.
pub trait Codec {
    /// Canonical file suffix of the format, without the dot.
    fn extension(&self) -> &str;

    /// Parses a tree. Empty input (nothing but whitespace) yields an empty map.
    fn load(&self, input: &mut dyn Read) -> Result<MapNode, CodecError>;

    fn save(&self, map: &MapNode, output: &mut dyn Write) -> Result<(), CodecError>;

    /// Like [`Codec::load`], treating absent input as an empty map.
    fn load_optional(&self, input: Option<&mut dyn Read>) -> Result<MapNode, CodecError> {
        match input {
            Some(input) => self.load(input),
            None => Ok(MapNode::new()),
        }
    }
}

/// Reads all of `input`, returning `None` when it holds only whitespace.
///
/// Helper for codecs that parse from a complete buffer.
pub fn read_non_empty(input: &mut dyn Read) -> Result<Option<Vec<u8>>, CodecError> {
    let mut buffer = Vec::new();
    input.read_to_end(&mut buffer)?;
    if buffer.iter().all(u8::is_ascii_whitespace) {
        Ok(None)
    } else {
        Ok(Some(buffer))
    }
}
