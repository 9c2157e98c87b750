//! JSON codec for cfgtree.
//!
//! Trees are written as plain JSON objects. Comments and inherited flags have
//! no JSON form and are dropped; everything else survives a load/save cycle
//! as long as sections read their scalars through the built-in converters.
//!
//! Loaded maps compare keys with the codec's [`KeyPolicy`]; use the policy of
//! the registry the tree will be mapped with.

use std::io::{Read, Write};

use cfgtree::{
    Codec, MapNode,
    codec::{CodecError, read_non_empty},
    node::KeyPolicy,
};
use tracing::debug;

const FORMAT: &str = "json";

/// Reads and writes trees as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    pretty: bool,
    policy: KeyPolicy,
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indents saved documents with two spaces.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            ..Self::default()
        }
    }

    /// Key policy of loaded maps.
    pub fn with_policy(mut self, policy: KeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }
}

fn codec_error(err: serde_json::Error) -> CodecError {
    if err.is_io() {
        CodecError::Io(err.into())
    } else {
        CodecError::format(FORMAT, err)
    }
}

impl Codec for JsonCodec {
    fn extension(&self) -> &str {
        FORMAT
    }

    fn load(&self, input: &mut dyn Read) -> Result<MapNode, CodecError> {
        let Some(bytes) = read_non_empty(input)? else {
            debug!("Empty JSON input, loading an empty tree");
            return Ok(MapNode::with_policy(self.policy));
        };
        let mut deserializer = serde_json::Deserializer::from_slice(&bytes);
        let map = MapNode::deserialize_with(&mut deserializer, self.policy).map_err(codec_error)?;
        deserializer.end().map_err(codec_error)?;
        Ok(map)
    }

    fn save(&self, map: &MapNode, output: &mut dyn Write) -> Result<(), CodecError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut *output, map).map_err(codec_error)?;
        } else {
            serde_json::to_writer(&mut *output, map).map_err(codec_error)?;
        }
        output.write_all(b"\n")?;
        Ok(())
    }
}
