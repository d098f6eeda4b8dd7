//! Pluggable per-format encode/decode
//!
//! The crate implements no serialization format itself. Callers register a
//! [`CodecFactory`] per [`SchemaType`]; the factory receives the serialized
//! schema text and builds a [`FormatCodec`] for one encode or decode
//! operation. Factories are invoked fresh every time a codec is needed;
//! expensive schema parsing should be memoized inside the factory.
//!
//! A JSON codec ships as a convenience since it needs nothing beyond
//! `serde_json`.

use std::sync::Arc;

use crate::error::{Error, Result};

/// One serialization format's encode/decode capability, built for a specific
/// schema.
pub trait FormatCodec: Send + Sync {
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value>;
}

/// Builds a [`FormatCodec`] from serialized schema text.
pub type CodecFactory = Arc<dyn Fn(&str) -> Result<Box<dyn FormatCodec>> + Send + Sync>;

/// Schema-less JSON codec: values are serialized as-is. The schema text is
/// carried by the registry for compatibility checking but not enforced here.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl FormatCodec for JsonCodec {
    fn encode(&self, value: &serde_json::Value) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| Error::Codec(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<serde_json::Value> {
        serde_json::from_slice(bytes).map_err(|e| Error::Codec(e.to_string()))
    }
}

/// Factory producing [`JsonCodec`] regardless of schema text.
pub fn json_factory() -> CodecFactory {
    Arc::new(|_schema| Ok(Box::new(JsonCodec)))
}
