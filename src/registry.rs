//! High-level resolution and framing facade
//!
//! [`SchemaRegistry`] sits on top of the cached client and drives the full
//! producer/consumer workflow: resolve or register the schema for a subject,
//! build the right [`FormatCodec`], and frame or unframe the payload.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemawire::{RegistryConfig, SchemaRegistry, SchemaType, json_factory};
//!
//! let registry = SchemaRegistry::new(&RegistryConfig::new("http://localhost:8081"))?
//!     .with_codec(SchemaType::Json, json_factory());
//!
//! let framed = registry
//!     .encode(&"orders-value".into(), &value, SchemaType::Json, Some(schema), &[])
//!     .await?;
//! let decoded = registry.decode(&framed).await?;
//! ```

use std::collections::HashMap;

use bytes::Bytes;

use crate::cached::CachedRegistry;
use crate::codec::{CodecFactory, FormatCodec};
use crate::error::{Error, Result};
use crate::types::{
    RegistryConfig, SchemaId, SchemaReference, SchemaType, Subject, SubjectVersionPair,
    UnregisteredSchema,
};
use crate::wire;

/// A schema resolved for encoding: known to the registry under `id`, with
/// the serialized text and format tag to build a codec from.
///
/// When the registry's check/register response omits the echoed schema or
/// type, both are backfilled from the request, a compatibility shim for
/// registries that only return the id.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub id: SchemaId,
    pub schema: String,
    pub schema_type: SchemaType,
}

/// Result of [`SchemaRegistry::decode`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The message carried the wire-format preamble and was decoded with the
    /// schema it names.
    Message(serde_json::Value),
    /// No preamble: foreign or pre-registry payload, passed through
    /// untouched. Not an error.
    Unframed(Bytes),
}

impl Decoded {
    pub fn message(&self) -> Option<&serde_json::Value> {
        match self {
            Decoded::Message(value) => Some(value),
            Decoded::Unframed(_) => None,
        }
    }

    pub fn into_message(self) -> Option<serde_json::Value> {
        match self {
            Decoded::Message(value) => Some(value),
            Decoded::Unframed(_) => None,
        }
    }
}

/// [`Decoded`] plus every (subject, version) the schema id is registered
/// under; `subjects` is `None` for unframed payloads.
#[derive(Debug, Clone)]
pub struct DecodedWithSubjects {
    pub decoded: Decoded,
    pub subjects: Option<Vec<SubjectVersionPair>>,
}

/// Schema resolution, registration, and wire-format framing in one facade.
pub struct SchemaRegistry {
    registry: CachedRegistry,
    codecs: HashMap<SchemaType, CodecFactory>,
}

impl SchemaRegistry {
    pub fn new(config: &RegistryConfig) -> Result<Self> {
        Ok(Self::with_registry(CachedRegistry::new(config)?))
    }

    pub fn with_registry(registry: CachedRegistry) -> Self {
        Self {
            registry,
            codecs: HashMap::new(),
        }
    }

    /// Register a codec factory for a format tag. Chainable; registering a
    /// tag twice overwrites the earlier factory.
    pub fn with_codec(mut self, schema_type: SchemaType, factory: CodecFactory) -> Self {
        self.codecs.insert(schema_type, factory);
        self
    }

    /// The cached client, for registry operations outside the encode/decode
    /// workflow (compatibility testing, config, listings).
    pub fn registry(&self) -> &CachedRegistry {
        &self.registry
    }

    /// Drop all memoized registry results.
    pub fn clear_cache(&self) {
        self.registry.clear_cache();
    }

    /// Resolve the schema to encode with, registering it when the registry
    /// does not know it yet.
    ///
    /// With `schema` supplied: look the schema up by content first; on a 404
    /// register it. Check-then-register avoids creating duplicate versions
    /// for an already-registered schema, at the cost of a benign race: two
    /// concurrent callers may both register, and the registry's idempotent
    /// registration resolves it. Any non-404 check failure propagates.
    ///
    /// With `schema` omitted: use the subject's latest registered version;
    /// every failure, including not-found, propagates. No internal retries
    /// either way.
    pub async fn ensure_registered(
        &self,
        subject: &Subject,
        schema_type: SchemaType,
        schema: Option<&str>,
        references: &[SchemaReference],
    ) -> Result<ResolvedSchema> {
        let Some(text) = schema else {
            let latest = self.registry.latest_version(subject).await?;
            return Ok(ResolvedSchema {
                id: latest.id,
                schema: latest.schema,
                schema_type: latest.schema_type,
            });
        };

        let candidate =
            UnregisteredSchema::new(text, schema_type).with_references(references.to_vec());
        match self.registry.check(subject, &candidate).await {
            Ok(found) => Ok(ResolvedSchema {
                id: found.id,
                schema: found.schema.unwrap_or_else(|| text.to_string()),
                schema_type: found.schema_type.unwrap_or(schema_type),
            }),
            Err(err) if err.is_not_found() => {
                let outcome = self.registry.register(subject, &candidate).await?;
                tracing::debug!(%subject, schema_id = %outcome.id, "schema was unknown, registered it");
                Ok(ResolvedSchema {
                    id: outcome.id,
                    schema: outcome.schema.unwrap_or_else(|| text.to_string()),
                    schema_type: outcome.schema_type.unwrap_or(schema_type),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Encode `value` with the schema already registered under `id` and
    /// frame the result.
    pub async fn encode_for_id(
        &self,
        id: SchemaId,
        value: &serde_json::Value,
        schema_type: SchemaType,
    ) -> Result<Vec<u8>> {
        let fetched = self.registry.schema_by_id(id).await?;
        let factory = self.factory_for(schema_type)?;
        if fetched.schema_type != schema_type {
            return Err(Error::FormatMismatch {
                requested: schema_type,
                registered: fetched.schema_type,
            });
        }
        let codec = factory(&fetched.schema)?;
        let payload = codec.encode(value)?;
        Ok(wire::frame(id, &payload))
    }

    /// Resolve (or register) the subject's schema, encode `value` with it,
    /// and frame the result. Fails before any network call when no codec is
    /// registered for `schema_type`.
    pub async fn encode(
        &self,
        subject: &Subject,
        value: &serde_json::Value,
        schema_type: SchemaType,
        schema: Option<&str>,
        references: &[SchemaReference],
    ) -> Result<Vec<u8>> {
        let factory = self.factory_for(schema_type)?;
        let resolved = self
            .ensure_registered(subject, schema_type, schema, references)
            .await?;
        if resolved.schema_type != schema_type {
            return Err(Error::FormatMismatch {
                requested: schema_type,
                registered: resolved.schema_type,
            });
        }
        let codec = factory(&resolved.schema)?;
        let payload = codec.encode(value)?;
        Ok(wire::frame(resolved.id, &payload))
    }

    /// Unframe and decode a message. Payloads without the wire-format
    /// preamble come back as [`Decoded::Unframed`], byte-for-byte unchanged.
    pub async fn decode(&self, raw: &[u8]) -> Result<Decoded> {
        let unframed = wire::unframe(raw);
        let Some(id) = unframed.schema_id else {
            return Ok(Decoded::Unframed(Bytes::copy_from_slice(raw)));
        };
        let fetched = self.registry.schema_by_id(id).await?;
        let codec = self.codec_for(fetched.schema_type, &fetched.schema)?;
        Ok(Decoded::Message(codec.decode(unframed.payload)?))
    }

    /// [`Self::decode`], additionally listing every (subject, version) the
    /// resolved schema id is registered under.
    pub async fn decode_with_subjects(&self, raw: &[u8]) -> Result<DecodedWithSubjects> {
        let unframed = wire::unframe(raw);
        let Some(id) = unframed.schema_id else {
            return Ok(DecodedWithSubjects {
                decoded: Decoded::Unframed(Bytes::copy_from_slice(raw)),
                subjects: None,
            });
        };
        let fetched = self.registry.schema_by_id(id).await?;
        let codec = self.codec_for(fetched.schema_type, &fetched.schema)?;
        let decoded = Decoded::Message(codec.decode(unframed.payload)?);
        let subjects = self.registry.versions_for_id(id).await?;
        Ok(DecodedWithSubjects {
            decoded,
            subjects: Some(subjects),
        })
    }

    fn factory_for(&self, schema_type: SchemaType) -> Result<&CodecFactory> {
        self.codecs
            .get(&schema_type)
            .ok_or(Error::MissingCodec(schema_type))
    }

    fn codec_for(&self, schema_type: SchemaType, schema: &str) -> Result<Box<dyn FormatCodec>> {
        self.factory_for(schema_type)?(schema)
    }
}
