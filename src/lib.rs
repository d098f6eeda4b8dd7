//! Confluent-compatible Schema Registry client with wire-format framing
//!
//! Event-streaming producers and consumers use this crate to agree on wire
//! formats without coupling to one serialization technology:
//!
//! - **Wire codec** ([`wire`]): the 5-byte `[0x00][schema id BE]` preamble
//!   prefixed to every encoded payload; unframed payloads pass through.
//! - **Registry client** ([`RegistryClient`]): typed facade over the
//!   registry's REST surface (lookup, registration, versions, deletion,
//!   compatibility testing, config) with one canonical error type.
//! - **Memoizing cache** ([`cache::MemoCache`], [`CachedRegistry`]): repeated
//!   resolution calls are served from memory; failures are never cached.
//! - **Resolution facade** ([`SchemaRegistry`]): ensures a schema is
//!   registered, dispatches to caller-supplied per-format codecs, and frames
//!   the result.
//!
//! Serialization itself is pluggable: register a [`CodecFactory`] per
//! [`SchemaType`]. A schema-less JSON codec is bundled; Avro and Protobuf
//! codecs are supplied by the caller.
//!
//! # Example
//!
//! ```rust,ignore
//! use schemawire::{json_factory, RegistryConfig, SchemaRegistry, SchemaType};
//!
//! let registry = SchemaRegistry::new(&RegistryConfig::new("http://localhost:8081"))?
//!     .with_codec(SchemaType::Json, json_factory());
//!
//! let subject = "orders-value".into();
//! let schema = r#"{"type":"object"}"#;
//! let framed = registry
//!     .encode(&subject, &serde_json::json!({"id": 1}), SchemaType::Json, Some(schema), &[])
//!     .await?;
//!
//! // Consumers only need the bytes; the schema id travels in the preamble.
//! let decoded = registry.decode(&framed).await?;
//! ```

pub mod cache;
pub mod cached;
pub mod client;
pub mod codec;
pub mod error;
pub mod registry;
pub mod types;
pub mod wire;

pub use cached::CachedRegistry;
pub use client::{CheckOutcome, RegisterOutcome, RegistryClient, SchemaById};
pub use codec::{json_factory, CodecFactory, FormatCodec, JsonCodec};
pub use error::{Error, Result};
pub use registry::{Decoded, DecodedWithSubjects, ResolvedSchema, SchemaRegistry};
pub use types::{
    CompatibilityLevel, RegisteredSchema, RegistryConfig, SchemaId, SchemaReference, SchemaType,
    SchemaVersion, Subject, SubjectVersionPair, UnregisteredSchema,
};
