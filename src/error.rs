//! Error types for registry calls and wire-format handling

use thiserror::Error;

use crate::types::SchemaType;

/// Confluent error codes that all mean "not found" for some sub-resource
pub mod error_codes {
    pub const NOT_FOUND: u32 = 404;
    pub const SUBJECT_NOT_FOUND: u32 = 40401;
    pub const SCHEMA_NOT_FOUND: u32 = 40403;
}

/// Canonicalize the registry's several "not found" codes to plain 404
pub(crate) fn canonicalize_code(code: u32) -> u32 {
    match code {
        error_codes::NOT_FOUND | error_codes::SUBJECT_NOT_FOUND | error_codes::SCHEMA_NOT_FOUND => {
            error_codes::NOT_FOUND
        }
        other => other,
    }
}

/// Errors surfaced by this crate.
///
/// Transport failures stay distinct from registry responses: a connection
/// refused is `Transport`, a well-formed `{error_code, message}` body is
/// `Registry`. Nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// Non-2xx response with a parseable `{error_code, message}` body.
    /// "Not found" variants (404, 40401, 40403) carry `code == 404`.
    #[error("registry error {code}: {message}")]
    Registry { code: u32, message: String },

    /// Network-level failure, propagated untouched
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response with an empty body; cannot be classified further
    #[error("registry returned status {status} with an empty body")]
    EmptyResponse { status: u16 },

    /// Non-2xx response whose body is not valid JSON
    #[error("registry returned status {status} with a malformed body")]
    MalformedBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// No codec factory registered for a format tag
    #[error("no codec registered for format {0}")]
    MissingCodec(SchemaType),

    /// Caller's declared format differs from the registry's recorded one
    #[error("format mismatch: requested {requested}, registry has {registered}")]
    FormatMismatch {
        requested: SchemaType,
        registered: SchemaType,
    },

    /// Failure bubbled out of a caller-supplied codec
    #[error("codec error: {0}")]
    Codec(String),

    /// Unusable client configuration, raised before any request is made
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid schema type: {0}")]
    InvalidSchemaType(String),

    #[error("invalid compatibility level: {0}")]
    InvalidCompatibilityLevel(String),
}

impl Error {
    /// Build a `Registry` error from a raw body code, canonicalizing the
    /// "not found" variants.
    pub(crate) fn registry(code: u32, message: impl Into<String>) -> Self {
        Error::Registry {
            code: canonicalize_code(code),
            message: message.into(),
        }
    }

    /// True for the single locally-recoverable case: the registry does not
    /// know the schema or subject.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Registry {
                code: error_codes::NOT_FOUND,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
