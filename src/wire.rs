//! Confluent wire-format framing
//!
//! A framed message is `[0x00][schema id: 4 bytes big-endian][payload]`.
//! Anything whose first byte is not the magic byte, or that is too short to
//! hold the preamble, is treated as an unframed foreign payload and passed
//! through untouched. That passthrough is designed behavior, not an error.

use crate::types::SchemaId;

/// Leading byte marking a framed message
pub const MAGIC_BYTE: u8 = 0x00;

/// Preamble size: magic byte plus big-endian schema id
pub const HEADER_LEN: usize = 5;

/// Result of [`unframe`]: the schema id when the preamble was present, and
/// the payload either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unframed<'a> {
    pub schema_id: Option<SchemaId>,
    pub payload: &'a [u8],
}

/// Prefix `payload` with the 5-byte preamble for `id`.
pub fn frame(id: SchemaId, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(HEADER_LEN + payload.len());
    framed.push(MAGIC_BYTE);
    framed.extend_from_slice(&id.0.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Strip the preamble if present; otherwise return the input as the payload.
pub fn unframe(raw: &[u8]) -> Unframed<'_> {
    if raw.len() >= HEADER_LEN && raw[0] == MAGIC_BYTE {
        let id = u32::from_be_bytes([raw[1], raw[2], raw[3], raw[4]]);
        Unframed {
            schema_id: Some(SchemaId::new(id)),
            payload: &raw[HEADER_LEN..],
        }
    } else {
        Unframed {
            schema_id: None,
            payload: raw,
        }
    }
}
