//! Deterministic result encoding
//!
//! Values are converted to a canonical JSON tree (object keys sorted) and
//! zlib-compressed. A zero-length byte sequence is reserved as the
//! "nothing available" answer; zlib output always carries a header, so no
//! encoded value can collide with it.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::{MockError, Result};

/// Reserved answer meaning "no data available"
pub const EMPTY_INSTANCE: Bytes = Bytes::from_static(&[]);

/// Whether `bytes` is the reserved empty answer
#[must_use]
pub fn is_empty_instance(bytes: &[u8]) -> bool {
    bytes.is_empty()
}

/// Per-field storage directive declared by a record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDirective {
    /// JSON field name
    pub field: &'static str,
    /// Store the field compressed
    pub compress: bool,
}

impl FieldDirective {
    /// Directive for a field stored compressed
    #[must_use]
    pub const fn compressed(field: &'static str) -> Self {
        Self {
            field,
            compress: true,
        }
    }
}

/// Result codec
#[derive(Debug, Clone, Copy)]
pub struct ResultCodec {
    level: Compression,
}

impl Default for ResultCodec {
    fn default() -> Self {
        Self {
            level: Compression::default(),
        }
    }
}

impl ResultCodec {
    /// Create a codec with the given zlib level (0-9)
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    /// Encode a value, or the empty sentinel when absent
    ///
    /// A value that cannot be represented as JSON is logged and answered
    /// with the sentinel.
    pub fn encode<T: Serialize + ?Sized>(&self, value: Option<&T>) -> Bytes {
        let Some(value) = value else {
            return EMPTY_INSTANCE;
        };

        match self.try_encode(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to encode result: {}", e);
                EMPTY_INSTANCE
            }
        }
    }

    fn try_encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        // Going through `Value` sorts object keys, so typed structs and
        // payloads loaded from storage encode identically.
        let canonical = serde_json::to_value(value)?;
        let json = serde_json::to_vec(&canonical)?;
        Ok(Bytes::from(self.compress(&json)?))
    }

    /// Decode bytes produced by [`ResultCodec::encode`]
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a compressed JSON document
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<Value>> {
        if is_empty_instance(bytes) {
            return Ok(None);
        }
        let json = decompress(bytes)?;
        Ok(Some(serde_json::from_slice(&json)?))
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), self.level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }

    /// Replace each named string field with base64 of its compressed bytes
    ///
    /// Returns the names of the fields that were packed.
    ///
    /// # Errors
    ///
    /// Returns error if compression fails
    pub fn pack_fields(&self, payload: &mut Value, directives: &[FieldDirective]) -> Result<Vec<String>> {
        let mut packed = Vec::new();
        let Some(object) = payload.as_object_mut() else {
            return Ok(packed);
        };

        for directive in directives.iter().filter(|d| d.compress) {
            if let Some(Value::String(text)) = object.get_mut(directive.field) {
                let compressed = self.compress(text.as_bytes())?;
                *text = BASE64.encode(compressed);
                packed.push(directive.field.to_string());
            }
        }

        Ok(packed)
    }

    /// Reverse [`ResultCodec::pack_fields`]
    ///
    /// # Errors
    ///
    /// Returns error if a packed field is not valid base64 zlib UTF-8
    pub fn unpack_fields(&self, payload: &mut Value, packed: &[String]) -> Result<()> {
        let Some(object) = payload.as_object_mut() else {
            return Ok(());
        };

        for field in packed {
            if let Some(Value::String(text)) = object.get_mut(field.as_str()) {
                let compressed = BASE64.decode(text.as_bytes()).map_err(|e| {
                    MockError::InvalidFormat(format!("Field '{field}' is not base64: {e}"))
                })?;
                let raw = decompress(&compressed)?;
                *text = String::from_utf8(raw).map_err(|e| {
                    MockError::InvalidFormat(format!("Field '{field}' is not UTF-8: {e}"))
                })?;
            }
        }

        Ok(())
    }
}

fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| MockError::InvalidFormat(format!("Invalid compressed data: {e}")))?;
    Ok(out)
}
