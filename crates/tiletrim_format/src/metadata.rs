//! Metadata document codec.
//!
//! The metadata block is a JSON document stored with the archive's
//! internal compression.

use crate::compression::{compress, decompress};
use crate::error::FormatResult;
use crate::header::Compression;

/// Decodes the metadata block into a JSON document.
///
/// An absent block decodes as an empty document.
///
/// # Errors
///
/// Fails if the block cannot be decompressed or is not valid JSON.
pub fn decode_metadata(bytes: &[u8], compression: Compression) -> FormatResult<serde_json::Value> {
    let raw = decompress(bytes, compression)?;
    if raw.is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }
    Ok(serde_json::from_slice(&raw)?)
}

/// Encodes a JSON document into a metadata block.
///
/// # Errors
///
/// Fails if the internal compression cannot be produced.
pub fn encode_metadata(
    document: &serde_json::Value,
    compression: Compression,
) -> FormatResult<Vec<u8>> {
    let raw = serde_json::to_vec(document)?;
    compress(&raw, compression)
}
