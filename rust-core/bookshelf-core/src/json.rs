//! # JSON Serialization Module
//!
//! Request bodies are parsed with simd-json; responses and stored documents
//! are written with `serde_json`.

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse JSON bytes to a typed value using simd-json
///
/// simd-json parses in place, so the buffer is clobbered.
///
/// # Errors
///
/// Returns the simd-json error if `bytes` is not valid JSON for `T`.
pub fn parse_json_bytes<T: DeserializeOwned>(
    bytes: &mut [u8],
) -> std::result::Result<T, simd_json::Error> {
    simd_json::from_slice(bytes)
}

/// Serialize a value to a JSON string
///
/// # Errors
///
/// Returns `Error::Json` if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
