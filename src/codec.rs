//! Value codec
//!
//! Keys are stored as the UTF-8 bytes of their string form. Values are
//! stored as a one-byte format tag followed by their bincode encoding
//! (fixed-width little-endian integers, trailing bytes rejected).
//!
//! bincode is not self-describing: a type is read back with the layout it
//! was written with. Value types must not depend on `deserialize_any`
//! (untagged enums, `serde_json::Value` and the like); [`Value`](crate::Value)
//! is safe.

use std::fmt::Display;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CabinetError, Result};

/// Leading byte of every encoded value
const FORMAT_V1: u8 = 0x01;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .reject_trailing_bytes()
}

/// Encode a value for storage
pub fn serialize<V: Serialize + ?Sized>(value: &V) -> Result<Vec<u8>> {
    let mut bytes = vec![FORMAT_V1];
    options()
        .serialize_into(&mut bytes, value)
        .map_err(|e| CabinetError::Serialization(e.to_string()))?;
    Ok(bytes)
}

/// Decode stored bytes
pub fn deserialize<V: DeserializeOwned>(bytes: &[u8]) -> Result<V> {
    match bytes.split_first() {
        Some((&FORMAT_V1, body)) => options()
            .deserialize(body)
            .map_err(|e| CabinetError::Deserialization(e.to_string())),
        Some((tag, _)) => Err(CabinetError::Deserialization(format!(
            "unknown value format tag {:#04x}",
            tag
        ))),
        None => Err(CabinetError::Deserialization("empty value".to_string())),
    }
}

/// Decode a lookup result; absence stays absence
pub(crate) fn from_bytes_or_null<V: DeserializeOwned>(bytes: Option<&[u8]>) -> Result<Option<V>> {
    bytes.map(deserialize).transpose()
}

/// The canonical string form of a key
pub fn normalize_key<K: Display + ?Sized>(key: &K) -> String {
    key.to_string()
}

/// Read a stored key back as a string
pub(crate) fn key_from_bytes(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| CabinetError::Deserialization(format!("stored key is not UTF-8: {}", e)))
}
