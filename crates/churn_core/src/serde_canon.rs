//! Canonical JSON for deterministic hashing
//!
//! - sorted object keys at every depth
//! - no whitespace
//! - BLAKE3 digests rendered as lowercase hex

use crate::errors::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let json_value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&canonicalize_value(&json_value))?)
}

fn canonicalize_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), canonicalize_value(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_value).collect()),
        other => other.clone(),
    }
}

/// BLAKE3 hash of raw bytes as hex
pub fn hash_bytes_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

/// BLAKE3 hash of the canonical JSON representation
pub fn hash_canonical<T: Serialize>(value: &T) -> Result<[u8; 32]> {
    let json = to_canonical_json(value)?;
    Ok(*blake3::hash(json.as_bytes()).as_bytes())
}

/// BLAKE3 hash of the canonical JSON representation, as hex
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> Result<String> {
    Ok(hex::encode(hash_canonical(value)?))
}
