//! Canonical JSON and SHA-256 digests of canonical events.
//!
//! Object keys are sorted recursively before serialization so that the digest
//! depends only on content, not on the declaration order preserved elsewhere.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let sorted: Map<String, Value> = keys
                .into_iter()
                .filter_map(|k| map.get(k).map(|v| (k.clone(), sort_keys(v))))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Compact JSON with recursively sorted keys.
pub fn canonical_json(value: &Value) -> String {
    sort_keys(value).to_string()
}

/// SHA-256 hex digest of [`canonical_json`].
pub fn compute_digest(value: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(value).as_bytes());
    hex::encode(hasher.finalize())
}
