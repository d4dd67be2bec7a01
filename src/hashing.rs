//! Hashing System - SHA-256 Fingerprints for Token Tables
//!
//! The fingerprint stamped into a generated region is the only drift signal,
//! so the generator and the validator must both go through [`table_fingerprint`].

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Map, Value, to_string};

/// Prefix carried by every fingerprint.
pub const FINGERPRINT_PREFIX: &str = "sha256-";

/// Number of hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 12;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Short fingerprint: `sha256-` followed by the first 12 hex chars of the digest.
pub fn fingerprint(data: &[u8]) -> String {
    let digest = sha256_hex(data);
    format!("{}{}", FINGERPRINT_PREFIX, &digest[..FINGERPRINT_LEN])
}

/// Convert to canonical JSON (no whitespace, stable property order).
///
/// Keys that are canonical array indices come first in ascending numeric
/// order, every other key keeps its declaration order. This is the property
/// order `JSON.stringify` produces, so fingerprints agree with artifacts that
/// were stamped by the JS toolchain.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let ordered = order_value(&v);
    to_string(&ordered)
}

fn order_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut indexed: Vec<(u32, &String, &Value)> = vec![];
            let mut named: Vec<(&String, &Value)> = vec![];
            for (k, v) in map {
                match array_index(k) {
                    Some(i) => indexed.push((i, k, v)),
                    None => named.push((k, v)),
                }
            }
            indexed.sort_by_key(|(i, _, _)| *i);

            let ordered: Map<String, Value> = indexed
                .into_iter()
                .map(|(_, k, v)| (k, v))
                .chain(named)
                .map(|(k, v)| (k.clone(), order_value(v)))
                .collect();
            Value::Object(ordered)
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(order_value).collect())
        }
        _ => v.clone()
    }
}

/// `"0"`, `"50"`, `"4294967294"`; never `"04"`, `"-1"` or `"1.5"`.
fn array_index(key: &str) -> Option<u32> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    if !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse::<u32>().ok().filter(|i| *i < u32::MAX)
}

/// Fingerprint of a token table over its canonical serialization.
pub fn table_fingerprint<T: Serialize>(table: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(table)?;
    Ok(fingerprint(canonical.as_bytes()))
}

// We need hex encoding
mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}
