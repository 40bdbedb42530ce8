//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats (timestamps are i64 nanoseconds)
//!
//! The canonical encoding is the signing input for originator envelopes, so
//! the same envelope must produce identical bytes on every platform.

use ciborium::value::{Integer, Value};
use std::io::Cursor;

use crate::error::CoreError;

/// Encode a CBOR Value to canonical bytes.
///
/// Fails on values that have no canonical form here (floats, tags).
pub fn encode_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Decode exactly one CBOR value from `bytes`.
///
/// Trailing bytes after the value are rejected.
pub fn decode_value(bytes: &[u8]) -> Result<Value, CoreError> {
    let mut cursor = Cursor::new(bytes);
    let value: Value =
        ciborium::from_reader(&mut cursor).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let consumed = cursor.position() as usize;
    if consumed != bytes.len() {
        return Err(CoreError::DecodingError(format!(
            "{} trailing bytes",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

/// Build a map entry with a small integer key.
pub(crate) fn entry(key: u64, value: Value) -> (Value, Value) {
    (Value::Integer(key.into()), value)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => encode_bytes(buf, b),
        Value::Text(s) => encode_text(buf, s),
        Value::Array(arr) => encode_array(buf, arr)?,
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => {
            return Err(CoreError::EncodingError(
                "floats not supported in canonical encoding".into(),
            ))
        }
        _ => {
            return Err(CoreError::EncodingError(
                "unsupported CBOR value type".into(),
            ))
        }
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        let abs = (-1 - n) as u64;
        encode_uint(buf, 1, abs);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Encode a text string (major type 3).
fn encode_text(buf: &mut Vec<u8>, s: &str) {
    encode_uint(buf, 3, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

/// Encode an array (major type 4).
fn encode_array(buf: &mut Vec<u8>, arr: &[Value]) -> Result<(), CoreError> {
    encode_uint(buf, 4, arr.len() as u64);
    for item in arr {
        encode_value_to(buf, item)?;
    }
    Ok(())
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut key_value_pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        key_value_pairs.push((key_buf, v));
    }

    key_value_pairs.sort_by(|a, b| a.0.cmp(&b.0));
    if key_value_pairs.windows(2).any(|w| w[0].0 == w[1].0) {
        return Err(CoreError::EncodingError("duplicate map key".into()));
    }

    encode_uint(buf, 5, key_value_pairs.len() as u64);
    for (key_bytes, value) in key_value_pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}

/// Typed field access over a decoded map with integer keys.
pub(crate) struct FieldMap<'a> {
    what: &'static str,
    entries: &'a [(Value, Value)],
}

impl<'a> FieldMap<'a> {
    /// View `value` as a map; `what` names the structure in error messages.
    pub(crate) fn new(what: &'static str, value: &'a Value) -> Result<Self, CoreError> {
        match value {
            Value::Map(entries) => Ok(Self { what, entries }),
            _ => Err(CoreError::MalformedEnvelope(format!("{}: expected map", what))),
        }
    }

    fn get(&self, key: u64) -> Option<&'a Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::Integer(i) if u64::try_from(*i).ok() == Some(key)))
            .map(|(_, v)| v)
    }

    fn missing(&self, field: &str) -> CoreError {
        CoreError::MalformedEnvelope(format!("{}: missing or invalid {}", self.what, field))
    }

    pub(crate) fn bytes(&self, key: u64, field: &str) -> Result<&'a [u8], CoreError> {
        match self.get(key) {
            Some(Value::Bytes(b)) => Ok(b),
            _ => Err(self.missing(field)),
        }
    }

    pub(crate) fn u64(&self, key: u64, field: &str) -> Result<u64, CoreError> {
        match self.get(key) {
            Some(Value::Integer(i)) => u64::try_from(*i).map_err(|_| self.missing(field)),
            _ => Err(self.missing(field)),
        }
    }

    pub(crate) fn i64(&self, key: u64, field: &str) -> Result<i64, CoreError> {
        match self.get(key) {
            Some(Value::Integer(i)) => i64::try_from(*i).map_err(|_| self.missing(field)),
            _ => Err(self.missing(field)),
        }
    }

    pub(crate) fn value(&self, key: u64, field: &str) -> Result<&'a Value, CoreError> {
        self.get(key).ok_or_else(|| self.missing(field))
    }
}
