//! Row and key encoding
//!
//! Rows are encoded by an explicit [`RowCodec`] handed to each table at
//! construction. Keys are built from a one-byte table prefix, big-endian
//! integers and length-prefixed byte strings so that byte order matches
//! logical order.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{StoreError, StoreResult};

/// Encodes table rows to bytes and back
pub trait RowCodec<T> {
    fn encode(&self, row: &T) -> StoreResult<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> StoreResult<T>;
}

/// serde_json row encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> RowCodec<T> for JsonCodec {
    fn encode(&self, row: &T) -> StoreResult<Vec<u8>> {
        serde_json::to_vec(row).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> StoreResult<T> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

/// `prefix || key`
pub fn prefixed(prefix: u8, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + key.len());
    out.push(prefix);
    out.extend_from_slice(key);
    out
}

/// Smallest key greater than every key starting with `prefix`
///
/// `None` when the prefix is all `0xff`, meaning the scan is unbounded.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// One length byte followed by the bytes
pub fn len_prefixed(bytes: &[u8]) -> StoreResult<Vec<u8>> {
    let len = u8::try_from(bytes.len()).map_err(|_| {
        StoreError::InvalidKey(format!("key part of {} bytes exceeds 255", bytes.len()))
    })?;
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(len);
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Split a length-prefixed part off the front of `bytes`
pub fn split_len_prefixed(bytes: &[u8]) -> StoreResult<(&[u8], &[u8])> {
    let (&len, rest) = bytes
        .split_first()
        .ok_or_else(|| StoreError::InvalidKey("empty key".to_string()))?;
    let len = len as usize;
    if rest.len() < len {
        return Err(StoreError::InvalidKey(format!(
            "key part declares {} bytes, {} available",
            len,
            rest.len()
        )));
    }
    Ok(rest.split_at(len))
}

pub fn u64_key(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

pub fn decode_u64(bytes: &[u8]) -> StoreResult<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::InvalidKey(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}
