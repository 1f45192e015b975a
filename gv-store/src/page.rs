//! Cursor pagination over key ranges
//!
//! The cursor is the raw store key of the first entry of the next page.
//! Callers treat it as opaque.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::kv::{KvPair, KvStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Cursor from a previous [`PageResponse`]; `None` starts at the beginning
    pub key: Option<Vec<u8>>,
    /// Maximum entries; 0 means no limit
    pub limit: usize,
}

impl PageRequest {
    pub fn first(limit: usize) -> Self {
        Self { key: None, limit }
    }

    pub fn after(key: Vec<u8>, limit: usize) -> Self {
        Self {
            key: Some(key),
            limit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    /// `None` when the range is exhausted
    pub next_key: Option<Vec<u8>>,
}

/// Read one page of `start <= key < end`
///
/// Reads at most `limit + 1` entries; the extra one becomes the cursor.
pub fn paginate(
    store: &dyn KvStore,
    start: &[u8],
    end: Option<&[u8]>,
    page: &PageRequest,
) -> StoreResult<(Vec<KvPair>, PageResponse)> {
    let from = match &page.key {
        Some(cursor) => {
            let below_end = end.map_or(true, |end| cursor.as_slice() < end);
            if cursor.as_slice() < start || !below_end {
                return Err(StoreError::InvalidCursor(
                    "cursor outside the scanned range".to_string(),
                ));
            }
            cursor.as_slice()
        }
        None => start,
    };

    let fetch = match page.limit {
        0 => None,
        n => Some(n.saturating_add(1)),
    };
    let mut entries = store.scan(from, end, fetch)?;
    if page.limit == 0 || entries.len() <= page.limit {
        return Ok((entries, PageResponse::default()));
    }
    let rest = entries.split_off(page.limit);
    let next_key = rest.into_iter().next().map(|(k, _)| k);
    Ok((entries, PageResponse { next_key }))
}
