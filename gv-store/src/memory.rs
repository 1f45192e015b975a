//! In-memory backend
//!
//! A `BTreeMap` keeps keys in byte order; used for tests and embedded hosts.

use std::collections::BTreeMap;
use std::ops::Bound;

use crate::error::StoreResult;
use crate::kv::{BatchOp, KvPair, KvStore};

#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.data.remove(key);
        Ok(())
    }

    fn scan(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<KvPair>> {
        let upper = match end {
            Some(end) if end <= start => return Ok(Vec::new()),
            Some(end) => Bound::Excluded(end.to_vec()),
            None => Bound::Unbounded,
        };
        Ok(self
            .data
            .range((Bound::Included(start.to_vec()), upper))
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn write_batch(&mut self, ops: Vec<BatchOp>) -> StoreResult<()> {
        for op in ops {
            match op {
                BatchOp::Put(k, v) => {
                    self.data.insert(k, v);
                }
                BatchOp::Delete(k) => {
                    self.data.remove(&k);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_delete() {
        let mut store = MemoryKvStore::new();
        store.set(b"a", b"1").unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        store.delete(b"a").unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_range_is_ordered_and_half_open() {
        let mut store = MemoryKvStore::new();
        for k in [&b"b"[..], b"a", b"c", b"ab"] {
            store.set(k, b"").unwrap();
        }
        let keys: Vec<_> = store
            .range(b"a", Some(b"c"))
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"a".to_vec(), b"ab".to_vec(), b"b".to_vec()]);
        assert!(store.range(b"c", Some(b"a")).unwrap().is_empty());
        assert_eq!(store.range(b"b", None).unwrap().len(), 2);
    }

    #[test]
    fn test_write_batch() {
        let mut store = MemoryKvStore::new();
        store.set(b"gone", b"x").unwrap();
        store
            .write_batch(vec![
                BatchOp::Put(b"k".to_vec(), b"v".to_vec()),
                BatchOp::Delete(b"gone".to_vec()),
            ])
            .unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.has(b"k").unwrap());
    }
}
