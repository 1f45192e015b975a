//! Write overlay over a parent store
//!
//! A [`Transaction`] buffers writes and serves reads from the buffer first.
//! `commit` hands the whole buffer to the parent as one batch; dropping the
//! transaction discards it. A transaction is itself a [`KvStore`], so
//! transactions nest: the inner one commits into the outer buffer only.

use std::collections::BTreeMap;
use std::ops::Bound;

use tracing::trace;

use crate::error::StoreResult;
use crate::kv::{BatchOp, KvPair, KvStore};

pub struct Transaction<'a> {
    parent: &'a mut dyn KvStore,
    /// `None` marks a delete
    writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a> Transaction<'a> {
    pub fn new(parent: &'a mut dyn KvStore) -> Self {
        Self {
            parent,
            writes: BTreeMap::new(),
        }
    }

    /// Number of buffered writes
    pub fn pending(&self) -> usize {
        self.writes.len()
    }

    /// Apply all buffered writes to the parent atomically
    pub fn commit(self) -> StoreResult<()> {
        if self.writes.is_empty() {
            return Ok(());
        }
        let ops: Vec<BatchOp> = self
            .writes
            .into_iter()
            .map(|(k, v)| match v {
                Some(v) => BatchOp::Put(k, v),
                None => BatchOp::Delete(k),
            })
            .collect();
        trace!(count = ops.len(), "Committing transaction");
        self.parent.write_batch(ops)
    }

    /// Drop all buffered writes
    pub fn discard(self) {
        trace!(count = self.writes.len(), "Discarding transaction");
    }
}

impl KvStore for Transaction<'_> {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        match self.writes.get(key) {
            Some(v) => Ok(v.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.writes.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.writes.insert(key.to_vec(), None);
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
        let overlay: Vec<_> = self
            .writes
            .range((Bound::Included(start.to_vec()), upper))
            .collect();

        // each buffered write hides at most one parent entry
        let parent_limit = limit.map(|n| n.saturating_add(overlay.len()));
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = self
            .parent
            .scan(start, end, parent_limit)?
            .into_iter()
            .collect();

        for (k, v) in overlay {
            match v {
                Some(v) => {
                    merged.insert(k.clone(), v.clone());
                }
                None => {
                    merged.remove(k);
                }
            }
        }
        Ok(merged
            .into_iter()
            .take(limit.unwrap_or(usize::MAX))
            .collect())
    }

    fn write_batch(&mut self, ops: Vec<BatchOp>) -> StoreResult<()> {
        for op in ops {
            match op {
                BatchOp::Put(k, v) => {
                    self.writes.insert(k, Some(v));
                }
                BatchOp::Delete(k) => {
                    self.writes.insert(k, None);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKvStore;

    #[test]
    fn test_commit_applies_writes() {
        let mut store = MemoryKvStore::new();
        store.set(b"old", b"x").unwrap();

        let mut tx = Transaction::new(&mut store);
        tx.set(b"new", b"y").unwrap();
        tx.delete(b"old").unwrap();
        assert_eq!(tx.get(b"new").unwrap(), Some(b"y".to_vec()));
        assert_eq!(tx.get(b"old").unwrap(), None);
        tx.commit().unwrap();

        assert_eq!(store.get(b"new").unwrap(), Some(b"y".to_vec()));
        assert!(!store.has(b"old").unwrap());
    }

    #[test]
    fn test_drop_discards() {
        let mut store = MemoryKvStore::new();
        {
            let mut tx = Transaction::new(&mut store);
            tx.set(b"k", b"v").unwrap();
        }
        assert!(store.is_empty());

        let mut tx = Transaction::new(&mut store);
        tx.set(b"k", b"v").unwrap();
        tx.discard();
        assert!(store.is_empty());
    }

    #[test]
    fn test_range_merges_overlay() {
        let mut store = MemoryKvStore::new();
        store.set(b"a", b"1").unwrap();
        store.set(b"b", b"2").unwrap();

        let mut tx = Transaction::new(&mut store);
        tx.delete(b"a").unwrap();
        tx.set(b"ab", b"3").unwrap();
        tx.set(b"b", b"4").unwrap();
        tx.set(b"z", b"5").unwrap();

        let got = tx.range(b"a", Some(b"c")).unwrap();
        assert_eq!(
            got,
            vec![
                (b"ab".to_vec(), b"3".to_vec()),
                (b"b".to_vec(), b"4".to_vec()),
            ]
        );
    }

    #[test]
    fn test_nested_inner_discard_keeps_outer() {
        let mut store = MemoryKvStore::new();
        let mut outer = Transaction::new(&mut store);
        outer.set(b"outer", b"1").unwrap();
        {
            let mut inner = Transaction::new(&mut outer);
            inner.set(b"inner", b"2").unwrap();
            assert!(inner.has(b"outer").unwrap());
        }
        assert!(!outer.has(b"inner").unwrap());

        {
            let mut inner = Transaction::new(&mut outer);
            inner.set(b"inner", b"3").unwrap();
            inner.commit().unwrap();
        }
        assert_eq!(outer.get(b"inner").unwrap(), Some(b"3".to_vec()));
        outer.commit().unwrap();
        assert_eq!(store.len(), 2);
    }
}
