//! Sled persistent backend
//!
//! All entities share one tree; table prefixes partition the key space.
//! Batches go through `sled::Batch` so a commit lands atomically.

use std::path::Path;

use crate::error::{StoreError, StoreResult};
use crate::kv::{BatchOp, KvPair, KvStore};

const STATE_TREE: &str = "gv_state";

#[derive(Debug, Clone)]
pub struct SledKvStore {
    db: sled::Db,
    tree: sled::Tree,
}

impl SledKvStore {
    /// Open or create a database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path)
            .map_err(|e| StoreError::Backend(format!("Failed to open sled db: {}", e)))?;
        Self::from_db(db)
    }

    /// Open a database that is removed on drop
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::Backend(format!("Failed to open temporary sled db: {}", e)))?;
        Self::from_db(db)
    }

    fn from_db(db: sled::Db) -> StoreResult<Self> {
        let tree = db
            .open_tree(STATE_TREE)
            .map_err(|e| StoreError::Backend(format!("Failed to open state tree: {}", e)))?;
        Ok(Self { db, tree })
    }

    pub fn flush(&self) -> StoreResult<()> {
        self.db
            .flush()
            .map_err(|e| StoreError::Backend(format!("Failed to flush db: {}", e)))?;
        Ok(())
    }
}

impl KvStore for SledKvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        let value = self
            .tree
            .get(key)
            .map_err(|e| StoreError::Backend(format!("Failed to get key: {}", e)))?;
        Ok(value.map(|v| v.to_vec()))
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.tree
            .insert(key, value)
            .map_err(|e| StoreError::Backend(format!("Failed to insert key: {}", e)))?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        self.tree
            .remove(key)
            .map_err(|e| StoreError::Backend(format!("Failed to remove key: {}", e)))?;
        Ok(())
    }

    fn scan(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<KvPair>> {
        let iter = match end {
            Some(end) if end <= start => return Ok(Vec::new()),
            Some(end) => self.tree.range(start..end),
            None => self.tree.range(start..),
        };
        let mut out = Vec::new();
        for item in iter.take(limit.unwrap_or(usize::MAX)) {
            let (k, v) = item.map_err(|e| StoreError::Backend(format!("Failed to iterate: {}", e)))?;
            out.push((k.to_vec(), v.to_vec()));
        }
        Ok(out)
    }

    fn write_batch(&mut self, ops: Vec<BatchOp>) -> StoreResult<()> {
        let mut batch = sled::Batch::default();
        for op in ops {
            match op {
                BatchOp::Put(k, v) => batch.insert(k, v),
                BatchOp::Delete(k) => batch.remove(k),
            }
        }
        self.tree
            .apply_batch(batch)
            .map_err(|e| StoreError::Backend(format!("Failed to apply batch: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = SledKvStore::open(dir.path()).unwrap();
            store
                .write_batch(vec![
                    BatchOp::Put(b"a".to_vec(), b"1".to_vec()),
                    BatchOp::Put(b"b".to_vec(), b"2".to_vec()),
                ])
                .unwrap();
            store.flush().unwrap();
        }
        let store = SledKvStore::open(dir.path()).unwrap();
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.range(b"a", None).unwrap().len(), 2);
    }

    #[test]
    fn test_range_bounds() {
        let mut store = SledKvStore::temporary().unwrap();
        for k in [&b"a"[..], b"b", b"c"] {
            store.set(k, b"").unwrap();
        }
        assert_eq!(store.range(b"a", Some(b"c")).unwrap().len(), 2);
        assert!(store.range(b"c", Some(b"b")).unwrap().is_empty());
        store.delete(b"a").unwrap();
        assert!(!store.has(b"a").unwrap());
    }
}
