//! Secondary indexes
//!
//! An index entry is a key-only row:
//!
//! ```text
//! index_prefix || len(index_key) || index_key || primary_key
//! ```
//!
//! The length byte keeps `index_key` boundaries unambiguous, so a scan for
//! one index key never picks up entries of a longer key sharing its bytes.
//! Tables call the [`Indexer`] hooks on every mutation, inside the same
//! store (and therefore the same transaction) as the row write.

use tracing::trace;

use crate::codec::{len_prefixed, prefix_end, prefixed, split_len_prefixed, u64_key};
use crate::error::StoreResult;
use crate::kv::KvStore;
use crate::page::{paginate, PageRequest, PageResponse};

/// Mutation hooks a table runs for each attached index
pub trait Indexer<T> {
    fn on_create(&self, store: &mut dyn KvStore, primary_key: &[u8], row: &T) -> StoreResult<()>;

    fn on_update(
        &self,
        store: &mut dyn KvStore,
        primary_key: &[u8],
        new_row: &T,
        old_row: &T,
    ) -> StoreResult<()>;

    fn on_delete(&self, store: &mut dyn KvStore, primary_key: &[u8], row: &T) -> StoreResult<()>;
}

type KeyExtractor<T> = Box<dyn Fn(&T) -> Vec<Vec<u8>> + Send + Sync>;

/// Index over arbitrary byte keys; a row may yield several keys
pub struct Index<T> {
    prefix: u8,
    extractor: KeyExtractor<T>,
}

impl<T> Index<T> {
    /// Multi-key index: every key returned by `extractor` points at the row
    pub fn new<F>(prefix: u8, extractor: F) -> Self
    where
        F: Fn(&T) -> Vec<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            prefix,
            extractor: Box::new(extractor),
        }
    }

    /// Single-key index
    pub fn single<F>(prefix: u8, extractor: F) -> Self
    where
        F: Fn(&T) -> Vec<u8> + Send + Sync + 'static,
    {
        Self::new(prefix, move |row| vec![extractor(row)])
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    fn keys_of(&self, row: &T) -> Vec<Vec<u8>> {
        let mut keys = (self.extractor)(row);
        keys.sort();
        keys.dedup();
        keys
    }

    fn scan_prefix(&self, index_key: &[u8]) -> StoreResult<Vec<u8>> {
        Ok(prefixed(self.prefix, &len_prefixed(index_key)?))
    }

    fn entry_key(&self, index_key: &[u8], primary_key: &[u8]) -> StoreResult<Vec<u8>> {
        let mut key = self.scan_prefix(index_key)?;
        key.extend_from_slice(primary_key);
        Ok(key)
    }

    /// Whether any row maps to `index_key`
    pub fn has(&self, store: &dyn KvStore, index_key: &[u8]) -> StoreResult<bool> {
        let (entries, _) = self.primary_keys(store, index_key, &PageRequest::first(1))?;
        Ok(!entries.is_empty())
    }

    /// Primary keys of rows mapped to `index_key`, in primary key order
    pub fn primary_keys(
        &self,
        store: &dyn KvStore,
        index_key: &[u8],
        page: &PageRequest,
    ) -> StoreResult<(Vec<Vec<u8>>, PageResponse)> {
        let start = self.scan_prefix(index_key)?;
        let end = prefix_end(&start);
        let (entries, resp) = paginate(store, &start, end.as_deref(), page)?;

        let mut pks = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            let (_, pk) = split_len_prefixed(&key[1..])?;
            pks.push(pk.to_vec());
        }
        Ok((pks, resp))
    }
}

impl<T> Indexer<T> for Index<T> {
    fn on_create(&self, store: &mut dyn KvStore, primary_key: &[u8], row: &T) -> StoreResult<()> {
        for ik in self.keys_of(row) {
            store.set(&self.entry_key(&ik, primary_key)?, &[])?;
        }
        Ok(())
    }

    fn on_update(
        &self,
        store: &mut dyn KvStore,
        primary_key: &[u8],
        new_row: &T,
        old_row: &T,
    ) -> StoreResult<()> {
        let new_keys = self.keys_of(new_row);
        let old_keys = self.keys_of(old_row);
        for ik in old_keys.iter().filter(|k| !new_keys.contains(k)) {
            store.delete(&self.entry_key(ik, primary_key)?)?;
        }
        for ik in new_keys.iter().filter(|k| !old_keys.contains(k)) {
            store.set(&self.entry_key(ik, primary_key)?, &[])?;
        }
        trace!(prefix = self.prefix, "Index entries updated");
        Ok(())
    }

    fn on_delete(&self, store: &mut dyn KvStore, primary_key: &[u8], row: &T) -> StoreResult<()> {
        for ik in self.keys_of(row) {
            store.delete(&self.entry_key(&ik, primary_key)?)?;
        }
        Ok(())
    }
}

/// Index keyed by a `u64` encoded big-endian
pub struct UInt64Index<T> {
    inner: Index<T>,
}

impl<T> UInt64Index<T> {
    pub fn new<F>(prefix: u8, extractor: F) -> Self
    where
        F: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self {
            inner: Index::single(prefix, move |row| u64_key(extractor(row))),
        }
    }

    pub fn has(&self, store: &dyn KvStore, key: u64) -> StoreResult<bool> {
        self.inner.has(store, &u64_key(key))
    }

    pub fn primary_keys(
        &self,
        store: &dyn KvStore,
        key: u64,
        page: &PageRequest,
    ) -> StoreResult<(Vec<Vec<u8>>, PageResponse)> {
        self.inner.primary_keys(store, &u64_key(key), page)
    }
}

impl<T> Indexer<T> for UInt64Index<T> {
    fn on_create(&self, store: &mut dyn KvStore, primary_key: &[u8], row: &T) -> StoreResult<()> {
        self.inner.on_create(store, primary_key, row)
    }

    fn on_update(
        &self,
        store: &mut dyn KvStore,
        primary_key: &[u8],
        new_row: &T,
        old_row: &T,
    ) -> StoreResult<()> {
        self.inner.on_update(store, primary_key, new_row, old_row)
    }

    fn on_delete(&self, store: &mut dyn KvStore, primary_key: &[u8], row: &T) -> StoreResult<()> {
        self.inner.on_delete(store, primary_key, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKvStore;

    struct Doc {
        owner: Vec<u8>,
        tags: Vec<Vec<u8>>,
        group: u64,
    }

    fn doc(owner: &[u8], tags: &[&[u8]], group: u64) -> Doc {
        Doc {
            owner: owner.to_vec(),
            tags: tags.iter().map(|t| t.to_vec()).collect(),
            group,
        }
    }

    #[test]
    fn test_length_prefix_separates_keys() {
        let mut store = MemoryKvStore::new();
        let by_owner = Index::single(0x20, |d: &Doc| d.owner.clone());
        by_owner.on_create(&mut store, b"pk1", &doc(b"ab", &[], 1)).unwrap();
        by_owner.on_create(&mut store, b"pk2", &doc(b"a", &[], 1)).unwrap();

        let (pks, _) = by_owner.primary_keys(&store, b"a", &PageRequest::default()).unwrap();
        assert_eq!(pks, vec![b"pk2".to_vec()]);
    }

    #[test]
    fn test_multi_key_update() {
        let mut store = MemoryKvStore::new();
        let by_tag = Index::new(0x21, |d: &Doc| d.tags.clone());
        let old = doc(b"o", &[b"x", b"y"], 1);
        let new = doc(b"o", &[b"y", b"z", b"z"], 1);

        by_tag.on_create(&mut store, b"pk", &old).unwrap();
        by_tag.on_update(&mut store, b"pk", &new, &old).unwrap();

        assert!(!by_tag.has(&store, b"x").unwrap());
        assert!(by_tag.has(&store, b"y").unwrap());
        assert!(by_tag.has(&store, b"z").unwrap());

        by_tag.on_delete(&mut store, b"pk", &new).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_uint64_index_pages() {
        let mut store = MemoryKvStore::new();
        let by_group = UInt64Index::new(0x22, |d: &Doc| d.group);
        for i in 0..5u8 {
            by_group.on_create(&mut store, &[i], &doc(b"o", &[], 7)).unwrap();
        }
        by_group.on_create(&mut store, &[9], &doc(b"o", &[], 8)).unwrap();

        let (first, resp) = by_group.primary_keys(&store, 7, &PageRequest::first(3)).unwrap();
        assert_eq!(first, vec![vec![0], vec![1], vec![2]]);
        let next = PageRequest::after(resp.next_key.unwrap(), 3);
        let (second, resp) = by_group.primary_keys(&store, 7, &next).unwrap();
        assert_eq!(second, vec![vec![3], vec![4]]);
        assert!(resp.next_key.is_none());
    }
}
