//! Typed tables over a [`KvStore`]
//!
//! Rows live at `prefix || primary_key`. Every mutation also runs the hooks
//! of the attached indexes against the same store, so row and index writes
//! commit or roll back together.

use std::sync::Arc;

use tracing::trace;

use crate::codec::{prefix_end, prefixed, u64_key, JsonCodec, RowCodec};
use crate::error::{StoreError, StoreResult};
use crate::index::Indexer;
use crate::kv::KvStore;
use crate::page::{paginate, PageRequest, PageResponse};
use crate::sequence::Sequence;

/// Table keyed by a primary key derived from the row
pub struct PrimaryKeyTable<T, C = JsonCodec> {
    prefix: u8,
    codec: C,
    primary_key: Box<dyn Fn(&T) -> Vec<u8> + Send + Sync>,
    indexes: Vec<Arc<dyn Indexer<T> + Send + Sync>>,
}

impl<T, C: RowCodec<T>> PrimaryKeyTable<T, C> {
    pub fn new<F>(prefix: u8, codec: C, primary_key: F) -> Self
    where
        F: Fn(&T) -> Vec<u8> + Send + Sync + 'static,
    {
        Self {
            prefix,
            codec,
            primary_key: Box::new(primary_key),
            indexes: Vec::new(),
        }
    }

    /// Attach a secondary index
    pub fn with_index(mut self, index: Arc<dyn Indexer<T> + Send + Sync>) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn primary_key(&self, row: &T) -> Vec<u8> {
        (self.primary_key)(row)
    }

    fn row_key(&self, pk: &[u8]) -> Vec<u8> {
        prefixed(self.prefix, pk)
    }

    pub fn get(&self, store: &dyn KvStore, pk: &[u8]) -> StoreResult<Option<T>> {
        match store.get(&self.row_key(pk))? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn has(&self, store: &dyn KvStore, pk: &[u8]) -> StoreResult<bool> {
        store.has(&self.row_key(pk))
    }

    /// Insert a new row; fails if the key is taken
    pub fn create(&self, store: &mut dyn KvStore, row: &T) -> StoreResult<()> {
        let pk = self.primary_key(row);
        let key = self.row_key(&pk);
        if store.has(&key)? {
            return Err(StoreError::AlreadyExists(format!(
                "row {} in table {:#04x}",
                hex_key(&pk),
                self.prefix
            )));
        }
        store.set(&key, &self.codec.encode(row)?)?;
        for index in &self.indexes {
            index.on_create(store, &pk, row)?;
        }
        trace!(table = self.prefix, "Row created");
        Ok(())
    }

    /// Replace an existing row; fails if absent
    pub fn update(&self, store: &mut dyn KvStore, row: &T) -> StoreResult<()> {
        let pk = self.primary_key(row);
        let old = self.get(store, &pk)?.ok_or_else(|| {
            StoreError::NotFound(format!("row {} in table {:#04x}", hex_key(&pk), self.prefix))
        })?;
        store.set(&self.row_key(&pk), &self.codec.encode(row)?)?;
        for index in &self.indexes {
            index.on_update(store, &pk, row, &old)?;
        }
        Ok(())
    }

    /// Remove a row and its index entries, returning it
    pub fn delete(&self, store: &mut dyn KvStore, pk: &[u8]) -> StoreResult<T> {
        let old = self.get(store, pk)?.ok_or_else(|| {
            StoreError::NotFound(format!("row {} in table {:#04x}", hex_key(pk), self.prefix))
        })?;
        store.delete(&self.row_key(pk))?;
        for index in &self.indexes {
            index.on_delete(store, pk, &old)?;
        }
        Ok(old)
    }

    /// Rows whose primary key starts with `pk_prefix`, in key order
    pub fn prefix_scan(
        &self,
        store: &dyn KvStore,
        pk_prefix: &[u8],
        page: &PageRequest,
    ) -> StoreResult<(Vec<T>, PageResponse)> {
        let start = self.row_key(pk_prefix);
        let end = prefix_end(&start);
        let (entries, resp) = paginate(store, &start, end.as_deref(), page)?;
        let rows = entries
            .iter()
            .map(|(_, v)| self.codec.decode(v))
            .collect::<StoreResult<Vec<T>>>()?;
        Ok((rows, resp))
    }

    /// Load rows for primary keys returned by an index
    pub fn get_many(&self, store: &dyn KvStore, pks: &[Vec<u8>]) -> StoreResult<Vec<T>> {
        let mut rows = Vec::with_capacity(pks.len());
        for pk in pks {
            let row = self.get(store, pk)?.ok_or_else(|| {
                StoreError::NotFound(format!(
                    "indexed row {} missing from table {:#04x}",
                    hex_key(pk),
                    self.prefix
                ))
            })?;
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Table with ids assigned from a sequence; rows live at `prefix || id BE`
pub struct AutoUInt64Table<T, C = JsonCodec> {
    table: PrimaryKeyTable<T, C>,
    seq: Sequence,
}

impl<T, C: RowCodec<T>> AutoUInt64Table<T, C> {
    pub fn new<F>(prefix: u8, seq_prefix: u8, codec: C, id_of: F) -> Self
    where
        F: Fn(&T) -> u64 + Send + Sync + 'static,
    {
        Self {
            table: PrimaryKeyTable::new(prefix, codec, move |row| u64_key(id_of(row))),
            seq: Sequence::new(seq_prefix),
        }
    }

    pub fn with_index(mut self, index: Arc<dyn Indexer<T> + Send + Sync>) -> Self {
        self.table = self.table.with_index(index);
        self
    }

    /// Allocate the next id, build the row with it and insert
    pub fn create<F>(&self, store: &mut dyn KvStore, build: F) -> StoreResult<T>
    where
        F: FnOnce(u64) -> T,
    {
        let id = self.seq.next_val(store)?;
        let row = build(id);
        self.table.create(store, &row)?;
        Ok(row)
    }

    pub fn get(&self, store: &dyn KvStore, id: u64) -> StoreResult<Option<T>> {
        self.table.get(store, &u64_key(id))
    }

    pub fn has(&self, store: &dyn KvStore, id: u64) -> StoreResult<bool> {
        self.table.has(store, &u64_key(id))
    }

    pub fn update(&self, store: &mut dyn KvStore, row: &T) -> StoreResult<()> {
        self.table.update(store, row)
    }

    pub fn delete(&self, store: &mut dyn KvStore, id: u64) -> StoreResult<T> {
        self.table.delete(store, &u64_key(id))
    }

    pub fn get_many(&self, store: &dyn KvStore, pks: &[Vec<u8>]) -> StoreResult<Vec<T>> {
        self.table.get_many(store, pks)
    }

    /// Last id handed out
    pub fn last_id(&self, store: &dyn KvStore) -> StoreResult<u64> {
        self.seq.cur_val(store)
    }
}

fn hex_key(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
