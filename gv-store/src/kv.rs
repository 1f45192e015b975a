//! Ordered key-value backend contract
//!
//! Keys are raw bytes compared lexicographically. Every backend and every
//! [`crate::Transaction`] implements [`KvStore`], so tables and indexes run
//! unchanged over committed state or over an uncommitted overlay.

use crate::error::StoreResult;

/// A key and its value
pub type KvPair = (Vec<u8>, Vec<u8>);

/// One write in an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

pub trait KvStore {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>>;

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()>;

    fn delete(&mut self, key: &[u8]) -> StoreResult<()>;

    /// At most `limit` entries with `start <= key < end` in ascending key order
    ///
    /// `None` leaves the end or the count unbounded.
    fn scan(&self, start: &[u8], end: Option<&[u8]>, limit: Option<usize>)
        -> StoreResult<Vec<KvPair>>;

    /// Every entry with `start <= key < end`
    fn range(&self, start: &[u8], end: Option<&[u8]>) -> StoreResult<Vec<KvPair>> {
        self.scan(start, end, None)
    }

    /// Apply every op or none
    fn write_batch(&mut self, ops: Vec<BatchOp>) -> StoreResult<()>;

    fn has(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
