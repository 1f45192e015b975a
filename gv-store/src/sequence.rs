//! Persistent sequence
//!
//! A counter stored under its own prefix byte, so ids keep increasing across
//! restarts and roll back with the enclosing transaction.

use tracing::trace;

use crate::codec::{decode_u64, u64_key};
use crate::error::StoreResult;
use crate::kv::KvStore;

#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    prefix: u8,
}

impl Sequence {
    pub fn new(prefix: u8) -> Self {
        Self { prefix }
    }

    fn key(&self) -> [u8; 1] {
        [self.prefix]
    }

    /// Last value handed out, 0 if none
    pub fn cur_val(&self, store: &dyn KvStore) -> StoreResult<u64> {
        match store.get(&self.key())? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    /// Increment and return the new value; the first call returns 1
    pub fn next_val(&self, store: &mut dyn KvStore) -> StoreResult<u64> {
        let next = self.cur_val(store)? + 1;
        store.set(&self.key(), &u64_key(next))?;
        trace!(prefix = self.prefix, value = next, "Sequence advanced");
        Ok(next)
    }

    /// Seed the counter, e.g. when importing state
    pub fn init_val(&self, store: &mut dyn KvStore, value: u64) -> StoreResult<()> {
        store.set(&self.key(), &u64_key(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryKvStore;
    use crate::transaction::Transaction;

    #[test]
    fn test_monotonic() {
        let mut store = MemoryKvStore::new();
        let seq = Sequence::new(0x10);
        assert_eq!(seq.cur_val(&store).unwrap(), 0);
        assert_eq!(seq.next_val(&mut store).unwrap(), 1);
        assert_eq!(seq.next_val(&mut store).unwrap(), 2);
        assert_eq!(seq.cur_val(&store).unwrap(), 2);
    }

    #[test]
    fn test_rolls_back_with_transaction() {
        let mut store = MemoryKvStore::new();
        let seq = Sequence::new(0x10);
        seq.init_val(&mut store, 7).unwrap();
        {
            let mut tx = Transaction::new(&mut store);
            assert_eq!(seq.next_val(&mut tx).unwrap(), 8);
        }
        assert_eq!(seq.cur_val(&store).unwrap(), 7);
    }
}
