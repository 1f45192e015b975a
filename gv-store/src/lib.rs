//! GV Store - Indexed Entity Store
//!
//! A small ORM over ordered key-value backends:
//! - [`KvStore`] backends: in-memory `BTreeMap` and `sled`
//! - [`Transaction`] overlays that commit as one batch or not at all
//! - [`PrimaryKeyTable`] / [`AutoUInt64Table`] typed tables
//! - [`Index`] / [`UInt64Index`] secondary indexes kept in step with rows
//! - Cursor pagination over range scans

pub mod codec;
pub mod config;
pub mod error;
pub mod index;
pub mod kv;
pub mod memory;
pub mod page;
pub mod sequence;
pub mod sled_store;
pub mod table;
pub mod transaction;

pub use codec::{JsonCodec, RowCodec};
pub use config::{Backend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use index::{Index, Indexer, UInt64Index};
pub use kv::{BatchOp, KvPair, KvStore};
pub use memory::MemoryKvStore;
pub use page::{PageRequest, PageResponse};
pub use sequence::Sequence;
pub use sled_store::SledKvStore;
pub use table::{AutoUInt64Table, PrimaryKeyTable};
pub use transaction::Transaction;
