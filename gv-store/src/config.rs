//! Backend selection

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{StoreError, StoreResult};
use crate::kv::{BatchOp, KvPair, KvStore};
use crate::memory::MemoryKvStore;
use crate::sled_store::SledKvStore;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sled { path: PathBuf },
}

impl StoreConfig {
    /// Read `GV_STORE_BACKEND` (`memory` | `sled`) and `GV_STORE_PATH`
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("GV_STORE_BACKEND").unwrap_or_else(|| "memory".to_string());
        match backend.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sled" => {
                let path = lookup("GV_STORE_PATH").unwrap_or_else(|| "./data/gv".to_string());
                Ok(Self::Sled { path: PathBuf::from(path) })
            }
            other => Err(StoreError::Backend(format!("unknown store backend {:?}", other))),
        }
    }

    pub fn open(&self) -> StoreResult<Backend> {
        match self {
            Self::Memory => {
                info!(backend = "memory", "Opening store");
                Ok(Backend::Memory(MemoryKvStore::new()))
            }
            Self::Sled { path } => {
                info!(backend = "sled", path = %path.display(), "Opening store");
                Ok(Backend::Sled(SledKvStore::open(path)?))
            }
        }
    }
}

/// Backend chosen at runtime
#[derive(Debug, Clone)]
pub enum Backend {
    Memory(MemoryKvStore),
    Sled(SledKvStore),
}

impl KvStore for Backend {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        match self {
            Self::Memory(s) => s.get(key),
            Self::Sled(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        match self {
            Self::Memory(s) => s.set(key, value),
            Self::Sled(s) => s.set(key, value),
        }
    }

    fn delete(&mut self, key: &[u8]) -> StoreResult<()> {
        match self {
            Self::Memory(s) => s.delete(key),
            Self::Sled(s) => s.delete(key),
        }
    }

    fn scan(
        &self,
        start: &[u8],
        end: Option<&[u8]>,
        limit: Option<usize>,
    ) -> StoreResult<Vec<KvPair>> {
        match self {
            Self::Memory(s) => s.scan(start, end, limit),
            Self::Sled(s) => s.scan(start, end, limit),
        }
    }

    fn write_batch(&mut self, ops: Vec<BatchOp>) -> StoreResult<()> {
        match self {
            Self::Memory(s) => s.write_batch(ops),
            Self::Sled(s) => s.write_batch(ops),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lookup() {
        assert_eq!(StoreConfig::from_lookup(|_| None).unwrap(), StoreConfig::Memory);

        let cfg = StoreConfig::from_lookup(|k| match k {
            "GV_STORE_BACKEND" => Some("SLED".to_string()),
            "GV_STORE_PATH" => Some("/tmp/gv".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg, StoreConfig::Sled { path: PathBuf::from("/tmp/gv") });

        assert!(StoreConfig::from_lookup(|_| Some("rocks".to_string())).is_err());
    }

    #[test]
    fn test_open_sled_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = StoreConfig::Sled { path: dir.path().join("db") };
        let mut backend = cfg.open().unwrap();
        backend.set(b"k", b"v").unwrap();
        assert_eq!(backend.get(b"k").unwrap(), Some(b"v".to_vec()));
    }
}
