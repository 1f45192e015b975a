//! Capabilities injected into the keeper at construction
//!
//! - [`Clock`]: current block time
//! - [`KeyRegistry`]: member address to BLS public key
//! - [`MsgRouter`]: executes a proposal's inner messages

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use gv_core::{Address, GovError, GovResult, ProposalMsg};
use gv_signer::{verify_possession, BlsPublicKey, BlsSignature};
use gv_store::KvStore;
use tracing::{debug, info};

// ============================================================
// Clock
// ============================================================

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    pub fn set(&self, time: DateTime<Utc>) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now = time;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap_or_else(|e| e.into_inner())
    }
}

// ============================================================
// Key registry
// ============================================================

pub trait KeyRegistry: Send + Sync {
    fn public_key(&self, address: &Address) -> Option<BlsPublicKey>;
}

/// In-memory registry; a key is only accepted with a valid proof of possession
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyRegistry {
    keys: Arc<RwLock<BTreeMap<Address, BlsPublicKey>>>,
}

impl MemoryKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `public_key` to `address`, replacing any previous key
    pub fn register(
        &self,
        address: Address,
        public_key: BlsPublicKey,
        proof: &BlsSignature,
    ) -> GovResult<()> {
        if !verify_possession(&public_key, proof) {
            return Err(GovError::InvalidSignature);
        }
        info!(address = %address, "BLS key registered");
        let mut keys = self.keys.write().unwrap_or_else(|e| e.into_inner());
        keys.insert(address, public_key);
        Ok(())
    }

    pub fn remove(&self, address: &Address) -> Option<BlsPublicKey> {
        let mut keys = self.keys.write().unwrap_or_else(|e| e.into_inner());
        keys.remove(address)
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyRegistry for MemoryKeyRegistry {
    fn public_key(&self, address: &Address) -> Option<BlsPublicKey> {
        let keys = self.keys.read().unwrap_or_else(|e| e.into_inner());
        keys.get(address).cloned()
    }
}

// ============================================================
// Message router
// ============================================================

pub trait MsgRouter: Send + Sync {
    /// Run `msg` with `authority` as its signer
    ///
    /// Writes go to `store`, which is a transaction the caller discards if any
    /// message of the proposal fails.
    fn dispatch(&self, store: &mut dyn KvStore, authority: &Address, msg: &ProposalMsg) -> GovResult<()>;
}

type MsgHandler = Box<dyn Fn(&mut dyn KvStore, &Address, &[u8]) -> GovResult<()> + Send + Sync>;

/// Routes by `type_url` to registered handlers; unknown types fail
#[derive(Default)]
pub struct HandlerRouter {
    handlers: BTreeMap<String, MsgHandler>,
}

impl HandlerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route<F>(mut self, type_url: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut dyn KvStore, &Address, &[u8]) -> GovResult<()> + Send + Sync + 'static,
    {
        self.handlers.insert(type_url.into(), Box::new(handler));
        self
    }
}

impl MsgRouter for HandlerRouter {
    fn dispatch(&self, store: &mut dyn KvStore, authority: &Address, msg: &ProposalMsg) -> GovResult<()> {
        let handler = self.handlers.get(&msg.type_url).ok_or_else(|| {
            GovError::InvalidArgument(format!("no handler for message type {}", msg.type_url))
        })?;
        debug!(type_url = %msg.type_url, authority = %authority, "Dispatching proposal message");
        handler(store, authority, &msg.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gv_signer::{prove_possession, BlsSecretKey};
    use gv_store::MemoryKvStore;

    #[test]
    fn test_manual_clock_shared() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();
        handle.advance(Duration::minutes(30));
        assert_eq!(clock.now(), start + Duration::minutes(30));
        clock.set(start);
        assert_eq!(handle.now(), start);
    }

    #[test]
    fn test_registry_requires_possession() {
        let registry = MemoryKeyRegistry::new();
        let sk = BlsSecretKey::from_seed(&[7u8; 32]).unwrap();
        let other = BlsSecretKey::from_seed(&[8u8; 32]).unwrap();
        let addr = Address::new(vec![1; 20]);

        let err = registry
            .register(addr.clone(), sk.public_key(), &prove_possession(&other))
            .unwrap_err();
        assert_eq!(err, GovError::InvalidSignature);
        assert!(registry.is_empty());

        registry
            .register(addr.clone(), sk.public_key(), &prove_possession(&sk))
            .unwrap();
        assert_eq!(registry.public_key(&addr), Some(sk.public_key()));
        assert!(registry.remove(&addr).is_some());
        assert!(registry.public_key(&addr).is_none());
    }

    #[test]
    fn test_router_dispatch() {
        let router = HandlerRouter::new().route("test/Set", |store, authority, value| {
            store.set(authority.as_bytes(), value)?;
            Ok(())
        });
        let mut store = MemoryKvStore::new();
        let authority = Address::new(vec![3; 20]);

        router
            .dispatch(&mut store, &authority, &ProposalMsg::new("test/Set", b"v".to_vec()))
            .unwrap();
        assert_eq!(store.get(authority.as_bytes()).unwrap(), Some(b"v".to_vec()));

        let err = router
            .dispatch(&mut store, &authority, &ProposalMsg::new("test/Unknown", vec![]))
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
    }
}
