//! Message delivery
//!
//! [`GroupService`] owns the backing store and runs every message inside one
//! transaction: stateless validation first, then the handler. A handler error
//! discards the transaction, except for the lazy closures that rejections
//! must persist (see [`gv_core::GovError::commits_state`]).

use std::sync::Arc;
use std::time::Instant;

use gv_core::logging::fields;
use gv_core::msgs::{Msg, MsgResponse, ValidateBasic};
use gv_core::{GovConfig, GovResult};
use gv_store::{KvStore, Transaction};
use tracing::{info, warn};

use crate::capability::{Clock, KeyRegistry, MsgRouter};
use crate::keeper::GroupKeeper;
use crate::query::GroupQuery;
use crate::telemetry;

pub struct GroupService<S: KvStore> {
    store: S,
    keeper: GroupKeeper,
}

impl<S: KvStore> GroupService<S> {
    pub fn new(
        store: S,
        config: GovConfig,
        clock: Arc<dyn Clock>,
        keys: Arc<dyn KeyRegistry>,
        router: Arc<dyn MsgRouter>,
    ) -> Self {
        Self {
            store,
            keeper: GroupKeeper::new(config, clock, keys, router),
        }
    }

    /// Host entry point: `GV_*` configuration with logging installed
    pub fn from_env(
        store: S,
        clock: Arc<dyn Clock>,
        keys: Arc<dyn KeyRegistry>,
        router: Arc<dyn MsgRouter>,
    ) -> Self {
        let config = GovConfig::from_env();
        config.init_logging();
        info!(log_level = %config.log_level, "Group service configured");
        Self::new(store, config, clock, keys, router)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keeper(&self) -> &GroupKeeper {
        &self.keeper
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read-only view of the committed state
    pub fn query(&self) -> GroupQuery<'_> {
        GroupQuery::new(&self.keeper, &self.store)
    }

    /// Validate and apply one message atomically
    pub fn deliver(&mut self, msg: &Msg) -> GovResult<MsgResponse> {
        let operation = msg.operation();
        let started = Instant::now();
        let result = self.apply(operation, msg);
        telemetry::record_message(
            operation,
            result.as_ref().err(),
            started.elapsed().as_secs_f64(),
        );
        result
    }

    fn apply(&mut self, operation: &'static str, msg: &Msg) -> GovResult<MsgResponse> {
        msg.validate_basic(&self.keeper.config)?;

        let mut tx = Transaction::new(&mut self.store);
        match self.keeper.handle(&mut tx, msg) {
            Ok(resp) => {
                let writes = tx.pending();
                tx.commit()?;
                info!(
                    { fields::OPERATION } = operation,
                    { fields::COUNT } = writes,
                    "Message applied"
                );
                Ok(resp)
            }
            Err(err) => {
                if err.commits_state() {
                    tx.commit()?;
                } else {
                    tx.discard();
                }
                warn!(
                    { fields::OPERATION } = operation,
                    { fields::CODE } = err.code(),
                    { fields::ERROR } = %err,
                    "Message rejected"
                );
                Err(err)
            }
        }
    }

    /// Deliver messages in order, stopping at the first failure
    pub fn deliver_all(&mut self, msgs: &[Msg]) -> GovResult<Vec<MsgResponse>> {
        msgs.iter().map(|msg| self.deliver(msg)).collect()
    }
}

impl<S: KvStore> std::fmt::Debug for GroupService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupService")
            .field("config", &self.keeper.config)
            .finish_non_exhaustive()
    }
}
