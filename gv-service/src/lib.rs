//! GV Service - Group Governance Handlers
//!
//! Applies group, group account, proposal and vote messages to an indexed
//! store:
//! - [`GroupService`] runs each message in its own transaction
//! - [`GroupKeeper`] holds the tables and the injected capabilities
//! - Aggregate votes are checked with one BLS aggregate verification per
//!   submission against the members' registered keys
//! - [`GroupQuery`] serves paginated read-only projections

mod account;
mod aggregate;
pub mod capability;
mod group;
pub mod keeper;
mod proposal;
pub mod query;
pub mod service;
pub mod state;
pub mod telemetry;
mod vote;

pub use capability::{
    Clock, HandlerRouter, KeyRegistry, ManualClock, MemoryKeyRegistry, MsgRouter, SystemClock,
};
pub use keeper::GroupKeeper;
pub use query::{GroupQuery, TallyResult};
pub use service::GroupService;
pub use state::GroupState;
