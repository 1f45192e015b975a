//! GV Core - Group Voting Domain
//!
//! Core types and rules for weighted group governance with BLS aggregate votes:
//! - Groups, members and group accounts bound to decision policies
//! - Proposals, votes and the weighted tally
//! - The canonical `VoteBasic` encoding that voters sign
//! - Wire messages with stateless validation
//! - The error taxonomy shared by every crate in the workspace

pub mod canon;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod msgs;
pub mod types;
pub mod validation;

pub use config::GovConfig;
pub use constants::*;
pub use error::*;
pub use types::*;
