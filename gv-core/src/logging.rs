//! Logging Standards and Conventions
//!
//! Handlers log through `tracing` with structured fields. Field names and
//! operation labels are centralized here so every crate emits the same keys.
//!
//! # Log Levels
//!
//! | Level | Usage | Examples |
//! |-------|-------|----------|
//! | ERROR | Store or transaction failure | Commit failed, corrupted row |
//! | WARN  | Rejected state-changing message | Unauthorized signer, bad signature |
//! | INFO  | Committed state change | Group created, proposal closed |
//! | DEBUG | Decision flow | Policy evaluation, slot mapping |
//! | TRACE | Raw payloads | Encoded vote bytes |
//!
//! # Examples
//!
//! ```ignore
//! use tracing::info;
//! use gv_core::logging::{fields, operations};
//!
//! info!(
//!     operation = operations::VOTE_AGG,
//!     proposal_id = proposal.proposal_id,
//!     count = votes.len(),
//!     "Aggregate vote accepted"
//! );
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level enumeration matching tracing levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// Parse from string, case-insensitive
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Standard log field names
pub mod fields {
    pub const OPERATION: &str = "operation";
    pub const GROUP_ID: &str = "group_id";
    pub const GROUP_ACCOUNT: &str = "group_account";
    pub const PROPOSAL_ID: &str = "proposal_id";
    pub const VOTER: &str = "voter";
    pub const SIGNER: &str = "signer";
    pub const STATUS: &str = "status";
    pub const RESULT: &str = "result";
    pub const COUNT: &str = "count";
    pub const ERROR: &str = "error";
    pub const CODE: &str = "code";
}

/// Operation labels, one per message kind
pub mod operations {
    pub const CREATE_GROUP: &str = "create_group";
    pub const UPDATE_GROUP_MEMBERS: &str = "update_group_members";
    pub const UPDATE_GROUP_ADMIN: &str = "update_group_admin";
    pub const UPDATE_GROUP_METADATA: &str = "update_group_metadata";
    pub const CREATE_GROUP_ACCOUNT: &str = "create_group_account";
    pub const UPDATE_GROUP_ACCOUNT_ADMIN: &str = "update_group_account_admin";
    pub const UPDATE_GROUP_ACCOUNT_POLICY: &str = "update_group_account_policy";
    pub const UPDATE_GROUP_ACCOUNT_METADATA: &str = "update_group_account_metadata";
    pub const CREATE_PROPOSAL: &str = "create_proposal";
    pub const VOTE: &str = "vote";
    pub const VOTE_AGG: &str = "vote_agg";
    pub const EXEC: &str = "exec";
    pub const COMMIT: &str = "commit";
}

/// Install the global subscriber
///
/// `RUST_LOG` wins over `level` when set. Calling this twice is a no-op.
pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(LogLevel::parse("error"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("INFO"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("invalid"), None);
    }

    #[test]
    fn test_default_level() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Debug.to_string(), "debug");
    }

    #[test]
    fn test_init_twice() {
        init_tracing(LogLevel::Debug);
        init_tracing(LogLevel::Info);
    }
}
