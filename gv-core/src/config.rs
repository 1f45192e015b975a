//! Group voting configuration
//!
//! Values are read from `GV_*` environment variables, falling back to the
//! defaults in [`crate::constants`].

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::logging::{init_tracing, LogLevel};

/// Limits enforced by message validation and queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovConfig {
    pub max_metadata_len: usize,
    pub max_proposal_msgs: usize,
    pub max_members: usize,
    pub default_page_limit: usize,
    pub max_page_limit: usize,
    pub log_level: LogLevel,
}

impl Default for GovConfig {
    fn default() -> Self {
        Self {
            max_metadata_len: DEFAULT_MAX_METADATA_LEN,
            max_proposal_msgs: DEFAULT_MAX_PROPOSAL_MSGS,
            max_members: DEFAULT_MAX_MEMBERS,
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            log_level: LogLevel::Info,
        }
    }
}

impl GovConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let usize_var = |key: &str, default: usize| {
            lookup(key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };

        Self {
            max_metadata_len: usize_var("GV_MAX_METADATA_LEN", defaults.max_metadata_len),
            max_proposal_msgs: usize_var("GV_MAX_PROPOSAL_MSGS", defaults.max_proposal_msgs),
            max_members: usize_var("GV_MAX_MEMBERS", defaults.max_members),
            default_page_limit: usize_var("GV_DEFAULT_PAGE_LIMIT", defaults.default_page_limit),
            max_page_limit: usize_var("GV_MAX_PAGE_LIMIT", defaults.max_page_limit),
            log_level: lookup("GV_LOG_LEVEL")
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(defaults.log_level),
        }
    }

    /// Install the global tracing subscriber at `log_level`
    pub fn init_logging(&self) {
        init_tracing(self.log_level);
    }

    /// Clamp a requested page size into `1..=max_page_limit`
    pub fn page_limit(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default_page_limit.min(self.max_page_limit).max(1)
        } else {
            requested.min(self.max_page_limit).max(1)
        }
    }
}
