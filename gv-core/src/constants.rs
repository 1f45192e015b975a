//! Protocol Constants
//!
//! Domain tags, module names and default limits.

// ============================================================================
// Domain Tags
// ============================================================================

/// Prefix of every canonical vote payload
pub const VOTE_BASIC_TAG: &[u8] = b"gv:VoteBasic:v1\0";

/// Module name used when deriving group account addresses
pub const GROUP_ACCOUNT_MODULE: &[u8] = b"gv/group-account";

// ============================================================================
// Addresses
// ============================================================================

/// Length of a derived group account address
pub const DERIVED_ADDRESS_LEN: usize = 20;

/// Maximum accepted address length
pub const MAX_ADDRESS_LEN: usize = 255;

// ============================================================================
// Defaults
// ============================================================================

/// Default maximum metadata length in bytes
pub const DEFAULT_MAX_METADATA_LEN: usize = 255;

/// Default maximum number of messages carried by a proposal
pub const DEFAULT_MAX_PROPOSAL_MSGS: usize = 64;

/// Default maximum members in a single create/update message
pub const DEFAULT_MAX_MEMBERS: usize = 1000;

/// Default page size for list queries
pub const DEFAULT_PAGE_LIMIT: usize = 50;

/// Upper bound on requested page size
pub const DEFAULT_MAX_PAGE_LIMIT: usize = 100;

/// Largest year representable in the canonical deadline encoding
pub const MAX_DEADLINE_YEAR: i32 = 9999;

/// Compressed G2 signature length carried by aggregate votes
pub const AGG_SIG_LEN: usize = 96;
