//! Error Registry for Group Voting
//!
//! Every failure carries a taxonomy kind (what the caller should do about it)
//! and a stable code (which rule was violated).
//!
//! | Kind | Meaning |
//! |------|---------|
//! | `InvalidArgument` | Malformed input, bad encoding, length overrun |
//! | `NotFound` | Referenced group/account/proposal/member absent |
//! | `Conflict` | Duplicate voter, duplicate member, admin unchanged |
//! | `FailedPrecondition` | Proposal not open, version mismatch, deadline elapsed, insufficient weight |
//! | `InvalidSignature` | BLS aggregate verification or decoding failed |
//! | `Unauthorized` | Signer is not the admin / not a member |
//! | `Internal` | Store or transaction error |

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for group voting operations
pub type GovResult<T> = Result<T, GovError>;

/// Error kind taxonomy surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    Conflict,
    FailedPrecondition,
    InvalidSignature,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::FailedPrecondition => "FAILED_PRECONDITION",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Group voting error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovError {
    // ============================================================
    // Invalid argument
    // ============================================================
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{field} too long: {len} bytes exceeds {max}")]
    MetadataTooLong { field: String, len: usize, max: usize },

    #[error("Invalid decimal {value:?}: {reason}")]
    InvalidDecimal { value: String, reason: String },

    #[error("Vote vector length {actual} does not match member count {expected}")]
    WrongVoteVectorLength { expected: usize, actual: usize },

    #[error("Vote vector contains no votes")]
    EmptyVoteVector,

    #[error("Member {address} has no registered BLS public key")]
    MissingPublicKey { address: String },

    // ============================================================
    // Not found
    // ============================================================
    #[error("Group {group_id} not found")]
    GroupNotFound { group_id: u64 },

    #[error("Group account {address} not found")]
    GroupAccountNotFound { address: String },

    #[error("Proposal {proposal_id} not found")]
    ProposalNotFound { proposal_id: u64 },

    #[error("{address} is not a member of group {group_id}")]
    MemberNotFound { group_id: u64, address: String },

    #[error("No vote by {voter} on proposal {proposal_id}")]
    VoteNotFound { proposal_id: u64, voter: String },

    // ============================================================
    // Conflict
    // ============================================================
    #[error("{voter} already voted on proposal {proposal_id}")]
    DuplicateVoter { proposal_id: u64, voter: String },

    #[error("Duplicate member address {address}")]
    DuplicateMember { address: String },

    #[error("New admin is the same as the current admin")]
    AdminUnchanged,

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    // ============================================================
    // Failed precondition
    // ============================================================
    #[error("Proposal {proposal_id} is not open: status {status}")]
    ProposalNotOpen { proposal_id: u64, status: String },

    #[error("Proposal {proposal_id} aborted: group or group account changed since submission")]
    VersionMismatchAbort { proposal_id: u64 },

    #[error("Vote deadline {deadline} has passed (now {now})")]
    DeadlinePassed { deadline: String, now: String },

    #[error("Voting period of proposal {proposal_id} has ended")]
    VotingPeriodEnded { proposal_id: u64 },

    #[error("Threshold {threshold} exceeds group total weight {total_weight}")]
    InsufficientWeight { threshold: String, total_weight: String },

    #[error("Proposal {proposal_id} cannot be executed: {reason}")]
    NotExecutable { proposal_id: u64, reason: String },

    // ============================================================
    // Signature
    // ============================================================
    #[error("Invalid aggregate signature")]
    InvalidSignature,

    // ============================================================
    // Authorization
    // ============================================================
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // ============================================================
    // Internal
    // ============================================================
    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GovError {
    /// Taxonomy kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_)
            | Self::MetadataTooLong { .. }
            | Self::InvalidDecimal { .. }
            | Self::WrongVoteVectorLength { .. }
            | Self::EmptyVoteVector
            | Self::MissingPublicKey { .. } => ErrorKind::InvalidArgument,

            Self::GroupNotFound { .. }
            | Self::GroupAccountNotFound { .. }
            | Self::ProposalNotFound { .. }
            | Self::MemberNotFound { .. }
            | Self::VoteNotFound { .. } => ErrorKind::NotFound,

            Self::DuplicateVoter { .. }
            | Self::DuplicateMember { .. }
            | Self::AdminUnchanged
            | Self::AlreadyExists(_) => ErrorKind::Conflict,

            Self::ProposalNotOpen { .. }
            | Self::VersionMismatchAbort { .. }
            | Self::DeadlinePassed { .. }
            | Self::VotingPeriodEnded { .. }
            | Self::InsufficientWeight { .. }
            | Self::NotExecutable { .. } => ErrorKind::FailedPrecondition,

            Self::InvalidSignature => ErrorKind::InvalidSignature,

            Self::Unauthorized(_) => ErrorKind::Unauthorized,

            Self::Store(_) | Self::Serialization(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::MetadataTooLong { .. } => "METADATA_TOO_LONG",
            Self::InvalidDecimal { .. } => "INVALID_DECIMAL",
            Self::WrongVoteVectorLength { .. } => "WRONG_VOTE_VECTOR_LENGTH",
            Self::EmptyVoteVector => "EMPTY_VOTE_VECTOR",
            Self::MissingPublicKey { .. } => "MISSING_PUBLIC_KEY",
            Self::GroupNotFound { .. } => "GROUP_NOT_FOUND",
            Self::GroupAccountNotFound { .. } => "GROUP_ACCOUNT_NOT_FOUND",
            Self::ProposalNotFound { .. } => "PROPOSAL_NOT_FOUND",
            Self::MemberNotFound { .. } => "MEMBER_NOT_FOUND",
            Self::VoteNotFound { .. } => "VOTE_NOT_FOUND",
            Self::DuplicateVoter { .. } => "DUPLICATE_VOTER",
            Self::DuplicateMember { .. } => "DUPLICATE_MEMBER",
            Self::AdminUnchanged => "ADMIN_UNCHANGED",
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::ProposalNotOpen { .. } => "PROPOSAL_NOT_OPEN",
            Self::VersionMismatchAbort { .. } => "VERSION_MISMATCH_ABORT",
            Self::DeadlinePassed { .. } => "DEADLINE_PASSED",
            Self::VotingPeriodEnded { .. } => "VOTING_PERIOD_ENDED",
            Self::InsufficientWeight { .. } => "INSUFFICIENT_WEIGHT",
            Self::NotExecutable { .. } => "PROPOSAL_NOT_EXECUTABLE",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Store(_) => "INTERNAL_STORE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the enclosing transaction is committed despite the rejection
    ///
    /// Only lazy finalization writes qualify: marking a proposal ABORTED on a
    /// version mismatch, and closing it once its voting period has elapsed.
    pub fn commits_state(&self) -> bool {
        matches!(
            self,
            Self::VersionMismatchAbort { .. } | Self::VotingPeriodEnded { .. }
        )
    }
}

impl From<serde_json::Error> for GovError {
    fn from(err: serde_json::Error) -> Self {
        GovError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_codes() {
        let err = GovError::DuplicateVoter {
            proposal_id: 1,
            voter: "aa".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), "DUPLICATE_VOTER");

        assert_eq!(GovError::InvalidSignature.kind(), ErrorKind::InvalidSignature);
        assert_eq!(
            GovError::WrongVoteVectorLength { expected: 5, actual: 4 }.kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            GovError::Store("io".to_string()).code(),
            "INTERNAL_STORE_ERROR"
        );
    }

    #[test]
    fn test_commits_state() {
        assert!(GovError::VersionMismatchAbort { proposal_id: 1 }.commits_state());
        assert!(GovError::VotingPeriodEnded { proposal_id: 1 }.commits_state());
        assert!(!GovError::InvalidSignature.commits_state());
        assert!(!GovError::ProposalNotFound { proposal_id: 1 }.commits_state());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ErrorKind::FailedPrecondition.to_string(), "FAILED_PRECONDITION");
    }
}
