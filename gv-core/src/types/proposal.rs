//! Proposals and their lifecycle enums

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::Address;
use super::policy::DecisionPolicyResult;
use super::tally::Tally;

/// Proposal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    Submitted,
    Closed,
    Aborted,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Closed => "CLOSED",
            Self::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalResult {
    Unfinalized,
    Accepted,
    Rejected,
}

impl ProposalResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unfinalized => "UNFINALIZED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ProposalResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running the proposal's messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutorResult {
    NotRun,
    Success,
    Failure,
}

impl ExecutorResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRun => "NOT_RUN",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for ExecutorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque inner message executed under the group account's authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalMsg {
    pub type_url: String,
    #[serde(with = "super::bytes")]
    pub value: Vec<u8>,
}

impl ProposalMsg {
    pub fn new(type_url: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            type_url: type_url.into(),
            value: value.into(),
        }
    }
}

/// A proposal against a group account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: u64,
    pub group_account: Address,
    #[serde(with = "super::bytes")]
    pub metadata: Vec<u8>,
    /// Sorted, deduplicated
    pub proposers: Vec<Address>,
    pub submit_time: DateTime<Utc>,
    /// Group version captured at submission
    pub group_version: u64,
    /// Group account version captured at submission
    pub group_account_version: u64,
    pub status: ProposalStatus,
    pub result: ProposalResult,
    pub vote_state: Tally,
    /// `submit_time + policy.timeout`
    pub timeout: DateTime<Utc>,
    pub executor_result: ExecutorResult,
    pub msgs: Vec<ProposalMsg>,
}

impl Proposal {
    pub fn is_open(&self) -> bool {
        self.status == ProposalStatus::Submitted
    }

    /// Apply a final policy decision; returns whether the proposal closed
    pub fn apply_decision(&mut self, decision: DecisionPolicyResult) -> bool {
        if !self.is_open() || !decision.is_final {
            return false;
        }
        self.status = ProposalStatus::Closed;
        self.result = if decision.allow {
            ProposalResult::Accepted
        } else {
            ProposalResult::Rejected
        };
        true
    }

    pub fn abort(&mut self) {
        self.status = ProposalStatus::Aborted;
    }

    /// Whether the executor may run now
    pub fn is_executable(&self) -> bool {
        self.status == ProposalStatus::Closed
            && self.result == ProposalResult::Accepted
            && self.executor_result == ExecutorResult::NotRun
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_proposal() -> Proposal {
        let now = Utc::now();
        Proposal {
            proposal_id: 1,
            group_account: Address::new(vec![9; 20]),
            metadata: vec![],
            proposers: vec![Address::new(vec![1])],
            submit_time: now,
            group_version: 1,
            group_account_version: 1,
            status: ProposalStatus::Submitted,
            result: ProposalResult::Unfinalized,
            vote_state: Tally::default(),
            timeout: now + chrono::Duration::hours(1),
            executor_result: ExecutorResult::NotRun,
            msgs: vec![],
        }
    }

    #[test]
    fn test_open_decision_keeps_status() {
        let mut p = open_proposal();
        assert!(!p.apply_decision(DecisionPolicyResult::OPEN));
        assert_eq!(p.status, ProposalStatus::Submitted);
        assert_eq!(p.result, ProposalResult::Unfinalized);
    }

    #[test]
    fn test_close_sets_result() {
        let mut p = open_proposal();
        assert!(p.apply_decision(DecisionPolicyResult::ACCEPT));
        assert_eq!(p.status, ProposalStatus::Closed);
        assert_eq!(p.result, ProposalResult::Accepted);
        assert!(p.is_executable());

        // closed proposals ignore later decisions
        assert!(!p.apply_decision(DecisionPolicyResult::REJECT));
        assert_eq!(p.result, ProposalResult::Accepted);
    }

    #[test]
    fn test_rejected_is_not_executable() {
        let mut p = open_proposal();
        p.apply_decision(DecisionPolicyResult::REJECT);
        assert_eq!(p.result, ProposalResult::Rejected);
        assert!(!p.is_executable());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&ExecutorResult::NotRun).unwrap(),
            "\"NOT_RUN\""
        );
        assert_eq!(ProposalStatus::Aborted.to_string(), "ABORTED");
    }
}
