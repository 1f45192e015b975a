//! Wire messages
//!
//! Every message implements [`ValidateBasic`], the stateless checks run
//! before any store access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::GovConfig;
use crate::constants::AGG_SIG_LEN;
use crate::error::{GovError, GovResult};
use crate::logging::operations;
use crate::types::decimal::{parse_non_negative, parse_positive};
use crate::types::{
    Address, Choice, DecisionPolicy, ExecutorResult, Proposal, ProposalMsg, ProposalResult,
    ProposalStatus,
};
use crate::validation::{
    validate_metadata, validate_msg_count, validate_proposers, validate_unique_addresses,
};

/// Whether an accepted proposal is executed in the same message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Exec {
    #[default]
    Unspecified,
    Try,
}

/// Stateless message validation
pub trait ValidateBasic {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()>;
}

/// A member entry as carried on the wire; weight is a decimal string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRequest {
    pub address: Address,
    pub weight: String,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
}

impl MemberRequest {
    pub fn new(address: Address, weight: impl Into<String>) -> Self {
        Self {
            address,
            weight: weight.into(),
            metadata: Vec::new(),
        }
    }

    fn validate(&self, allow_zero: bool, cfg: &GovConfig) -> GovResult<()> {
        self.address.validate("member")?;
        if allow_zero {
            parse_non_negative(&self.weight)?;
        } else {
            parse_positive(&self.weight)?;
        }
        validate_metadata("member metadata", &self.metadata, cfg.max_metadata_len)
    }
}

fn validate_member_list(members: &[MemberRequest], allow_zero: bool, cfg: &GovConfig) -> GovResult<()> {
    if members.len() > cfg.max_members {
        return Err(GovError::InvalidArgument(format!(
            "{} members exceeds limit {}",
            members.len(),
            cfg.max_members
        )));
    }
    for m in members {
        m.validate(allow_zero, cfg)?;
    }
    validate_unique_addresses(members.iter().map(|m| &m.address))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateGroup {
    pub admin: Address,
    pub members: Vec<MemberRequest>,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
}

impl ValidateBasic for MsgCreateGroup {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        validate_metadata("group metadata", &self.metadata, cfg.max_metadata_len)?;
        validate_member_list(&self.members, false, cfg)
    }
}

/// Weight `"0"` removes the member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupMembers {
    pub admin: Address,
    pub group_id: u64,
    pub member_updates: Vec<MemberRequest>,
}

impl ValidateBasic for MsgUpdateGroupMembers {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        if self.member_updates.is_empty() {
            return Err(GovError::InvalidArgument("member updates must not be empty".to_string()));
        }
        validate_member_list(&self.member_updates, true, cfg)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupAdmin {
    pub admin: Address,
    pub group_id: u64,
    pub new_admin: Address,
}

impl ValidateBasic for MsgUpdateGroupAdmin {
    fn validate_basic(&self, _cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        self.new_admin.validate("new admin")?;
        if self.admin == self.new_admin {
            return Err(GovError::AdminUnchanged);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupMetadata {
    pub admin: Address,
    pub group_id: u64,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
}

impl ValidateBasic for MsgUpdateGroupMetadata {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        validate_metadata("group metadata", &self.metadata, cfg.max_metadata_len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateGroupAccount {
    pub admin: Address,
    pub group_id: u64,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
    pub decision_policy: DecisionPolicy,
}

impl ValidateBasic for MsgCreateGroupAccount {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        validate_metadata("group account metadata", &self.metadata, cfg.max_metadata_len)?;
        self.decision_policy.validate_basic()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupAccountAdmin {
    pub admin: Address,
    pub address: Address,
    pub new_admin: Address,
}

impl ValidateBasic for MsgUpdateGroupAccountAdmin {
    fn validate_basic(&self, _cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        self.address.validate("group account")?;
        self.new_admin.validate("new admin")?;
        if self.admin == self.new_admin {
            return Err(GovError::AdminUnchanged);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupAccountDecisionPolicy {
    pub admin: Address,
    pub address: Address,
    pub decision_policy: DecisionPolicy,
}

impl ValidateBasic for MsgUpdateGroupAccountDecisionPolicy {
    fn validate_basic(&self, _cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        self.address.validate("group account")?;
        self.decision_policy.validate_basic()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateGroupAccountMetadata {
    pub admin: Address,
    pub address: Address,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
}

impl ValidateBasic for MsgUpdateGroupAccountMetadata {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.admin.validate("admin")?;
        self.address.validate("group account")?;
        validate_metadata("group account metadata", &self.metadata, cfg.max_metadata_len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgCreateProposal {
    /// Group account the proposal acts for
    pub address: Address,
    pub proposers: Vec<Address>,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
    pub msgs: Vec<ProposalMsg>,
    #[serde(default)]
    pub exec: Exec,
}

impl ValidateBasic for MsgCreateProposal {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.address.validate("group account")?;
        validate_proposers(&self.proposers)?;
        validate_metadata("proposal metadata", &self.metadata, cfg.max_metadata_len)?;
        validate_msg_count(self.msgs.len(), cfg.max_proposal_msgs)?;
        for msg in &self.msgs {
            if msg.type_url.is_empty() {
                return Err(GovError::InvalidArgument("proposal message without type".to_string()));
            }
        }
        Ok(())
    }
}

/// Single-signer vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVote {
    pub proposal_id: u64,
    pub voter: Address,
    pub choice: Choice,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
    #[serde(default)]
    pub exec: Exec,
}

impl ValidateBasic for MsgVote {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.voter.validate("voter")?;
        if !self.choice.is_specified() {
            return Err(GovError::InvalidArgument("vote choice is unspecified".to_string()));
        }
        validate_metadata("vote metadata", &self.metadata, cfg.max_metadata_len)
    }
}

/// Relayed aggregate of many members' basic votes
///
/// `votes[i]` is the choice of the i-th group member in address byte order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgVoteAggregate {
    pub sender: Address,
    pub proposal_id: u64,
    pub votes: Vec<Choice>,
    pub deadline: DateTime<Utc>,
    #[serde(with = "crate::types::bytes")]
    pub agg_sig: Vec<u8>,
    #[serde(with = "crate::types::bytes")]
    pub metadata: Vec<u8>,
    #[serde(default)]
    pub exec: Exec,
}

impl ValidateBasic for MsgVoteAggregate {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        self.sender.validate("sender")?;
        if !self.votes.iter().any(|c| c.is_specified()) {
            return Err(GovError::EmptyVoteVector);
        }
        if self.agg_sig.len() != AGG_SIG_LEN {
            return Err(GovError::InvalidArgument(format!(
                "aggregate signature must be {} bytes, got {}",
                AGG_SIG_LEN,
                self.agg_sig.len()
            )));
        }
        validate_metadata("vote metadata", &self.metadata, cfg.max_metadata_len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgExec {
    pub proposal_id: u64,
    pub signer: Address,
}

impl ValidateBasic for MsgExec {
    fn validate_basic(&self, _cfg: &GovConfig) -> GovResult<()> {
        self.signer.validate("signer")
    }
}

/// Any state-changing message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    CreateGroup(MsgCreateGroup),
    UpdateGroupMembers(MsgUpdateGroupMembers),
    UpdateGroupAdmin(MsgUpdateGroupAdmin),
    UpdateGroupMetadata(MsgUpdateGroupMetadata),
    CreateGroupAccount(MsgCreateGroupAccount),
    UpdateGroupAccountAdmin(MsgUpdateGroupAccountAdmin),
    UpdateGroupAccountDecisionPolicy(MsgUpdateGroupAccountDecisionPolicy),
    UpdateGroupAccountMetadata(MsgUpdateGroupAccountMetadata),
    CreateProposal(MsgCreateProposal),
    Vote(MsgVote),
    VoteAggregate(MsgVoteAggregate),
    Exec(MsgExec),
}

impl Msg {
    /// Operation label used in logs
    pub fn operation(&self) -> &'static str {
        match self {
            Self::CreateGroup(_) => operations::CREATE_GROUP,
            Self::UpdateGroupMembers(_) => operations::UPDATE_GROUP_MEMBERS,
            Self::UpdateGroupAdmin(_) => operations::UPDATE_GROUP_ADMIN,
            Self::UpdateGroupMetadata(_) => operations::UPDATE_GROUP_METADATA,
            Self::CreateGroupAccount(_) => operations::CREATE_GROUP_ACCOUNT,
            Self::UpdateGroupAccountAdmin(_) => operations::UPDATE_GROUP_ACCOUNT_ADMIN,
            Self::UpdateGroupAccountDecisionPolicy(_) => operations::UPDATE_GROUP_ACCOUNT_POLICY,
            Self::UpdateGroupAccountMetadata(_) => operations::UPDATE_GROUP_ACCOUNT_METADATA,
            Self::CreateProposal(_) => operations::CREATE_PROPOSAL,
            Self::Vote(_) => operations::VOTE,
            Self::VoteAggregate(_) => operations::VOTE_AGG,
            Self::Exec(_) => operations::EXEC,
        }
    }
}

impl ValidateBasic for Msg {
    fn validate_basic(&self, cfg: &GovConfig) -> GovResult<()> {
        match self {
            Self::CreateGroup(m) => m.validate_basic(cfg),
            Self::UpdateGroupMembers(m) => m.validate_basic(cfg),
            Self::UpdateGroupAdmin(m) => m.validate_basic(cfg),
            Self::UpdateGroupMetadata(m) => m.validate_basic(cfg),
            Self::CreateGroupAccount(m) => m.validate_basic(cfg),
            Self::UpdateGroupAccountAdmin(m) => m.validate_basic(cfg),
            Self::UpdateGroupAccountDecisionPolicy(m) => m.validate_basic(cfg),
            Self::UpdateGroupAccountMetadata(m) => m.validate_basic(cfg),
            Self::CreateProposal(m) => m.validate_basic(cfg),
            Self::Vote(m) => m.validate_basic(cfg),
            Self::VoteAggregate(m) => m.validate_basic(cfg),
            Self::Exec(m) => m.validate_basic(cfg),
        }
    }
}

/// Handler output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MsgResponse {
    CreateGroup { group_id: u64 },
    CreateGroupAccount { address: Address },
    CreateProposal { proposal_id: u64 },
    /// Proposal state after a vote or exec message
    Proposal {
        proposal_id: u64,
        status: ProposalStatus,
        result: ProposalResult,
        executor_result: ExecutorResult,
    },
    Empty,
}

impl MsgResponse {
    pub fn proposal(p: &Proposal) -> Self {
        Self::Proposal {
            proposal_id: p.proposal_id,
            status: p.status,
            result: p.result,
            executor_result: p.executor_result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn addr(b: u8) -> Address {
        Address::new(vec![b; 20])
    }

    #[test]
    fn test_create_group_rejects_duplicates_and_zero_weight() {
        let cfg = GovConfig::default();
        let msg = MsgCreateGroup {
            admin: addr(1),
            members: vec![MemberRequest::new(addr(2), "1"), MemberRequest::new(addr(2), "2")],
            metadata: vec![],
        };
        assert_eq!(msg.validate_basic(&cfg).unwrap_err().code(), "DUPLICATE_MEMBER");

        let msg = MsgCreateGroup {
            admin: addr(1),
            members: vec![MemberRequest::new(addr(2), "0")],
            metadata: vec![],
        };
        assert_eq!(msg.validate_basic(&cfg).unwrap_err().code(), "INVALID_DECIMAL");
    }

    #[test]
    fn test_update_members_allows_zero() {
        let cfg = GovConfig::default();
        let msg = MsgUpdateGroupMembers {
            admin: addr(1),
            group_id: 1,
            member_updates: vec![MemberRequest::new(addr(2), "0")],
        };
        assert!(msg.validate_basic(&cfg).is_ok());
    }

    #[test]
    fn test_same_admin_conflict() {
        let msg = MsgUpdateGroupAdmin {
            admin: addr(1),
            group_id: 1,
            new_admin: addr(1),
        };
        let err = msg.validate_basic(&GovConfig::default()).unwrap_err();
        assert_eq!(err.code(), "ADMIN_UNCHANGED");
    }

    #[test]
    fn test_metadata_ceiling_from_config() {
        let cfg = GovConfig {
            max_metadata_len: 4,
            ..GovConfig::default()
        };
        let msg = MsgUpdateGroupMetadata {
            admin: addr(1),
            group_id: 1,
            metadata: vec![0; 5],
        };
        assert_eq!(msg.validate_basic(&cfg).unwrap_err().code(), "METADATA_TOO_LONG");
    }

    #[test]
    fn test_aggregate_checks() {
        let cfg = GovConfig::default();
        let mut msg = MsgVoteAggregate {
            sender: addr(1),
            proposal_id: 1,
            votes: vec![Choice::Unspecified, Choice::Unspecified],
            deadline: Utc::now(),
            agg_sig: vec![0; 96],
            metadata: vec![],
            exec: Exec::Unspecified,
        };
        assert_eq!(msg.validate_basic(&cfg).unwrap_err(), GovError::EmptyVoteVector);

        msg.votes[1] = Choice::Yes;
        assert!(msg.validate_basic(&cfg).is_ok());

        msg.agg_sig.pop();
        assert_eq!(msg.validate_basic(&cfg).unwrap_err().code(), "INVALID_ARGUMENT");
    }

    #[test]
    fn test_vote_requires_choice() {
        let msg = MsgVote {
            proposal_id: 1,
            voter: addr(1),
            choice: Choice::Unspecified,
            metadata: vec![],
            exec: Exec::Try,
        };
        assert!(msg.validate_basic(&GovConfig::default()).is_err());
    }

    #[test]
    fn test_msg_dispatch_and_serde() {
        let msg = Msg::CreateGroupAccount(MsgCreateGroupAccount {
            admin: addr(1),
            group_id: 1,
            metadata: vec![],
            decision_policy: DecisionPolicy::threshold("1", Duration::from_secs(60)).unwrap(),
        });
        assert!(msg.validate_basic(&GovConfig::default()).is_ok());
        assert_eq!(msg.operation(), operations::CREATE_GROUP_ACCOUNT);

        let json = serde_json::to_string(&msg).unwrap();
        let back: Msg = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
