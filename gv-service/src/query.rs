//! Read-only queries
//!
//! Listing queries take a [`PageRequest`] whose cursor is the `next_key` of a
//! previous response. The limit is clamped by the configured page bounds.

use gv_core::{
    Address, DecisionPolicyResult, GovError, GovResult, GroupAccountInfo, GroupInfo, GroupMember,
    PolicyEvaluator, Proposal, ProposalResult, ProposalStatus, Tally, Vote,
};
use gv_store::{KvStore, PageRequest, PageResponse};
use serde::{Deserialize, Serialize};

use crate::keeper::GroupKeeper;
use crate::state::vote_key;

/// Current tally of a proposal and the decision it would produce now
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub proposal_id: u64,
    pub tally: Tally,
    pub decision: DecisionPolicyResult,
    pub status: ProposalStatus,
    pub result: ProposalResult,
}

/// Query view over a store snapshot
pub struct GroupQuery<'a> {
    keeper: &'a GroupKeeper,
    store: &'a dyn KvStore,
}

impl<'a> GroupQuery<'a> {
    pub fn new(keeper: &'a GroupKeeper, store: &'a dyn KvStore) -> Self {
        Self { keeper, store }
    }

    fn page(&self, page: &PageRequest) -> PageRequest {
        PageRequest {
            key: page.key.clone(),
            limit: self.keeper.config.page_limit(page.limit),
        }
    }

    // ============================================================
    // Groups
    // ============================================================

    pub fn group_info(&self, group_id: u64) -> GovResult<GroupInfo> {
        self.keeper.load_group(self.store, group_id)
    }

    /// Members of a group in address byte order
    pub fn group_members(
        &self,
        group_id: u64,
        page: &PageRequest,
    ) -> GovResult<(Vec<GroupMember>, PageResponse)> {
        let (pks, resp) = self.keeper.state.member_by_group.primary_keys(
            self.store,
            group_id,
            &self.page(page),
        )?;
        Ok((self.keeper.state.members.get_many(self.store, &pks)?, resp))
    }

    pub fn groups_by_admin(
        &self,
        admin: &Address,
        page: &PageRequest,
    ) -> GovResult<(Vec<GroupInfo>, PageResponse)> {
        let (pks, resp) = self.keeper.state.group_by_admin.primary_keys(
            self.store,
            admin.as_bytes(),
            &self.page(page),
        )?;
        Ok((self.keeper.state.groups.get_many(self.store, &pks)?, resp))
    }

    /// Groups `member` belongs to, in group id order
    pub fn groups_by_member(
        &self,
        member: &Address,
        page: &PageRequest,
    ) -> GovResult<(Vec<GroupInfo>, PageResponse)> {
        let (pks, resp) = self.keeper.state.member_by_member.primary_keys(
            self.store,
            member.as_bytes(),
            &self.page(page),
        )?;
        let memberships = self.keeper.state.members.get_many(self.store, &pks)?;
        let groups = memberships
            .iter()
            .map(|m| self.keeper.load_group(self.store, m.group_id))
            .collect::<GovResult<Vec<_>>>()?;
        Ok((groups, resp))
    }

    // ============================================================
    // Group accounts
    // ============================================================

    pub fn group_account_info(&self, address: &Address) -> GovResult<GroupAccountInfo> {
        self.keeper.load_account(self.store, address)
    }

    pub fn group_accounts_by_group(
        &self,
        group_id: u64,
        page: &PageRequest,
    ) -> GovResult<(Vec<GroupAccountInfo>, PageResponse)> {
        let (pks, resp) = self.keeper.state.account_by_group.primary_keys(
            self.store,
            group_id,
            &self.page(page),
        )?;
        Ok((self.keeper.state.accounts.get_many(self.store, &pks)?, resp))
    }

    pub fn group_accounts_by_admin(
        &self,
        admin: &Address,
        page: &PageRequest,
    ) -> GovResult<(Vec<GroupAccountInfo>, PageResponse)> {
        let (pks, resp) = self.keeper.state.account_by_admin.primary_keys(
            self.store,
            admin.as_bytes(),
            &self.page(page),
        )?;
        Ok((self.keeper.state.accounts.get_many(self.store, &pks)?, resp))
    }

    // ============================================================
    // Proposals
    // ============================================================

    pub fn proposal(&self, proposal_id: u64) -> GovResult<Proposal> {
        self.keeper.load_proposal(self.store, proposal_id)
    }

    pub fn proposals_by_group_account(
        &self,
        address: &Address,
        page: &PageRequest,
    ) -> GovResult<(Vec<Proposal>, PageResponse)> {
        let (pks, resp) = self.keeper.state.proposal_by_account.primary_keys(
            self.store,
            address.as_bytes(),
            &self.page(page),
        )?;
        Ok((self.keeper.state.proposals.get_many(self.store, &pks)?, resp))
    }

    pub fn proposals_by_proposer(
        &self,
        proposer: &Address,
        page: &PageRequest,
    ) -> GovResult<(Vec<Proposal>, PageResponse)> {
        let (pks, resp) = self.keeper.state.proposal_by_proposer.primary_keys(
            self.store,
            proposer.as_bytes(),
            &self.page(page),
        )?;
        Ok((self.keeper.state.proposals.get_many(self.store, &pks)?, resp))
    }

    // ============================================================
    // Votes
    // ============================================================

    pub fn vote(&self, proposal_id: u64, voter: &Address) -> GovResult<Vote> {
        self.keeper
            .state
            .votes
            .get(self.store, &vote_key(proposal_id, voter))?
            .ok_or_else(|| GovError::VoteNotFound {
                proposal_id,
                voter: voter.to_hex(),
            })
    }

    pub fn votes_by_proposal(
        &self,
        proposal_id: u64,
        page: &PageRequest,
    ) -> GovResult<(Vec<Vote>, PageResponse)> {
        let (pks, resp) = self.keeper.state.vote_by_proposal.primary_keys(
            self.store,
            proposal_id,
            &self.page(page),
        )?;
        Ok((self.keeper.state.votes.get_many(self.store, &pks)?, resp))
    }

    pub fn votes_by_voter(
        &self,
        voter: &Address,
        page: &PageRequest,
    ) -> GovResult<(Vec<Vote>, PageResponse)> {
        let (pks, resp) = self.keeper.state.vote_by_voter.primary_keys(
            self.store,
            voter.as_bytes(),
            &self.page(page),
        )?;
        Ok((self.keeper.state.votes.get_many(self.store, &pks)?, resp))
    }

    /// Evaluate the policy at the current time without writing
    ///
    /// An open proposal reports what its next touch would persist: ABORTED
    /// when the group or account changed since submission, REJECTED once
    /// the timeout has passed. Aborted proposals report a final rejection.
    pub fn tally_result(&self, proposal_id: u64) -> GovResult<TallyResult> {
        let mut proposal = self.proposal(proposal_id)?;
        let decision = match proposal.status {
            ProposalStatus::Submitted => {
                let account = self.keeper.load_account(self.store, &proposal.group_account)?;
                let group = self.keeper.load_group(self.store, account.group_id)?;
                if GroupKeeper::versions_match(&proposal, &account, &group) {
                    let decision = account.decision_policy.allow(
                        &proposal.vote_state,
                        group.total_weight,
                        self.keeper.now() - proposal.submit_time,
                    )?;
                    proposal.apply_decision(decision);
                    decision
                } else {
                    proposal.abort();
                    DecisionPolicyResult::REJECT
                }
            }
            ProposalStatus::Aborted => DecisionPolicyResult::REJECT,
            ProposalStatus::Closed => match proposal.result {
                ProposalResult::Accepted => DecisionPolicyResult::ACCEPT,
                ProposalResult::Rejected => DecisionPolicyResult::REJECT,
                ProposalResult::Unfinalized => DecisionPolicyResult::OPEN,
            },
        };
        Ok(TallyResult {
            proposal_id,
            tally: proposal.vote_state,
            decision,
            status: proposal.status,
            result: proposal.result,
        })
    }
}
