//! Group keeper
//!
//! Owns the table layout and the injected capabilities. Handlers take the
//! store explicitly; the caller decides whether their writes commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gv_core::logging::operations;
use gv_core::msgs::{Msg, MsgResponse};
use gv_core::{
    Address, DecisionPolicyResult, ExecutorResult, GovConfig, GovError, GovResult,
    GroupAccountInfo, GroupInfo, GroupMember, PolicyEvaluator, Proposal,
};
use gv_store::{KvStore, Transaction};
use tracing::{debug, info, warn};

use crate::capability::{Clock, KeyRegistry, MsgRouter};
use crate::state::GroupState;
use crate::telemetry;

pub struct GroupKeeper {
    pub(crate) state: GroupState,
    pub(crate) config: GovConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) keys: Arc<dyn KeyRegistry>,
    pub(crate) router: Arc<dyn MsgRouter>,
}

impl GroupKeeper {
    pub fn new(
        config: GovConfig,
        clock: Arc<dyn Clock>,
        keys: Arc<dyn KeyRegistry>,
        router: Arc<dyn MsgRouter>,
    ) -> Self {
        Self {
            state: GroupState::new(),
            config,
            clock,
            keys,
            router,
        }
    }

    pub fn config(&self) -> &GovConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Route a validated message to its handler
    pub(crate) fn handle(&self, store: &mut dyn KvStore, msg: &Msg) -> GovResult<MsgResponse> {
        match msg {
            Msg::CreateGroup(m) => self.create_group(store, m),
            Msg::UpdateGroupMembers(m) => self.update_group_members(store, m),
            Msg::UpdateGroupAdmin(m) => self.update_group_admin(store, m),
            Msg::UpdateGroupMetadata(m) => self.update_group_metadata(store, m),
            Msg::CreateGroupAccount(m) => self.create_group_account(store, m),
            Msg::UpdateGroupAccountAdmin(m) => self.update_group_account_admin(store, m),
            Msg::UpdateGroupAccountDecisionPolicy(m) => {
                self.update_group_account_decision_policy(store, m)
            }
            Msg::UpdateGroupAccountMetadata(m) => self.update_group_account_metadata(store, m),
            Msg::CreateProposal(m) => self.create_proposal(store, m),
            Msg::Vote(m) => self.vote(store, m),
            Msg::VoteAggregate(m) => self.vote_aggregate(store, m),
            Msg::Exec(m) => self.exec(store, m),
        }
    }

    // ============================================================
    // Loaders
    // ============================================================

    pub(crate) fn load_group(&self, store: &dyn KvStore, group_id: u64) -> GovResult<GroupInfo> {
        self.state
            .groups
            .get(store, group_id)?
            .ok_or(GovError::GroupNotFound { group_id })
    }

    pub(crate) fn load_account(
        &self,
        store: &dyn KvStore,
        address: &Address,
    ) -> GovResult<GroupAccountInfo> {
        self.state
            .accounts
            .get(store, address.as_bytes())?
            .ok_or_else(|| GovError::GroupAccountNotFound {
                address: address.to_hex(),
            })
    }

    pub(crate) fn load_proposal(&self, store: &dyn KvStore, proposal_id: u64) -> GovResult<Proposal> {
        self.state
            .proposals
            .get(store, proposal_id)?
            .ok_or(GovError::ProposalNotFound { proposal_id })
    }

    pub(crate) fn load_member(
        &self,
        store: &dyn KvStore,
        group_id: u64,
        address: &Address,
    ) -> GovResult<Option<GroupMember>> {
        Ok(self
            .state
            .members
            .get(store, &GroupMember::primary_key(group_id, address))?)
    }

    /// Every member of a group in address byte order
    pub(crate) fn load_members(&self, store: &dyn KvStore, group_id: u64) -> GovResult<Vec<GroupMember>> {
        let (pks, _) = self
            .state
            .member_by_group
            .primary_keys(store, group_id, &Default::default())?;
        Ok(self.state.members.get_many(store, &pks)?)
    }

    pub(crate) fn ensure_admin(expected: &Address, signer: &Address, what: &str) -> GovResult<()> {
        if expected != signer {
            warn!(signer = %signer, "Rejected non-admin signer");
            return Err(GovError::Unauthorized(format!(
                "{} is not the admin of the {}",
                signer, what
            )));
        }
        Ok(())
    }

    // ============================================================
    // Proposal lifecycle helpers
    // ============================================================

    /// Load a proposal that is still accepting votes
    ///
    /// A proposal whose group or group account changed since submission is
    /// marked ABORTED and the call fails with `VersionMismatchAbort`; the
    /// caller's transaction must still commit that write.
    pub(crate) fn load_open_proposal(
        &self,
        store: &mut dyn KvStore,
        proposal_id: u64,
    ) -> GovResult<(Proposal, GroupAccountInfo, GroupInfo)> {
        let mut proposal = self.load_proposal(store, proposal_id)?;
        if !proposal.is_open() {
            return Err(GovError::ProposalNotOpen {
                proposal_id,
                status: proposal.status.to_string(),
            });
        }
        let account = self.load_account(store, &proposal.group_account)?;
        let group = self.load_group(store, account.group_id)?;
        self.check_versions(store, &mut proposal, &account, &group)?;
        Ok((proposal, account, group))
    }

    /// Whether the group and account are unchanged since submission
    pub(crate) fn versions_match(
        proposal: &Proposal,
        account: &GroupAccountInfo,
        group: &GroupInfo,
    ) -> bool {
        proposal.group_version == group.version
            && proposal.group_account_version == account.version
    }

    pub(crate) fn check_versions(
        &self,
        store: &mut dyn KvStore,
        proposal: &mut Proposal,
        account: &GroupAccountInfo,
        group: &GroupInfo,
    ) -> GovResult<()> {
        if Self::versions_match(proposal, account, group) {
            return Ok(());
        }
        proposal.abort();
        self.state.proposals.update(store, proposal)?;
        warn!(
            proposal_id = proposal.proposal_id,
            group_version = group.version,
            account_version = account.version,
            "Proposal aborted on version mismatch"
        );
        Err(GovError::VersionMismatchAbort {
            proposal_id: proposal.proposal_id,
        })
    }

    /// Reject votes once the policy timeout has elapsed, closing the proposal
    pub(crate) fn check_voting_period(
        &self,
        store: &mut dyn KvStore,
        proposal: &mut Proposal,
        account: &GroupAccountInfo,
        group: &GroupInfo,
        now: DateTime<Utc>,
    ) -> GovResult<()> {
        if now < proposal.timeout {
            return Ok(());
        }
        self.tally_and_close(proposal, account, group, now)?;
        self.state.proposals.update(store, proposal)?;
        warn!(
            proposal_id = proposal.proposal_id,
            result = %proposal.result,
            "Voting period ended; proposal closed"
        );
        Err(GovError::VotingPeriodEnded {
            proposal_id: proposal.proposal_id,
        })
    }

    /// Evaluate the policy at `now` and close the proposal if the decision is final
    pub(crate) fn tally_and_close(
        &self,
        proposal: &mut Proposal,
        account: &GroupAccountInfo,
        group: &GroupInfo,
        now: DateTime<Utc>,
    ) -> GovResult<DecisionPolicyResult> {
        let decision = account.decision_policy.allow(
            &proposal.vote_state,
            group.total_weight,
            now - proposal.submit_time,
        )?;
        debug!(
            proposal_id = proposal.proposal_id,
            allow = decision.allow,
            is_final = decision.is_final,
            "Decision policy evaluated"
        );
        if proposal.apply_decision(decision) {
            telemetry::record_proposal_closed(proposal.result);
            info!(
                proposal_id = proposal.proposal_id,
                result = %proposal.result,
                "Proposal closed"
            );
        }
        Ok(decision)
    }

    /// Run an accepted proposal's messages under the group account's authority
    ///
    /// Inner writes go to a nested transaction: all of them land on success,
    /// none on failure. Either way the outcome is recorded on the proposal.
    pub(crate) fn execute(
        &self,
        store: &mut dyn KvStore,
        proposal: &mut Proposal,
        account: &GroupAccountInfo,
    ) -> GovResult<()> {
        if !proposal.is_executable() {
            return Ok(());
        }

        let mut inner = Transaction::new(store);
        let outcome = proposal
            .msgs
            .iter()
            .try_for_each(|msg| self.router.dispatch(&mut inner, &account.address, msg));

        match outcome {
            Ok(()) => {
                inner.commit()?;
                proposal.executor_result = ExecutorResult::Success;
                telemetry::record_execution(proposal.executor_result);
                info!(
                    operation = operations::EXEC,
                    proposal_id = proposal.proposal_id,
                    count = proposal.msgs.len(),
                    "Proposal executed"
                );
            }
            Err(e) => {
                inner.discard();
                proposal.executor_result = ExecutorResult::Failure;
                telemetry::record_execution(proposal.executor_result);
                warn!(
                    operation = operations::EXEC,
                    proposal_id = proposal.proposal_id,
                    error = %e,
                    "Proposal execution failed; inner writes reverted"
                );
            }
        }
        Ok(())
    }
}
