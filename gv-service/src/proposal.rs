//! Proposal submission and execution

use gv_core::logging::operations;
use gv_core::msgs::{Exec, MsgCreateProposal, MsgExec, MsgResponse};
use gv_core::{
    Choice, ExecutorResult, GovError, GovResult, PolicyEvaluator, Proposal, ProposalResult,
    ProposalStatus, Tally, Vote,
};
use gv_store::KvStore;
use tracing::{info, warn};

use crate::keeper::GroupKeeper;

impl GroupKeeper {
    pub(crate) fn create_proposal(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgCreateProposal,
    ) -> GovResult<MsgResponse> {
        let account = self.load_account(store, &msg.address)?;
        let group = self.load_group(store, account.group_id)?;

        let mut proposers = msg.proposers.clone();
        proposers.sort();
        proposers.dedup();
        let mut proposer_weights = Vec::with_capacity(proposers.len());
        for proposer in &proposers {
            let member = self
                .load_member(store, group.group_id, proposer)?
                .ok_or_else(|| {
                    GovError::Unauthorized(format!(
                        "proposer {} is not a member of group {}",
                        proposer, group.group_id
                    ))
                })?;
            proposer_weights.push(member.member.weight);
        }

        let now = self.now();
        let timeout = now
            .checked_add_signed(account.decision_policy.timeout())
            .ok_or_else(|| GovError::InvalidArgument("proposal timeout overflows".to_string()))?;

        let mut proposal = self.state.proposals.create(store, |proposal_id| Proposal {
            proposal_id,
            group_account: account.address.clone(),
            metadata: msg.metadata.clone(),
            proposers: proposers.clone(),
            submit_time: now,
            group_version: group.version,
            group_account_version: account.version,
            status: ProposalStatus::Submitted,
            result: ProposalResult::Unfinalized,
            vote_state: Tally::default(),
            timeout,
            executor_result: ExecutorResult::NotRun,
            msgs: msg.msgs.clone(),
        })?;

        info!(
            operation = operations::CREATE_PROPOSAL,
            proposal_id = proposal.proposal_id,
            group_account = %account.address,
            count = proposal.msgs.len(),
            "Proposal submitted"
        );

        if msg.exec == Exec::Try {
            for (proposer, weight) in proposers.iter().zip(proposer_weights) {
                self.state.votes.create(
                    store,
                    &Vote {
                        proposal_id: proposal.proposal_id,
                        voter: proposer.clone(),
                        choice: Choice::Yes,
                        metadata: Vec::new(),
                        submit_time: now,
                    },
                )?;
                proposal.vote_state.add(Choice::Yes, weight)?;
            }
            self.tally_and_close(&mut proposal, &account, &group, now)?;
            self.execute(store, &mut proposal, &account)?;
            self.state.proposals.update(store, &proposal)?;
        }

        Ok(MsgResponse::CreateProposal {
            proposal_id: proposal.proposal_id,
        })
    }

    /// Finalize a proposal if its outcome is settled and run it if accepted
    ///
    /// A proposal closed by this call is persisted even when rejected. A
    /// proposal that was already closed must still be runnable.
    pub(crate) fn exec(&self, store: &mut dyn KvStore, msg: &MsgExec) -> GovResult<MsgResponse> {
        let mut proposal = self.load_proposal(store, msg.proposal_id)?;
        if proposal.status == ProposalStatus::Aborted {
            return Err(GovError::ProposalNotOpen {
                proposal_id: proposal.proposal_id,
                status: proposal.status.to_string(),
            });
        }
        let account = self.load_account(store, &proposal.group_account)?;

        let mut closed_now = false;
        if proposal.is_open() {
            let group = self.load_group(store, account.group_id)?;
            self.check_versions(store, &mut proposal, &account, &group)?;
            self.tally_and_close(&mut proposal, &account, &group, self.now())?;
            closed_now = !proposal.is_open();
        }

        if !proposal.is_executable() && !closed_now {
            let reason = match (proposal.status, proposal.result, proposal.executor_result) {
                (ProposalStatus::Submitted, _, _) => "voting is still open".to_string(),
                (_, ProposalResult::Rejected, _) => "proposal was rejected".to_string(),
                (_, _, done) => format!("already executed with {}", done),
            };
            warn!(
                operation = operations::EXEC,
                proposal_id = proposal.proposal_id,
                signer = %msg.signer,
                reason = %reason,
                "Exec rejected"
            );
            return Err(GovError::NotExecutable {
                proposal_id: proposal.proposal_id,
                reason,
            });
        }

        self.execute(store, &mut proposal, &account)?;
        self.state.proposals.update(store, &proposal)?;
        Ok(MsgResponse::proposal(&proposal))
    }
}
