//! Single-signer votes

use gv_core::logging::operations;
use gv_core::msgs::{Exec, MsgResponse, MsgVote};
use gv_core::{GovError, GovResult, Vote};
use gv_store::KvStore;
use tracing::{info, warn};

use crate::keeper::GroupKeeper;
use crate::state::vote_key;

impl GroupKeeper {
    pub(crate) fn vote(&self, store: &mut dyn KvStore, msg: &MsgVote) -> GovResult<MsgResponse> {
        let now = self.now();
        let (mut proposal, account, group) = self.load_open_proposal(store, msg.proposal_id)?;
        self.check_voting_period(store, &mut proposal, &account, &group, now)?;

        let member = self
            .load_member(store, group.group_id, &msg.voter)?
            .ok_or_else(|| {
                GovError::Unauthorized(format!(
                    "voter {} is not a member of group {}",
                    msg.voter, group.group_id
                ))
            })?;

        if self.state.votes.has(store, &vote_key(proposal.proposal_id, &msg.voter))? {
            warn!(
                operation = operations::VOTE,
                proposal_id = proposal.proposal_id,
                voter = %msg.voter,
                "Duplicate vote rejected"
            );
            return Err(GovError::DuplicateVoter {
                proposal_id: proposal.proposal_id,
                voter: msg.voter.to_hex(),
            });
        }

        self.state.votes.create(
            store,
            &Vote {
                proposal_id: proposal.proposal_id,
                voter: msg.voter.clone(),
                choice: msg.choice,
                metadata: msg.metadata.clone(),
                submit_time: now,
            },
        )?;
        proposal.vote_state.add(msg.choice, member.member.weight)?;
        info!(
            operation = operations::VOTE,
            proposal_id = proposal.proposal_id,
            voter = %msg.voter,
            choice = %msg.choice,
            "Vote recorded"
        );

        self.tally_and_close(&mut proposal, &account, &group, now)?;
        if msg.exec == Exec::Try {
            self.execute(store, &mut proposal, &account)?;
        }
        self.state.proposals.update(store, &proposal)?;
        Ok(MsgResponse::proposal(&proposal))
    }
}
