//! Aggregate vote collection
//!
//! Each member signs `VoteBasic{proposal_id, choice, deadline}` off-chain and a
//! relayer submits one aggregate signature with the vote vector. Slot `i`
//! belongs to the i-th member in address byte order. Slots are bucketed by
//! choice; each non-empty bucket contributes one distinct message and the
//! public keys of its voters to a single aggregate verification.
//!
//! The submission is all-or-nothing: one duplicate voter or a bad signature
//! rejects every slot.

use chrono::{DateTime, Utc};
use gv_core::canon::{encode_vote_basic, format_deadline};
use gv_core::logging::operations;
use gv_core::msgs::{Exec, MsgResponse, MsgVoteAggregate};
use gv_core::{
    Choice, GovError, GovResult, GroupMember, ProposalResult, Vote, VoteBasic,
};
use gv_signer::{aggregate_verify, BlsPublicKey};
use gv_store::KvStore;
use tracing::{debug, info, warn};

use crate::keeper::GroupKeeper;
use crate::state::vote_key;

/// Voters and keys for one choice
struct ChoiceBucket {
    choice: Choice,
    public_keys: Vec<BlsPublicKey>,
}

impl GroupKeeper {
    pub(crate) fn vote_aggregate(
        &self,
        store: &mut dyn KvStore,
        msg: &MsgVoteAggregate,
    ) -> GovResult<MsgResponse> {
        let now = self.now();
        if msg.deadline <= now {
            warn!(
                operation = operations::VOTE_AGG,
                proposal_id = msg.proposal_id,
                "Aggregate submission past its deadline"
            );
            return Err(GovError::DeadlinePassed {
                deadline: format_deadline(&msg.deadline)?,
                now: format_deadline(&now)?,
            });
        }

        let (mut proposal, account, group) = self.load_open_proposal(store, msg.proposal_id)?;
        self.check_voting_period(store, &mut proposal, &account, &group, now)?;

        let members = self.load_members(store, group.group_id)?;
        if msg.votes.len() != members.len() {
            return Err(GovError::WrongVoteVectorLength {
                expected: members.len(),
                actual: msg.votes.len(),
            });
        }

        let voting: Vec<(&GroupMember, Choice)> = members
            .iter()
            .zip(msg.votes.iter().copied())
            .filter(|(_, choice)| choice.is_specified())
            .collect();
        debug!(
            proposal_id = proposal.proposal_id,
            members = members.len(),
            count = voting.len(),
            "Vote vector mapped to members"
        );

        for (member, _) in &voting {
            let voter = &member.member.address;
            if self.state.votes.has(store, &vote_key(proposal.proposal_id, voter))? {
                warn!(
                    operation = operations::VOTE_AGG,
                    proposal_id = proposal.proposal_id,
                    voter = %voter,
                    "Aggregate submission repeats a recorded voter"
                );
                return Err(GovError::DuplicateVoter {
                    proposal_id: proposal.proposal_id,
                    voter: voter.to_hex(),
                });
            }
        }

        let buckets = self.bucket_by_choice(&voting)?;
        self.verify_aggregate(proposal.proposal_id, msg.deadline, &msg.agg_sig, &buckets)?;

        for (member, choice) in &voting {
            self.state.votes.create(
                store,
                &Vote {
                    proposal_id: proposal.proposal_id,
                    voter: member.member.address.clone(),
                    choice: *choice,
                    metadata: msg.metadata.clone(),
                    submit_time: now,
                },
            )?;
            proposal.vote_state.add(*choice, member.member.weight)?;
        }
        info!(
            operation = operations::VOTE_AGG,
            proposal_id = proposal.proposal_id,
            sender = %msg.sender,
            count = voting.len(),
            "Aggregate votes recorded"
        );

        self.tally_and_close(&mut proposal, &account, &group, now)?;
        if msg.exec == Exec::Try && proposal.result == ProposalResult::Accepted {
            self.execute(store, &mut proposal, &account)?;
        }
        self.state.proposals.update(store, &proposal)?;
        Ok(MsgResponse::proposal(&proposal))
    }

    /// Group voters' keys by choice in YES, NO, ABSTAIN, VETO order, skipping empty buckets
    fn bucket_by_choice(&self, voting: &[(&GroupMember, Choice)]) -> GovResult<Vec<ChoiceBucket>> {
        let mut buckets = Vec::new();
        for choice in Choice::VOTING {
            let mut public_keys = Vec::new();
            for (member, _) in voting.iter().filter(|(_, c)| *c == choice) {
                let address = &member.member.address;
                let pk = self.keys.public_key(address).ok_or_else(|| {
                    GovError::MissingPublicKey {
                        address: address.to_hex(),
                    }
                })?;
                public_keys.push(pk);
            }
            if !public_keys.is_empty() {
                debug!(choice = %choice, count = public_keys.len(), "Choice bucket");
                buckets.push(ChoiceBucket {
                    choice,
                    public_keys,
                });
            }
        }
        Ok(buckets)
    }

    fn verify_aggregate(
        &self,
        proposal_id: u64,
        deadline: DateTime<Utc>,
        agg_sig: &[u8],
        buckets: &[ChoiceBucket],
    ) -> GovResult<()> {
        let mut msgs = Vec::with_capacity(buckets.len());
        let mut pk_sets = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            msgs.push(encode_vote_basic(&VoteBasic {
                proposal_id,
                choice: bucket.choice,
                deadline,
            })?);
            pk_sets.push(bucket.public_keys.clone());
        }

        match aggregate_verify(&msgs, true, agg_sig, &pk_sets) {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    operation = operations::VOTE_AGG,
                    proposal_id,
                    "Aggregate signature rejected"
                );
                Err(GovError::InvalidSignature)
            }
            Err(e) => {
                warn!(
                    operation = operations::VOTE_AGG,
                    proposal_id,
                    error = %e,
                    "Aggregate signature undecodable"
                );
                Err(GovError::InvalidSignature)
            }
        }
    }
}
