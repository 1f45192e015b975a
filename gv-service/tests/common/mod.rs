#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use gv_core::canon::encode_vote_basic;
use gv_core::msgs::{
    Exec, MemberRequest, Msg, MsgCreateGroup, MsgCreateGroupAccount, MsgCreateProposal,
    MsgResponse, MsgVoteAggregate,
};
use gv_core::{Address, Choice, DecisionPolicy, GovError, GovResult, GovConfig, ProposalMsg, VoteBasic};
use gv_service::{GroupService, HandlerRouter, ManualClock, MemoryKeyRegistry};
use gv_signer::{aggregate_decoded_signatures, prove_possession, BlsSecretKey};
use gv_store::{KvPair, KvStore, MemoryKvStore};

pub const PUT: &str = "test/Put";
pub const FAIL: &str = "test/Fail";

/// Key written by the `test/Put` handler
pub fn put_key(value: &[u8]) -> Vec<u8> {
    let mut key = b"app/".to_vec();
    key.extend_from_slice(value);
    key
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn addr(b: u8) -> Address {
    Address::new(vec![b; 20])
}

/// Router with a handler that writes `app/<value> -> authority` and one that
/// writes and then fails
pub fn test_router() -> HandlerRouter {
    HandlerRouter::new()
        .route(PUT, |store, authority, value| {
            store.set(&put_key(value), authority.as_bytes())?;
            Ok(())
        })
        .route(FAIL, |store, _authority, value| {
            store.set(&put_key(value), b"partial")?;
            Err(GovError::InvalidArgument("handler refused".to_string()))
        })
}

pub struct Voter {
    pub address: Address,
    pub weight: &'static str,
    pub key: BlsSecretKey,
}

pub struct Harness<S: KvStore = MemoryKvStore> {
    pub svc: GroupService<S>,
    pub clock: ManualClock,
    pub keys: MemoryKeyRegistry,
    pub admin: Address,
    /// In the order `create_group` submits them
    pub voters: Vec<Voter>,
}

impl Harness<MemoryKvStore> {
    pub fn new(weights: &[&'static str]) -> Self {
        Self::with_store(MemoryKvStore::new(), weights)
    }

    pub fn with_config(weights: &[&'static str], config: GovConfig) -> Self {
        Self::build(MemoryKvStore::new(), numbered(weights), config)
    }
}

/// Voters `addr(1)..` already in address byte order
fn numbered(weights: &[&'static str]) -> Vec<(Address, &'static str)> {
    weights
        .iter()
        .enumerate()
        .map(|(i, &weight)| (addr(i as u8 + 1), weight))
        .collect()
}

impl<S: KvStore> Harness<S> {
    pub fn with_store(store: S, weights: &[&'static str]) -> Self {
        Self::build(store, numbered(weights), GovConfig::default())
    }

    pub fn with_voters(store: S, members: Vec<(Address, &'static str)>) -> Self {
        Self::build(store, members, GovConfig::default())
    }

    pub fn build(store: S, members: Vec<(Address, &'static str)>, config: GovConfig) -> Self {
        let clock = ManualClock::new(start_time());
        let keys = MemoryKeyRegistry::new();
        let voters: Vec<Voter> = members
            .into_iter()
            .enumerate()
            .map(|(i, (address, weight))| {
                let seed = [i as u8 + 1; 32];
                Voter {
                    address,
                    weight,
                    key: BlsSecretKey::from_seed(&seed).unwrap(),
                }
            })
            .collect();
        for v in &voters {
            keys.register(v.address.clone(), v.key.public_key(), &prove_possession(&v.key))
                .unwrap();
        }

        let svc = GroupService::new(
            store,
            config,
            Arc::new(clock.clone()),
            Arc::new(keys.clone()),
            Arc::new(test_router()),
        );
        Self {
            svc,
            clock,
            keys,
            admin: addr(0xAA),
            voters,
        }
    }

    /// Voter addresses in byte order, one per vote vector slot
    pub fn slots(&self) -> Vec<Address> {
        let mut slots: Vec<_> = self.voters.iter().map(|v| v.address.clone()).collect();
        slots.sort();
        slots
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.svc.keeper().now()
    }

    pub fn create_group(&mut self) -> u64 {
        let members = self
            .voters
            .iter()
            .map(|v| MemberRequest::new(v.address.clone(), v.weight))
            .collect();
        let resp = self
            .svc
            .deliver(&Msg::CreateGroup(MsgCreateGroup {
                admin: self.admin.clone(),
                members,
                metadata: b"group".to_vec(),
            }))
            .unwrap();
        match resp {
            MsgResponse::CreateGroup { group_id } => group_id,
            other => panic!("unexpected response {:?}", other),
        }
    }

    pub fn create_account(&mut self, group_id: u64, threshold: &str, timeout: Duration) -> Address {
        let resp = self
            .svc
            .deliver(&Msg::CreateGroupAccount(MsgCreateGroupAccount {
                admin: self.admin.clone(),
                group_id,
                metadata: vec![],
                decision_policy: DecisionPolicy::threshold(threshold, timeout).unwrap(),
            }))
            .unwrap();
        match resp {
            MsgResponse::CreateGroupAccount { address } => address,
            other => panic!("unexpected response {:?}", other),
        }
    }

    pub fn propose(&mut self, account: &Address, msgs: Vec<ProposalMsg>) -> u64 {
        let proposer = self.voters[0].address.clone();
        self.propose_as(account, vec![proposer], msgs, Exec::Unspecified)
            .unwrap()
    }

    pub fn propose_as(
        &mut self,
        account: &Address,
        proposers: Vec<Address>,
        msgs: Vec<ProposalMsg>,
        exec: Exec,
    ) -> GovResult<u64> {
        let resp = self.svc.deliver(&Msg::CreateProposal(MsgCreateProposal {
            address: account.clone(),
            proposers,
            metadata: b"proposal".to_vec(),
            msgs,
            exec,
        }))?;
        match resp {
            MsgResponse::CreateProposal { proposal_id } => Ok(proposal_id),
            other => panic!("unexpected response {:?}", other),
        }
    }

    /// Group, account with `threshold` and a 1h timeout, and one open proposal
    pub fn setup(&mut self, threshold: &str, msgs: Vec<ProposalMsg>) -> (u64, Address, u64) {
        let group_id = self.create_group();
        let account = self.create_account(group_id, threshold, Duration::from_secs(3600));
        let proposal_id = self.propose(&account, msgs);
        (group_id, account, proposal_id)
    }

    /// Each slot's member signs its basic vote; signatures are aggregated
    pub fn sign_votes(
        &self,
        proposal_id: u64,
        slots: &[Address],
        votes: &[Choice],
        deadline: DateTime<Utc>,
    ) -> Vec<u8> {
        let sigs: Vec<_> = slots
            .iter()
            .zip(votes)
            .filter(|(_, c)| c.is_specified())
            .map(|(address, c)| {
                let voter = self
                    .voters
                    .iter()
                    .find(|v| &v.address == address)
                    .expect("slot address is a voter");
                let msg = encode_vote_basic(&VoteBasic {
                    proposal_id,
                    choice: *c,
                    deadline,
                })
                .unwrap();
                voter.key.sign(&msg)
            })
            .collect();
        aggregate_decoded_signatures(&sigs).unwrap().to_bytes().to_vec()
    }

    pub fn aggregate_msg(&self, proposal_id: u64, votes: &[Choice], exec: Exec) -> MsgVoteAggregate {
        self.aggregate_msg_for(proposal_id, &self.slots(), votes, exec)
    }

    pub fn aggregate_msg_for(
        &self,
        proposal_id: u64,
        slots: &[Address],
        votes: &[Choice],
        exec: Exec,
    ) -> MsgVoteAggregate {
        let deadline = self.now() + chrono::Duration::minutes(30);
        MsgVoteAggregate {
            sender: addr(0xEE),
            proposal_id,
            votes: votes.to_vec(),
            deadline,
            agg_sig: self.sign_votes(proposal_id, slots, votes, deadline),
            metadata: vec![],
            exec,
        }
    }

    pub fn submit(&mut self, proposal_id: u64, votes: &[Choice]) -> GovResult<MsgResponse> {
        let msg = self.aggregate_msg(proposal_id, votes, Exec::Unspecified);
        self.svc.deliver(&Msg::VoteAggregate(msg))
    }

    pub fn snapshot(&self) -> Vec<KvPair> {
        self.svc.store().range(&[], None).unwrap()
    }
}
