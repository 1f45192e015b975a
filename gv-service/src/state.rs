//! Table layout
//!
//! | Prefix | Contents |
//! |--------|----------|
//! | `0x01` | group rows, `group_id BE` |
//! | `0x02` | group id sequence |
//! | `0x03` | groups by admin |
//! | `0x10` | group member rows, `group_id BE \|\| address` |
//! | `0x11` | members by group |
//! | `0x12` | members by address |
//! | `0x20` | group account rows, `address` |
//! | `0x21` | group account derivation sequence |
//! | `0x22` | group accounts by group |
//! | `0x23` | group accounts by admin |
//! | `0x30` | proposal rows, `proposal_id BE` |
//! | `0x31` | proposal id sequence |
//! | `0x32` | proposals by group account |
//! | `0x33` | proposals by proposer |
//! | `0x40` | vote rows, `proposal_id BE \|\| voter` |
//! | `0x41` | votes by proposal |
//! | `0x42` | votes by voter |

use std::sync::Arc;

use gv_core::{Address, GroupAccountInfo, GroupInfo, GroupMember, Proposal, Vote};
use gv_store::{AutoUInt64Table, Index, JsonCodec, PrimaryKeyTable, Sequence, UInt64Index};

pub const GROUP_TABLE: u8 = 0x01;
pub const GROUP_SEQ: u8 = 0x02;
pub const GROUP_BY_ADMIN: u8 = 0x03;

pub const GROUP_MEMBER_TABLE: u8 = 0x10;
pub const GROUP_MEMBER_BY_GROUP: u8 = 0x11;
pub const GROUP_MEMBER_BY_MEMBER: u8 = 0x12;

pub const GROUP_ACCOUNT_TABLE: u8 = 0x20;
pub const GROUP_ACCOUNT_SEQ: u8 = 0x21;
pub const GROUP_ACCOUNT_BY_GROUP: u8 = 0x22;
pub const GROUP_ACCOUNT_BY_ADMIN: u8 = 0x23;

pub const PROPOSAL_TABLE: u8 = 0x30;
pub const PROPOSAL_SEQ: u8 = 0x31;
pub const PROPOSAL_BY_GROUP_ACCOUNT: u8 = 0x32;
pub const PROPOSAL_BY_PROPOSER: u8 = 0x33;

pub const VOTE_TABLE: u8 = 0x40;
pub const VOTE_BY_PROPOSAL: u8 = 0x41;
pub const VOTE_BY_VOTER: u8 = 0x42;

/// Vote primary key: `proposal_id BE || voter`
pub fn vote_key(proposal_id: u64, voter: &Address) -> Vec<u8> {
    let mut key = proposal_id.to_be_bytes().to_vec();
    key.extend_from_slice(voter.as_bytes());
    key
}

/// All tables and indexes of the group module
pub struct GroupState {
    pub groups: AutoUInt64Table<GroupInfo>,
    pub group_by_admin: Arc<Index<GroupInfo>>,

    pub members: PrimaryKeyTable<GroupMember>,
    pub member_by_group: Arc<UInt64Index<GroupMember>>,
    pub member_by_member: Arc<Index<GroupMember>>,

    pub accounts: PrimaryKeyTable<GroupAccountInfo>,
    pub account_seq: Sequence,
    pub account_by_group: Arc<UInt64Index<GroupAccountInfo>>,
    pub account_by_admin: Arc<Index<GroupAccountInfo>>,

    pub proposals: AutoUInt64Table<Proposal>,
    pub proposal_by_account: Arc<Index<Proposal>>,
    pub proposal_by_proposer: Arc<Index<Proposal>>,

    pub votes: PrimaryKeyTable<Vote>,
    pub vote_by_proposal: Arc<UInt64Index<Vote>>,
    pub vote_by_voter: Arc<Index<Vote>>,
}

impl GroupState {
    pub fn new() -> Self {
        let group_by_admin = Arc::new(Index::single(GROUP_BY_ADMIN, |g: &GroupInfo| {
            g.admin.as_bytes().to_vec()
        }));
        let groups = AutoUInt64Table::new(GROUP_TABLE, GROUP_SEQ, JsonCodec, |g: &GroupInfo| {
            g.group_id
        })
        .with_index(group_by_admin.clone());

        let member_by_group = Arc::new(UInt64Index::new(GROUP_MEMBER_BY_GROUP, |m: &GroupMember| {
            m.group_id
        }));
        let member_by_member = Arc::new(Index::single(GROUP_MEMBER_BY_MEMBER, |m: &GroupMember| {
            m.member.address.as_bytes().to_vec()
        }));
        let members = PrimaryKeyTable::new(GROUP_MEMBER_TABLE, JsonCodec, |m: &GroupMember| {
            GroupMember::primary_key(m.group_id, &m.member.address)
        })
        .with_index(member_by_group.clone())
        .with_index(member_by_member.clone());

        let account_by_group = Arc::new(UInt64Index::new(
            GROUP_ACCOUNT_BY_GROUP,
            |a: &GroupAccountInfo| a.group_id,
        ));
        let account_by_admin = Arc::new(Index::single(GROUP_ACCOUNT_BY_ADMIN, |a: &GroupAccountInfo| {
            a.admin.as_bytes().to_vec()
        }));
        let accounts = PrimaryKeyTable::new(GROUP_ACCOUNT_TABLE, JsonCodec, |a: &GroupAccountInfo| {
            a.address.as_bytes().to_vec()
        })
        .with_index(account_by_group.clone())
        .with_index(account_by_admin.clone());

        let proposal_by_account = Arc::new(Index::single(PROPOSAL_BY_GROUP_ACCOUNT, |p: &Proposal| {
            p.group_account.as_bytes().to_vec()
        }));
        let proposal_by_proposer = Arc::new(Index::new(PROPOSAL_BY_PROPOSER, |p: &Proposal| {
            p.proposers.iter().map(|a| a.as_bytes().to_vec()).collect()
        }));
        let proposals = AutoUInt64Table::new(PROPOSAL_TABLE, PROPOSAL_SEQ, JsonCodec, |p: &Proposal| {
            p.proposal_id
        })
        .with_index(proposal_by_account.clone())
        .with_index(proposal_by_proposer.clone());

        let vote_by_proposal = Arc::new(UInt64Index::new(VOTE_BY_PROPOSAL, |v: &Vote| v.proposal_id));
        let vote_by_voter = Arc::new(Index::single(VOTE_BY_VOTER, |v: &Vote| {
            v.voter.as_bytes().to_vec()
        }));
        let votes = PrimaryKeyTable::new(VOTE_TABLE, JsonCodec, |v: &Vote| {
            vote_key(v.proposal_id, &v.voter)
        })
        .with_index(vote_by_proposal.clone())
        .with_index(vote_by_voter.clone());

        Self {
            groups,
            group_by_admin,
            members,
            member_by_group,
            member_by_member,
            accounts,
            account_seq: Sequence::new(GROUP_ACCOUNT_SEQ),
            account_by_group,
            account_by_admin,
            proposals,
            proposal_by_account,
            proposal_by_proposer,
            votes,
            vote_by_proposal,
            vote_by_voter,
        }
    }
}

impl Default for GroupState {
    fn default() -> Self {
        Self::new()
    }
}
