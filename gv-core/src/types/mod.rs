//! Group voting domain types

pub mod address;
pub mod bytes;
pub mod decimal;
pub mod group;
pub mod policy;
pub mod proposal;
pub mod tally;
pub mod vote;

pub use address::Address;
pub use group::{GroupAccountInfo, GroupInfo, GroupMember, Member};
pub use policy::{DecisionPolicy, DecisionPolicyResult, PolicyEvaluator, ThresholdPolicy};
pub use proposal::{ExecutorResult, Proposal, ProposalMsg, ProposalResult, ProposalStatus};
pub use tally::Tally;
pub use vote::{Choice, Vote, VoteBasic};
