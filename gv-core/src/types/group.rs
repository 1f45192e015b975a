//! Groups, members and group accounts

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::policy::DecisionPolicy;

/// A weighted member set with an admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub group_id: u64,
    pub admin: Address,
    #[serde(with = "super::bytes")]
    pub metadata: Vec<u8>,
    /// Sum of all member weights
    pub total_weight: Decimal,
    /// Starts at 1, bumped on every mutation
    pub version: u64,
}

/// A member and its voting weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub address: Address,
    pub weight: Decimal,
    #[serde(with = "super::bytes")]
    pub metadata: Vec<u8>,
}

/// Membership row keyed by (group_id, address)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub group_id: u64,
    pub member: Member,
}

impl GroupMember {
    /// Primary key: `group_id BE || address`
    pub fn primary_key(group_id: u64, address: &Address) -> Vec<u8> {
        let mut key = Vec::with_capacity(8 + address.as_bytes().len());
        key.extend_from_slice(&group_id.to_be_bytes());
        key.extend_from_slice(address.as_bytes());
        key
    }
}

/// An address whose actions are authorized by a group under a decision policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAccountInfo {
    pub address: Address,
    pub group_id: u64,
    pub admin: Address,
    #[serde(with = "super::bytes")]
    pub metadata: Vec<u8>,
    /// Starts at 1, bumped on every mutation
    pub version: u64,
    pub decision_policy: DecisionPolicy,
    /// Seed the address was derived from
    #[serde(with = "super::bytes")]
    pub derivation_key: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_key_orders_by_group_then_address() {
        let a = GroupMember::primary_key(1, &Address::new(vec![0xff]));
        let b = GroupMember::primary_key(2, &Address::new(vec![0x00]));
        assert!(a < b);
        assert_eq!(&a[..8], &1u64.to_be_bytes());
    }
}
