//! Stateless validation rules shared by every wire message
//!
//! # Rules Implemented
//!
//! 1. **Metadata ceiling**: metadata fields fit within `max_metadata_len`
//! 2. **Unique members**: a member list names each address once
//! 3. **Unique proposers**: proposers form a non-empty set
//! 4. **Message count**: a proposal carries at most `max_proposal_msgs` messages

use std::collections::BTreeSet;

use crate::error::{GovError, GovResult};
use crate::types::Address;

/// Reject metadata longer than `max`
pub fn validate_metadata(field: &str, metadata: &[u8], max: usize) -> GovResult<()> {
    if metadata.len() > max {
        return Err(GovError::MetadataTooLong {
            field: field.to_string(),
            len: metadata.len(),
            max,
        });
    }
    Ok(())
}

/// Reject repeated addresses, reporting the first duplicate
pub fn validate_unique_addresses<'a, I>(addresses: I) -> GovResult<()>
where
    I: IntoIterator<Item = &'a Address>,
{
    let mut seen = BTreeSet::new();
    for address in addresses {
        if !seen.insert(address) {
            return Err(GovError::DuplicateMember {
                address: address.to_hex(),
            });
        }
    }
    Ok(())
}

/// Proposers must be non-empty, valid and distinct
pub fn validate_proposers(proposers: &[Address]) -> GovResult<()> {
    if proposers.is_empty() {
        return Err(GovError::InvalidArgument("proposers must not be empty".to_string()));
    }
    let mut seen = BTreeSet::new();
    for proposer in proposers {
        proposer.validate("proposer")?;
        if !seen.insert(proposer) {
            return Err(GovError::InvalidArgument(format!(
                "duplicate proposer {}",
                proposer
            )));
        }
    }
    Ok(())
}

/// Cap the number of messages a proposal carries
pub fn validate_msg_count(count: usize, max: usize) -> GovResult<()> {
    if count > max {
        return Err(GovError::InvalidArgument(format!(
            "proposal carries {} messages, limit is {}",
            count, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_ceiling() {
        assert!(validate_metadata("metadata", &[0u8; 255], 255).is_ok());
        let err = validate_metadata("metadata", &[0u8; 256], 255).unwrap_err();
        assert_eq!(err.code(), "METADATA_TOO_LONG");
    }

    #[test]
    fn test_unique_addresses() {
        let a = Address::new(vec![1]);
        let b = Address::new(vec![2]);
        assert!(validate_unique_addresses([&a, &b]).is_ok());
        let err = validate_unique_addresses([&a, &b, &a]).unwrap_err();
        assert_eq!(err.code(), "DUPLICATE_MEMBER");
    }

    #[test]
    fn test_proposers() {
        let a = Address::new(vec![1]);
        assert!(validate_proposers(&[]).is_err());
        assert!(validate_proposers(&[a.clone()]).is_ok());
        assert!(validate_proposers(&[a.clone(), a]).is_err());
        assert!(validate_proposers(&[Address::default()]).is_err());
    }

    #[test]
    fn test_msg_count() {
        assert!(validate_msg_count(64, 64).is_ok());
        assert!(validate_msg_count(65, 64).is_err());
    }
}
