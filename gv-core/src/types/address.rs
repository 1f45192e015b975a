//! Opaque account addresses
//!
//! An address is a byte string. Its lexicographic byte order is the canonical
//! member order used for vote slot assignment.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::constants::{DERIVED_ADDRESS_LEN, MAX_ADDRESS_LEN};
use crate::error::{GovError, GovResult};

/// Opaque account address, ordered by raw bytes
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(Vec<u8>);

impl Address {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(s: &str) -> GovResult<Self> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| GovError::InvalidArgument(format!("invalid address hex: {}", e)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Derive a module-owned address: `SHA-256(module || key)[..20]`
    pub fn derive(module: &[u8], key: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(module);
        hasher.update(key);
        let digest = hasher.finalize();
        Self(digest[..DERIVED_ADDRESS_LEN].to_vec())
    }

    /// Reject empty or oversized addresses
    pub fn validate(&self, field: &str) -> GovResult<()> {
        if self.0.is_empty() {
            return Err(GovError::InvalidArgument(format!("{} address is empty", field)));
        }
        if self.0.len() > MAX_ADDRESS_LEN {
            return Err(GovError::InvalidArgument(format!(
                "{} address length {} exceeds {}",
                field,
                self.0.len(),
                MAX_ADDRESS_LEN
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl From<&[u8]> for Address {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Address {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_order() {
        let a = Address::new(vec![0x01, 0xff]);
        let b = Address::new(vec![0x02]);
        let c = Address::new(vec![0x01, 0xff, 0x00]);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let a = Address::derive(b"gv/group-account", &1u64.to_be_bytes());
        let b = Address::derive(b"gv/group-account", &1u64.to_be_bytes());
        let c = Address::derive(b"gv/group-account", &2u64.to_be_bytes());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_bytes().len(), DERIVED_ADDRESS_LEN);
    }

    #[test]
    fn test_validate() {
        assert!(Address::default().validate("admin").is_err());
        assert!(Address::new(vec![0u8; 256]).validate("admin").is_err());
        assert!(Address::new(vec![1u8; 20]).validate("admin").is_ok());
    }

    #[test]
    fn test_serde_hex() {
        let addr = Address::new(vec![0xab, 0xcd]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"abcd\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
