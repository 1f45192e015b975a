//! Group Vote BLS Signer
//!
//! BLS12-381 primitives used to collect votes non-interactively:
//! voters sign a canonical basic vote off-chain, a relayer aggregates the
//! signatures, and the aggregate is checked against per-choice key sets.
//!
//! Ciphersuite: `BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_`
//! - Public keys: 48-byte compressed G1
//! - Signatures: 96-byte compressed G2

pub mod bls;
pub mod error;

pub use bls::*;
pub use error::*;
