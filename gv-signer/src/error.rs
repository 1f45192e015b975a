//! Error types for the BLS signer

use thiserror::Error;

/// Signer errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    /// Key or signature bytes are not a valid point encoding (FAILS_DECODE)
    #[error("Decode failed: {0}")]
    FailsDecode(String),

    #[error("Message count {msgs} does not match key set count {key_sets}")]
    LengthMismatch { msgs: usize, key_sets: usize },

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl SignerError {
    /// Stable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            Self::FailsDecode(_) => "FAILS_DECODE",
            Self::LengthMismatch { .. } => "LENGTH_MISMATCH",
            Self::Crypto(_) => "CRYPTO",
        }
    }
}

/// Result type for signer operations
pub type SignerResult<T> = Result<T, SignerError>;
