//! Store error types

use gv_core::GovError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Backend(String),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Entity already exists: {0}")]
    AlreadyExists(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid page cursor: {0}")]
    InvalidCursor(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for GovError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists(what) => GovError::AlreadyExists(what),
            StoreError::InvalidCursor(reason) => {
                GovError::InvalidArgument(format!("invalid page cursor: {}", reason))
            }
            other => GovError::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_core::ErrorKind;

    #[test]
    fn test_into_gov_error() {
        let err: GovError = StoreError::Backend("disk".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.code(), "INTERNAL_STORE_ERROR");

        let err: GovError = StoreError::AlreadyExists("row".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: GovError = StoreError::InvalidCursor("outside range".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
