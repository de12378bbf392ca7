//! Photo error types.

use photostore_shared::AppError;
use thiserror::Error;

use super::naming::NamingError;
use crate::storage::StoreError;

/// Photo operation errors.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Photo confirmed absent from storage.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Request rejected before touching storage.
    #[error("{0}")]
    Validation(String),

    /// Storage could not complete the operation.
    #[error("storage error: {0}")]
    Storage(StoreError),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PhotoError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<NamingError> for PhotoError {
    fn from(err: NamingError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Keeps "confirmed absent" apart from every other store failure.
impl From<StoreError> for PhotoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => Self::NotFound(key),
            other => Self::Storage(other),
        }
    }
}

impl From<PhotoError> for AppError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::NotFound(path) => Self::NotFound(format!("File not found: {path}")),
            PhotoError::Validation(msg) => Self::Validation(msg),
            PhotoError::Storage(e) => Self::Storage(e.to_string()),
            PhotoError::Internal(msg) => Self::Internal(msg),
        }
    }
}
