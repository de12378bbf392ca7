//! Application-wide error types.

use thiserror::Error;

/// Application error types.
///
/// Client-facing failures (`NotFound`, `Validation`, `PayloadTooLarge`) carry a message that is
/// safe to return. Server-side failures (`Storage`, `Internal`) carry the full
/// detail for logging only; see [`AppError::public_message`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Request body over the configured upload limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Object storage failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::PayloadTooLarge(_) => 413,
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that may be shown to the caller.
    ///
    /// Server errors never expose their inner detail.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(msg) | Self::Validation(msg) | Self::PayloadTooLarge(msg) => msg.clone(),
            Self::Storage(_) => "Storage operation failed".to_string(),
            Self::Internal(_) => "An error occurred".to_string(),
        }
    }
}
