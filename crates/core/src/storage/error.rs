//! Storage error types.

use thiserror::Error;

/// Object store operation errors.
///
/// Failures are classified from the store's structured error kind. `NotFound`
/// is the only variant that means the object is confirmed absent.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Operation not supported by the storage provider.
    #[error("operation not supported by storage provider: {0}")]
    Unsupported(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Any other store failure.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StoreError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Classify an OpenDAL error raised while operating on `key`.
    #[must_use]
    pub fn from_opendal(err: &opendal::Error, key: &str) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            opendal::ErrorKind::Unsupported => Self::Unsupported(err.to_string()),
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::Operation(format!("{key}: {err}")),
        }
    }

    /// Returns `true` if the object is confirmed absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_found() {
        let err = opendal::Error::new(opendal::ErrorKind::NotFound, "NoSuchKey");
        let classified = StoreError::from_opendal(&err, "p/f.jpg");
        assert!(classified.is_not_found());
        assert_eq!(classified.to_string(), "object not found: p/f.jpg");
    }

    #[test]
    fn test_classify_permission_denied_is_not_not_found() {
        let err = opendal::Error::new(opendal::ErrorKind::PermissionDenied, "AccessDenied");
        let classified = StoreError::from_opendal(&err, "p/f.jpg");
        assert!(!classified.is_not_found());
        assert!(matches!(classified, StoreError::Operation(ref msg) if msg.starts_with("p/f.jpg")));
    }

    #[test]
    fn test_classify_unexpected_and_unsupported() {
        let err = opendal::Error::new(opendal::ErrorKind::Unexpected, "connection reset");
        assert!(matches!(
            StoreError::from_opendal(&err, "k"),
            StoreError::Operation(_)
        ));

        let err = opendal::Error::new(opendal::ErrorKind::Unsupported, "presign");
        assert!(matches!(
            StoreError::from_opendal(&err, "k"),
            StoreError::Unsupported(_)
        ));
    }
}
