//! Error types for the fieldsync photo queue.

use thiserror::Error;

/// Result type alias using fieldsync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fieldsync operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Required ingest fields missing or malformed; rejected before persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Durable local storage failed (wraps sqlx::Error)
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Queued photo not found
    #[error("Photo not found: {0}")]
    PhotoNotFound(uuid::Uuid),

    /// Disallowed mutation for the record's current sync status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A queue drain is already in progress
    #[error("Upload queue is already being processed")]
    AlreadyRunning,

    /// Upload attempt failed before reaching the remote store
    #[error("Network error: {0}")]
    Network(String),

    /// Remote store rejected the upload (auth, quota, validation)
    #[error("Remote rejection: {0}")]
    RemoteRejection(String),

    /// No authenticated user context available for ingest
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("blob is empty".to_string());
        assert_eq!(err.to_string(), "Validation error: blob is empty");
    }

    #[test]
    fn test_error_display_photo_not_found() {
        let id = Uuid::nil();
        let err = Error::PhotoNotFound(id);
        assert_eq!(err.to_string(), format!("Photo not found: {}", id));
    }

    #[test]
    fn test_error_display_invalid_state() {
        let err = Error::InvalidState("cannot delete while uploading".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid state: cannot delete while uploading"
        );
    }

    #[test]
    fn test_error_display_already_running() {
        let err = Error::AlreadyRunning;
        assert_eq!(err.to_string(), "Upload queue is already being processed");
    }

    #[test]
    fn test_error_display_network() {
        let err = Error::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_error_display_remote_rejection() {
        let err = Error::RemoteRejection("quota exceeded".to_string());
        assert_eq!(err.to_string(), "Remote rejection: quota exceeded");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("no signed-in user".to_string());
        assert_eq!(err.to_string(), "Unauthorized: no signed-in user");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_photo_not_found_with_random_uuid() {
        let id = Uuid::new_v4();
        let err = Error::PhotoNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }
}
