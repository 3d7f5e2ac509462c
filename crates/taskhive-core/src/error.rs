//! Error types for taskhive.

use thiserror::Error;

/// Result type alias using taskhive's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for taskhive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Task not found, deleted, or not addressable by the given id
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Malformed input (empty title, oversized batch, bad id)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authenticated but not authorized for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Collaborator is already present in the task's share list
    #[error("Task already shared with user {0}")]
    AlreadyShared(uuid::Uuid),

    /// External AI call exhausted retries or returned unparseable output
    #[error("AI service error: {0}")]
    ExternalService(String),

    /// External service reported a rate-limit/throttle response.
    /// Retryable; the drafting client's backoff loop consumes this.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Filesystem operation on attachment storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation aborted by a cooperative cancellation signal
    #[error("Cancelled: {0}")]
    Cancelled(String),

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
        Error::ExternalService(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_task_not_found() {
        let id = Uuid::nil();
        let err = Error::TaskNotFound(id.to_string());
        assert_eq!(err.to_string(), format!("Task not found: {}", id));
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("title is required".to_string());
        assert_eq!(err.to_string(), "Validation error: title is required");
    }

    #[test]
    fn test_error_display_permission_denied() {
        let err = Error::PermissionDenied("not an editor".to_string());
        assert_eq!(err.to_string(), "Permission denied: not an editor");
    }

    #[test]
    fn test_error_display_already_shared() {
        let id = Uuid::new_v4();
        let err = Error::AlreadyShared(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_display_rate_limited() {
        let err = Error::RateLimited("429 Too Many Requests".to_string());
        assert_eq!(err.to_string(), "Rate limited: 429 Too Many Requests");
    }

    #[test]
    fn test_error_display_external_service() {
        let err = Error::ExternalService("upstream timeout".to_string());
        assert_eq!(err.to_string(), "AI service error: upstream timeout");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
