//! Error types module
//!
//! All failures are unified under the `AppError` enum. Every variant knows its
//! HTTP status and its client-facing message, so the API layer can render the
//! fixed `{status, message, data}` response shape without inspecting sources.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx`
//! feature so leaf crates (imaging, cdn, cache) can depend on the taxonomy
//! without pulling in the database stack.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures
    Debug,
    /// Recoverable issues such as upstream timeouts
    Warn,
    /// Unexpected failures
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    /// Image structural or geometric checks failed. Carries every violated
    /// constraint so the caller sees all problems at once.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Remote image store or SMTP transport failure, already converted at the
    /// pipeline boundary. The transport error type never crosses this line.
    #[error("Upstream failure: {0}")]
    Upstream(String),

    /// Failure inside a commit sequence; the transaction was rolled back and
    /// this carries the original message.
    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::InvalidInput(format!("UUID parsing error: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl AppError {
    /// HTTP status code for the fixed response shape.
    pub fn http_status_code(&self) -> u16 {
        match self {
            AppError::Database(_) => 500,
            AppError::Validation(_) => 400,
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Conflict(_) => 409,
            AppError::Upstream(_) => 502,
            AppError::Transaction(_) => 500,
            AppError::Unauthorized(_) => 401,
            AppError::Forbidden(_) => 403,
            AppError::TooManyRequests(_) => 429,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Upstream(_) => "UPSTREAM_FAILURE",
            AppError::Transaction(_) => "TRANSACTION_FAILED",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::TooManyRequests(_) => "TOO_MANY_REQUESTS",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-facing message. Internal details (database, transaction
    /// internals) are replaced with a generic message.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Transaction(_) => "Update failed".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_)
            | AppError::InvalidInput(_)
            | AppError::NotFound(_)
            | AppError::Conflict(_)
            | AppError::Unauthorized(_)
            | AppError::Forbidden(_)
            | AppError::TooManyRequests(_) => LogLevel::Debug,
            AppError::Upstream(_) => LogLevel::Warn,
            AppError::Database(_) | AppError::Transaction(_) | AppError::Internal(_) => {
                LogLevel::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_metadata() {
        let err = AppError::NotFound("product 42".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.client_message(), "Not found: product 42");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_validation_joins_all_violations() {
        let err = AppError::Validation(vec!["too large".to_string(), "bad type".to_string()]);
        assert_eq!(err.http_status_code(), 400);
        assert!(err.to_string().contains("too large"));
        assert!(err.to_string().contains("bad type"));
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Transaction("authors replace step failed".to_string());
        assert_eq!(err.client_message(), "Update failed");
        assert_eq!(err.log_level(), LogLevel::Error);

        let err = AppError::Internal("stack details".to_string());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_upstream_is_recoverable_warn() {
        let err = AppError::Upstream("image upload failed".to_string());
        assert_eq!(err.http_status_code(), 502);
        assert_eq!(err.log_level(), LogLevel::Warn);
    }
}
