use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{
    ERR_ACCOUNT_BLOCKED, ERR_ADMIN_ONLY, ERR_INVALID_CREDENTIALS, ERR_READ_ONLY,
    ERR_VERIFICATION_PENDING,
};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Database open error: {0}")]
    DatabaseOpen(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Missing or invalid session")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account blocked")]
    Blocked,

    #[error("Verification pending")]
    VerificationPending,

    #[error("Read-only access")]
    ReadOnly,

    #[error("Administrator access required")]
    AdminOnly,

    #[error("Forbidden: {0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::InvalidInput(msg.into())
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => internal("Database", e),
            AppError::DatabaseOpen(ref e) => internal("Database open", e),
            AppError::Transaction(ref e) => internal("Transaction", e),
            AppError::Table(ref e) => internal("Table", e),
            AppError::Storage(ref e) => internal("Storage", e),
            AppError::Commit(ref e) => internal("Commit", e),
            AppError::Serialization(ref e) => internal("Serialization", e),
            AppError::Deserialization(ref e) => internal("Deserialization", e),
            AppError::TaskJoin(ref e) => internal("Task join", e),
            AppError::Io(ref e) => internal("I/O", e),
            AppError::PasswordHash(ref e) => internal("Password hashing", e),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Missing or invalid session".to_string(),
            ),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, ERR_INVALID_CREDENTIALS.to_string())
            }
            AppError::Blocked => (StatusCode::FORBIDDEN, ERR_ACCOUNT_BLOCKED.to_string()),
            AppError::VerificationPending => {
                (StatusCode::FORBIDDEN, ERR_VERIFICATION_PENDING.to_string())
            }
            AppError::ReadOnly => (StatusCode::FORBIDDEN, ERR_READ_ONLY.to_string()),
            AppError::AdminOnly => (StatusCode::FORBIDDEN, ERR_ADMIN_ONLY.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.to_string()),
            AppError::NotFound(what) => (StatusCode::NOT_FOUND, format!("{} not found", what)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Upload exceeds maximum allowed size".to_string(),
            ),
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded - too many posts".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

fn internal(kind: &str, err: &dyn std::fmt::Debug) -> (StatusCode, String) {
    tracing::error!("{} error: {:?}", kind, err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
