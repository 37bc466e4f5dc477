use thiserror::Error;

/// Application-wide error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// The document store failed or could not be reached.
    #[error("Database error: {0}")]
    Database(String),

    /// An operation that requires a caller identity was invoked without one.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// No document matched the identity-filtered query. Deliberately does not
    /// distinguish "missing" from "exists but hidden".
    #[error("Not found: {0}")]
    NotFound(String),

    /// The caller can see the document but does not own it.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing or malformed request parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Helper conversion from anyhow::Error
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<bson::ser::Error> for AppError {
    fn from(err: bson::ser::Error) -> Self {
        AppError::BadRequest(format!("Invalid document body: {err}"))
    }
}
