//! Error types for drivebox.

use thiserror::Error;

/// Common error type for the storage service.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Database error.
    ///
    /// Errors from sqlx are converted automatically; unique constraint
    /// violations become [`DriveError::Conflict`] instead.
    #[error("database error: {0}")]
    Database(String),

    /// A row with the same unique key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected server-side failure, such as a hashing or task error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for DriveError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DriveError::Conflict(db_err.message().to_string())
            }
            _ => DriveError::Database(e.to_string()),
        }
    }
}

impl From<crate::auth::PasswordError> for DriveError {
    fn from(e: crate::auth::PasswordError) -> Self {
        DriveError::Internal(e.to_string())
    }
}

/// Result type alias for drivebox operations.
pub type Result<T> = std::result::Result<T, DriveError>;
