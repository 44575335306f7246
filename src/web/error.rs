//! API error handling.
//!
//! Every failure leaves the API as `{"code", "message", "errors"?}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::ValidationError;
use crate::DriveError;

/// Detail returned for server errors outside development mode.
pub const GENERIC_ERROR_DETAIL: &str = "An unexpected error occurred. Please try again.";

/// Order in which request fields are checked and reported.
const FIELD_ORDER: &[&str] = &["name", "email", "password"];

/// API error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Bad request (400).
    BadRequest,
    /// Field validation failed (400).
    ValidationError,
    /// Email already taken (400).
    AlreadyRegistered,
    /// Missing credentials or token (401).
    Unauthorized,
    /// Token rejected (403).
    Forbidden,
    /// Not found (404).
    NotFound,
    /// Upload over the size cap (413).
    PayloadTooLarge,
    /// Internal server error (500).
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest | ErrorCode::ValidationError | ErrorCode::AlreadyRegistered => {
                StatusCode::BAD_REQUEST
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub code: ErrorCode,
    /// Short human-readable message.
    pub message: String,
    /// Detailed messages, omitted when empty.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    errors: Vec<String>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Attach detailed messages.
    pub fn with_errors<I, S>(mut self, errors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors = errors.into_iter().map(Into::into).collect();
        self
    }

    /// Create a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Create a payload too large error.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PayloadTooLarge, message)
    }

    /// Create an internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create an internal server error carrying a detail line.
    ///
    /// The underlying `detail` is only returned when `expose_detail` is set;
    /// otherwise the caller sees [`GENERIC_ERROR_DETAIL`].
    pub fn internal_with_detail(
        message: impl Into<String>,
        detail: impl ToString,
        expose_detail: bool,
    ) -> Self {
        let detail = if expose_detail {
            detail.to_string()
        } else {
            GENERIC_ERROR_DETAIL.to_string()
        };
        Self::internal(message).with_errors([detail])
    }

    /// Create a validation error with the given messages.
    pub fn validation<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ErrorCode::ValidationError, "Validation failed").with_errors(messages)
    }

    /// Create the duplicate-email registration error.
    pub fn already_registered() -> Self {
        Self::new(ErrorCode::AlreadyRegistered, "Email already registered").with_errors([
            "This email address is already in use. Please use a different email or try logging in.",
        ])
    }

    /// Create a validation error from validator::ValidationErrors.
    ///
    /// Messages follow the order fields are checked in (name, email,
    /// password); any other field comes after those, by name.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<(String, Vec<String>)> = errors
            .field_errors()
            .into_iter()
            .map(|(field, field_errors)| {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("Invalid value for {field}"))
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        fields.sort_by_key(|(field, _)| {
            let rank = FIELD_ORDER
                .iter()
                .position(|f| f == field)
                .unwrap_or(FIELD_ORDER.len());
            (rank, field.clone())
        });

        Self::validation(fields.into_iter().flat_map(|(_, messages)| messages))
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status_code();
        let body = ErrorBody {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };
        (status, Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation([err.to_string()])
    }
}

impl From<DriveError> for ApiError {
    fn from(err: DriveError) -> Self {
        match &err {
            DriveError::Auth(msg) => ApiError::unauthorized(msg.clone()),
            DriveError::NotFound(msg) => ApiError::not_found(format!("{msg} not found")),
            DriveError::Validation(msg) => ApiError::bad_request(msg.clone()),
            _ => {
                tracing::error!("Internal error: {}", err);
                ApiError::internal("Server error").with_errors([GENERIC_ERROR_DETAIL])
            }
        }
    }
}
