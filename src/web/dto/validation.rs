//! Validation utilities for Web API DTOs.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::ValidationError as RuleError;
use crate::web::error::ApiError;

/// A JSON extractor that validates the request body.
///
/// The body is deserialized as JSON and then checked with [`Validate`].
/// Malformed JSON is a 400 `BAD_REQUEST`; failed rules are a 400
/// `VALIDATION_ERROR` listing every message.
///
/// # Example
///
/// ```ignore
/// use drivebox::web::dto::ValidatedJson;
///
/// async fn login(
///     ValidatedJson(payload): ValidatedJson<LoginRequest>,
/// ) -> Result<Json<AuthResponse>, ApiError> {
///     // payload is already validated
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {}", e.body_text())))?;

        value.validate().map_err(ApiError::from_validation_errors)?;

        Ok(ValidatedJson(value))
    }
}

/// Convert a rule failure into a `validator` field error.
pub fn field_error(err: RuleError) -> validator::ValidationError {
    let code = match err {
        RuleError::NameRequired | RuleError::PasswordRequired => "required",
        RuleError::NameTooShort | RuleError::PasswordTooShort => "length",
        RuleError::EmailInvalid => "email",
        RuleError::PasswordComposition => "composition",
    };
    validator::ValidationError::new(code).with_message(err.to_string().into())
}

/// Collect rule results into `validator::ValidationErrors`.
pub fn collect_errors<I>(failures: I) -> Result<(), validator::ValidationErrors>
where
    I: IntoIterator<Item = (&'static str, RuleError)>,
{
    let mut errors = validator::ValidationErrors::new();
    for (field, err) in failures {
        errors.add(field, field_error(err));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_message() {
        let err = field_error(RuleError::EmailInvalid);
        assert_eq!(err.code, "email");
        assert_eq!(err.message.unwrap(), "Valid email is required");
    }

    #[test]
    fn test_collect_errors_empty() {
        assert!(collect_errors(Vec::<(&'static str, RuleError)>::new()).is_ok());
    }

    #[test]
    fn test_collect_errors_groups_by_field() {
        let errors = collect_errors([
            ("password", RuleError::PasswordTooShort),
            ("password", RuleError::PasswordComposition),
            ("name", RuleError::NameRequired),
        ])
        .unwrap_err();

        let fields = errors.field_errors();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["password"].len(), 2);
        assert_eq!(fields["name"].len(), 1);
    }
}
