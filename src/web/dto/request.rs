//! Request DTOs for the Web API.
//!
//! Missing fields deserialize as empty strings so they are reported by
//! validation rather than as malformed JSON.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use super::validation::collect_errors;
use crate::auth::validation::{
    registration_password_errors, validate_email, validate_login_password, validate_name,
};

/// User registration request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name, at least 2 characters after trimming.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// At least 6 characters with a letter and a digit.
    #[serde(default)]
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut failures = Vec::new();
        if let Err(e) = validate_name(&self.name) {
            failures.push(("name", e));
        }
        if let Err(e) = validate_email(&self.email) {
            failures.push(("email", e));
        }
        failures.extend(
            registration_password_errors(&self.password)
                .into_iter()
                .map(|e| ("password", e)),
        );
        collect_errors(failures)
    }
}

/// Login request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut failures = Vec::new();
        if let Err(e) = validate_email(&self.email) {
            failures.push(("email", e));
        }
        if let Err(e) = validate_login_password(&self.password) {
            failures.push(("password", e));
        }
        collect_errors(failures)
    }
}
