//! Input validation rules for registration and login.
//!
//! Every rule reports a [`ValidationError`] whose display text is the
//! message shown to API clients.

use thiserror::Error;

/// Minimum display name length (in characters, after trimming).
pub const MIN_NAME_LENGTH: usize = 2;

/// Minimum password length (in characters).
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Non-alphanumeric characters allowed in passwords.
pub const PASSWORD_SPECIAL_CHARS: &str = "@$!%*#?&";

/// Validation errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name must be at least {MIN_NAME_LENGTH} characters long")]
    NameTooShort,

    #[error("Valid email is required")]
    EmailInvalid,

    #[error("Password is required")]
    PasswordRequired,

    #[error("Password must be at least {MIN_PASSWORD_LENGTH} characters long")]
    PasswordTooShort,

    /// Missing letter or digit, or a character outside the allowed set.
    #[error("Password must contain at least one letter and one number")]
    PasswordComposition,
}

/// Normalize an email for storage and lookup (trimmed, lower-cased).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate a display name.
///
/// # Examples
///
/// ```
/// use drivebox::auth::validation::validate_name;
///
/// assert!(validate_name("Al").is_ok());
/// assert!(validate_name(" A ").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(ValidationError::NameTooShort);
    }
    Ok(())
}

/// Validate email syntax.
///
/// Surrounding whitespace is ignored.
///
/// # Examples
///
/// ```
/// use drivebox::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() || email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailInvalid);
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::EmailInvalid);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalid);
    };

    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::EmailInvalid);
    }

    // Domain needs at least one dot and no empty labels.
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(ValidationError::EmailInvalid);
    }

    Ok(())
}

/// Validate a password chosen at registration.
///
/// All failing rules are returned, in a stable order.
///
/// # Examples
///
/// ```
/// use drivebox::auth::validation::registration_password_errors;
///
/// assert!(registration_password_errors("secret123").is_empty());
/// assert_eq!(registration_password_errors("abc").len(), 2);
/// ```
pub fn registration_password_errors(password: &str) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(ValidationError::PasswordTooShort);
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIAL_CHARS.contains(c));

    if !(has_letter && has_digit && allowed) {
        errors.push(ValidationError::PasswordComposition);
    }

    errors
}

/// Validate a password given at login.
pub fn validate_login_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    Ok(())
}
