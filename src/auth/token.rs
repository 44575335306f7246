//! Bearer token issuing and decoding.
//!
//! Tokens are HS256 JWTs carrying [`AccessClaims`]. They are not persisted
//! and cannot be revoked; they simply expire.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims embedded in an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Email at the time of issue.
    pub email: String,
    /// Administrator flag at the time of issue.
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
}

/// Token errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encode(String),

    #[error("token has expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),
}

impl AccessClaims {
    /// Build claims for a user, valid for `lifetime_secs` from now.
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        is_admin: bool,
        lifetime_secs: u64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            sub: user_id.into(),
            email: email.into(),
            is_admin,
            iat: now,
            exp: now.saturating_add(lifetime_secs),
        }
    }
}

/// Validation settings for access tokens.
///
/// HS256 only, expiry checked with no leeway.
pub fn access_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation
}

/// Sign claims into a token string.
pub fn issue_access_token(claims: &AccessClaims, key: &EncodingKey) -> Result<String, TokenError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| TokenError::Encode(e.to_string()))
}

/// Verify a token and return its claims.
pub fn decode_access_token(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<AccessClaims, TokenError> {
    decode::<AccessClaims>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })
}
