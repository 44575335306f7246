//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Request, Uri},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation};
use std::sync::Arc;

use crate::auth::token::{access_validation, decode_access_token};
use crate::auth::{AccessClaims, TokenError};
use crate::web::error::ApiError;

/// Claims handed to handlers.
pub type JwtClaims = AccessClaims;

/// Application state for JWT authentication.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: access_validation(),
        }
    }

    /// Verify a token against this state.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, TokenError> {
        decode_access_token(token, &self.decoding_key, &self.validation)
    }
}

/// Read the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Read the token from a `token` query parameter.
pub fn query_token(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            if key == "token" {
                urlencoding::decode(value).ok().map(|s| s.into_owned())
            } else {
                None
            }
        })
        .filter(|token| !token.is_empty())
}

fn jwt_state(parts: &Parts) -> Result<&Arc<JwtState>, ApiError> {
    parts.extensions.get::<Arc<JwtState>>().ok_or_else(|| {
        tracing::error!("JWT state missing from request extensions");
        ApiError::internal("Authentication is not configured")
    })
}

/// Extractor for routes that take the token from the header only.
///
/// Missing token: 401. Bad signature or expired: 403.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = bearer_token(&parts.headers)
                .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

            let claims = jwt_state(parts)?.verify(token).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                ApiError::forbidden("Invalid token")
            })?;

            Ok(AuthUser(claims))
        })
    }
}

/// Extractor for file retrieval, which also accepts `?token=`.
///
/// Links opened directly by a browser cannot set headers, so the token may
/// travel in the query string. Any failure is a 401.
#[derive(Debug, Clone)]
pub struct FileAccessUser(pub JwtClaims);

impl<S> FromRequestParts<S> for FileAccessUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = bearer_token(&parts.headers)
                .map(str::to_string)
                .or_else(|| query_token(&parts.uri))
                .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

            let claims = jwt_state(parts)?.verify(&token).map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                ApiError::unauthorized("Invalid token")
            })?;

            Ok(FileAccessUser(claims))
        })
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}
