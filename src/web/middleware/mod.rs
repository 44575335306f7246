//! Middleware for the Web API.

pub mod auth;
pub mod cors;
pub mod security;

pub use auth::{jwt_auth, AuthUser, FileAccessUser, JwtClaims, JwtState};
pub use cors::create_cors_layer;
pub use security::security_headers;
