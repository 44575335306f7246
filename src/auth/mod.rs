//! Authentication module for drivebox.
//!
//! This module provides password hashing, bearer tokens, input validation
//! and the default administrator bootstrap.

mod bootstrap;
mod password;
pub mod token;
pub mod validation;

pub use bootstrap::{ensure_default_admin, BootstrapOutcome};
pub use password::{hash_password, verify_password, PasswordError};
pub use token::{AccessClaims, TokenError};
pub use validation::{normalize_email, ValidationError};
