//! User model for drivebox.

use uuid::Uuid;

/// User entity representing a registered account.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address, trimmed and lower-cased (unique).
    pub email: String,
    /// Password hash (Argon2).
    pub password: String,
    /// Whether the account has administrator rights.
    pub is_admin: bool,
    /// Account creation timestamp (RFC 3339, UTC).
    pub created_at: String,
}

/// Data for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Pre-generated user ID.
    pub id: String,
    pub name: String,
    /// Normalized email address.
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    pub is_admin: bool,
}

impl NewUser {
    /// Create a regular (non-admin) user with a fresh ID.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password: password_hash.into(),
            is_admin: false,
        }
    }

    /// Grant administrator rights.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}
