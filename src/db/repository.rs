//! User repository for drivebox.
//!
//! This module provides the credential store operations on the `users` table.

use sqlx::SqlitePool;

use super::timestamp_now;
use super::user::{NewUser, User};
use crate::{DriveError, Result};

const USER_COLUMNS: &str = "id, name, email, password, is_admin, created_at";

/// Repository for user records.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    ///
    /// A second user with the same email fails with [`DriveError::Conflict`].
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (id, name, email, password, is_admin, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_user.id)
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password)
        .bind(new_user.is_admin)
        .bind(timestamp_now())
        .execute(self.pool)
        .await?;

        self.get_by_id(&new_user.id)
            .await?
            .ok_or_else(|| DriveError::NotFound("user".to_string()))
    }

    /// Get a user by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by normalized email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Check if an email is already registered.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?)")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(exists)
    }

    /// Count all users.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}
