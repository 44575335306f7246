//! File records and the file registry repository.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::timestamp_now;
use crate::{DriveError, Result};

const FILE_COLUMNS: &str =
    "id, filename, original_name, mime_type, path, size, user_id, created_at";

/// Durable metadata for one uploaded file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID (UUID v4).
    pub id: String,
    /// Server-generated stored filename.
    pub filename: String,
    /// Filename supplied by the client.
    pub original_name: String,
    /// Client-declared MIME type (not verified).
    pub mime_type: String,
    /// Location of the bytes on disk.
    pub path: String,
    /// File size in bytes.
    pub size: i64,
    /// Owner user ID.
    pub user_id: String,
    /// Upload timestamp (RFC 3339, UTC, milliseconds).
    pub created_at: String,
}

/// Data for registering an uploaded file.
#[derive(Debug, Clone)]
pub struct NewFileRecord {
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub path: String,
    pub size: i64,
    pub user_id: String,
}

/// Repository for file records.
///
/// Lookups that serve a request are always scoped by owner, so a file that
/// belongs to someone else is indistinguishable from one that does not exist.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a file record and return it.
    pub async fn create(&self, file: &NewFileRecord) -> Result<FileRecord> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO files (id, filename, original_name, mime_type, path, size, user_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&file.filename)
        .bind(&file.original_name)
        .bind(&file.mime_type)
        .bind(&file.path)
        .bind(file.size)
        .bind(&file.user_id)
        .bind(timestamp_now())
        .execute(self.pool)
        .await?;

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| DriveError::NotFound("file".to_string()))
    }

    /// Get a file record by ID regardless of owner.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// Get a file record by ID, only if it belongs to `user_id`.
    pub async fn get_owned(&self, id: &str, user_id: &str) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// List a user's files, newest first.
    ///
    /// Records with the same timestamp come back in reverse insertion order.
    pub async fn list_by_owner(&self, user_id: &str) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ?
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// Delete a file record owned by `user_id`.
    ///
    /// Returns `false` when no such record exists.
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
