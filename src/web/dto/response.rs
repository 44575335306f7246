//! Response DTOs for the Web API.
//!
//! Field names follow the JSON the browser client already consumes
//! (`_id`, `originalname`, `createdAt`, ...).

use serde::Serialize;
use utoipa::ToSchema;

use crate::db::User;
use crate::file::FileRecord;

/// Public view of an account.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// Registration and login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    /// Bearer token for subsequent requests.
    pub token: String,
    pub user: UserInfo,
}

/// Summary of a freshly uploaded file.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedFile {
    /// Same value as `id`.
    #[serde(rename = "_id")]
    pub object_id: String,
    pub id: String,
    /// Original filename.
    pub name: String,
    pub size: i64,
    /// MIME type.
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl From<&FileRecord> for UploadedFile {
    fn from(file: &FileRecord) -> Self {
        Self {
            object_id: file.id.clone(),
            id: file.id.clone(),
            name: file.original_name.clone(),
            size: file.size,
            mime_type: file.mime_type.clone(),
        }
    }
}

/// Upload response.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    pub file: UploadedFile,
}

/// One entry of the file listing. The storage path is never exposed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FileSummary {
    #[serde(rename = "_id")]
    pub id: String,
    /// Stored filename.
    pub filename: String,
    /// Original filename.
    pub originalname: String,
    pub mimetype: String,
    pub size: i64,
    /// Upload time, RFC 3339.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<FileRecord> for FileSummary {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            filename: file.filename,
            originalname: file.original_name,
            mimetype: file.mime_type,
            size: file.size,
            created_at: file.created_at,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
