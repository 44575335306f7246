//! File handlers for Web API.

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, Request, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::Response,
    Json,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::file::{resolve_mime_type, FileRepository, NewFileRecord, StoredFile};
use crate::web::dto::{FileSummary, UploadResponse, UploadedFile};
use crate::web::error::{ApiError, ErrorBody};
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, FileAccessUser};

/// Multipart part that carries the upload.
const FILE_FIELD: &str = "file";

/// Cache policy for retrieved files. Stored names are never reused.
const FILE_CACHE_CONTROL: &str = "public, max-age=31536000";

const UPLOAD_FAILURE: &str = "Error uploading file";

/// Generate a safe Content-Disposition header value for inline display.
///
/// Control characters are dropped. The quoted `filename` is an ASCII
/// fallback; names that need it also get an RFC 5987 `filename*`.
fn content_disposition_header(filename: &str) -> String {
    let cleaned: String = filename.chars().filter(|c| !c.is_control()).collect();

    if cleaned.is_ascii() && !cleaned.contains(['"', '\\']) {
        return format!("inline; filename=\"{}\"", cleaned);
    }

    let fallback: String = cleaned
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            c => c,
        })
        .collect();
    let encoded = urlencoding::encode(&cleaned);

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

fn file_too_large(max_upload_size: u64) -> ApiError {
    ApiError::payload_too_large("File too large").with_errors([format!(
        "Maximum upload size is {} MB",
        max_upload_size / (1024 * 1024)
    )])
}

fn multipart_error(err: MultipartError, max_upload_size: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return file_too_large(max_upload_size);
    }
    tracing::debug!("Failed to read multipart data: {}", err);
    ApiError::bad_request("Invalid multipart data")
}

/// A file part fully written to storage but not yet recorded.
struct ReceivedFile {
    stored: StoredFile,
    original_name: String,
    mime_type: String,
}

impl ReceivedFile {
    async fn discard(self, state: &AppState) {
        if let Err(e) = state.file_storage.delete(&self.stored.path).await {
            tracing::warn!(
                path = %self.stored.path.display(),
                error = %e,
                "Failed to remove rejected upload"
            );
        }
    }
}

/// Stream one file part into the user's directory.
async fn receive_file(
    state: &AppState,
    user_id: &str,
    original_name: &str,
    field: &mut Field<'_>,
) -> Result<StoredFile, ApiError> {
    let mut upload = state
        .file_storage
        .begin_upload(user_id, original_name)
        .await
        .map_err(|e| state.server_error(UPLOAD_FAILURE, e))?;

    loop {
        let chunk = match field.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                upload.discard().await;
                return Err(multipart_error(e, state.max_upload_size));
            }
        };

        if upload.written() + chunk.len() as u64 > state.max_upload_size {
            upload.discard().await;
            return Err(file_too_large(state.max_upload_size));
        }

        if let Err(e) = upload.write_chunk(&chunk).await {
            upload.discard().await;
            return Err(state.server_error(UPLOAD_FAILURE, e));
        }
    }

    upload
        .commit()
        .await
        .map_err(|e| state.server_error(UPLOAD_FAILURE, e))
}

/// Walk the multipart body and store the single `file` part, if any.
async fn receive_upload(
    state: &AppState,
    user_id: &str,
    multipart: &mut Multipart,
) -> Result<Option<ReceivedFile>, ApiError> {
    let mut received: Option<ReceivedFile> = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return Ok(received),
            Err(e) => {
                if let Some(file) = received {
                    file.discard(state).await;
                }
                return Err(multipart_error(e, state.max_upload_size));
            }
        };

        let original_name = match (field.name(), field.file_name()) {
            (Some(FILE_FIELD), Some(name)) if !name.is_empty() => name.to_string(),
            _ => continue,
        };

        if let Some(file) = received.take() {
            file.discard(state).await;
            return Err(ApiError::bad_request(
                "Only one file may be uploaded per request",
            ));
        }

        let mime_type = resolve_mime_type(field.content_type(), &original_name);
        let stored = receive_file(state, user_id, &original_name, &mut field).await?;

        received = Some(ReceivedFile {
            stored,
            original_name,
            mime_type,
        });
    }
}

/// POST /api/upload - Upload a file.
///
/// Request body: multipart/form-data with a single "file" part.
#[utoipa::path(
    post,
    path = "/api/upload",
    tag = "files",
    request_body(content_type = "multipart/form-data", description = "Single part named `file`"),
    responses(
        (status = 201, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "No file or malformed multipart body", body = ErrorBody),
        (status = 401, description = "Missing token", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 413, description = "File too large", body = ErrorBody),
        (status = 500, description = "Storage failure", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!("Upload without multipart body: {}", e);
        ApiError::bad_request("No file uploaded")
    })?;

    let received = receive_upload(&state, &claims.sub, &mut multipart)
        .await?
        .ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let new_file = NewFileRecord {
        filename: received.stored.stored_name.clone(),
        original_name: received.original_name.clone(),
        mime_type: received.mime_type.clone(),
        path: received.stored.path.to_string_lossy().into_owned(),
        size: received.stored.size as i64,
        user_id: claims.sub.clone(),
    };

    let file = match FileRepository::new(state.db.pool()).create(&new_file).await {
        Ok(file) => file,
        Err(e) => {
            let err = state.server_error(UPLOAD_FAILURE, e);
            received.discard(&state).await;
            return Err(err);
        }
    };

    tracing::info!(
        user_id = %claims.sub,
        file_id = %file.id,
        size = file.size,
        "File uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully".to_string(),
            file: UploadedFile::from(&file),
        }),
    ))
}

/// GET /api/files - List the caller's files, newest first.
#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    responses(
        (status = 200, description = "Files owned by the caller", body = Vec<FileSummary>),
        (status = 401, description = "Missing token", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<FileSummary>>, ApiError> {
    let files = FileRepository::new(state.db.pool())
        .list_by_owner(&claims.sub)
        .await
        .map_err(|e| state.server_error("Error fetching files", e))?;

    Ok(Json(files.into_iter().map(FileSummary::from).collect()))
}

/// GET /api/files/:id - Stream a file.
///
/// The token may come from the `Authorization` header or `?token=`.
#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID"),
        ("token" = Option<String>, Query, description = "Bearer token, for links opened by a browser")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 206, description = "Requested byte range", content_type = "application/octet-stream"),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Error streaming file", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    FileAccessUser(claims): FileAccessUser,
    Path(file_id): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let file = FileRepository::new(state.db.pool())
        .get_owned(&file_id, &claims.sub)
        .await
        .map_err(|e| state.server_error("Error retrieving file", e))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let service = match file.mime_type.parse::<mime_guess::mime::Mime>() {
        Ok(mime) => ServeFile::new_with_mime(&file.path, &mime),
        Err(_) => ServeFile::new(&file.path),
    };

    // Method and conditional/range headers are passed through as sent.
    let (parts, _) = request.into_parts();
    let response = match service.oneshot(Request::from_parts(parts, Body::empty())).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        tracing::warn!(file_id = %file.id, path = %file.path, "File bytes missing");
        return Err(ApiError::not_found("File not found on server"));
    }
    if status.is_server_error() {
        return Err(state.server_error(
            "Error streaming file",
            format!("file service answered {status} for {}", file.path),
        ));
    }

    let (mut parts, body) = response.into_parts();
    if status.is_success() {
        if let Ok(value) = HeaderValue::from_str(&content_disposition_header(&file.original_name)) {
            parts.headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }
    parts.headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(FILE_CACHE_CONTROL),
    );
    parts
        .headers
        .insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));

    let id = file.id;
    let body = body.map_err(move |e| {
        tracing::error!(file_id = %id, error = %e, "Error streaming file");
        e
    });

    Ok(Response::from_parts(parts, Body::new(body)))
}

/// DELETE /api/files/:id - Delete a file.
#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Missing token", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "File not found", body = ErrorBody),
        (status = 500, description = "Error deleting file", body = ErrorBody)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    const FAILURE: &str = "Error deleting file";

    let repo = FileRepository::new(state.db.pool());
    let file = repo
        .get_owned(&file_id, &claims.sub)
        .await
        .map_err(|e| state.server_error(FAILURE, e))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // Bytes first, so a failure leaves the record pointing at something real.
    match state.file_storage.delete(&file.path).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(file_id = %file.id, path = %file.path, "File bytes already missing");
        }
        Err(e) => return Err(state.server_error(FAILURE, e)),
    }

    repo.delete(&file.id, &claims.sub)
        .await
        .map_err(|e| state.server_error(FAILURE, e))?;

    tracing::info!(user_id = %claims.sub, file_id = %file.id, "File deleted");

    Ok(StatusCode::NO_CONTENT)
}
