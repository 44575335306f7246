//! File management module for drivebox.
//!
//! This module provides:
//! - File records (the registry of uploaded files)
//! - Per-user physical storage with atomic upload commits

mod metadata;
mod storage;

pub use metadata::{FileRecord, FileRepository, NewFileRecord};
pub use storage::{
    generate_stored_name, sanitize_filename, FileStorage, PendingUpload, StoredFile,
    MAX_STORED_NAME_SUFFIX,
};

/// Default maximum upload size (100 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// MIME type used when neither the client nor the filename tells us better.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Pick the MIME type recorded for an upload.
///
/// The client-declared type wins; otherwise it is guessed from the filename.
pub fn resolve_mime_type(declared: Option<&str>, filename: &str) -> String {
    match declared.map(str::trim).filter(|m| !m.is_empty()) {
        Some(mime) => mime.to_string(),
        None => mime_guess::from_path(filename)
            .first_raw()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string(),
    }
}
