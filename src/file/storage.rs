//! Physical file storage for drivebox.
//!
//! Files live in one directory per user:
//! ```text
//! {base_path}/
//! ├── 4c0b…-user-a/
//! │   ├── 1718000000000-123456789-report.pdf
//! │   └── 1718000000123-987654321-photo.jpg
//! └── 9e2f…-user-b/
//!     └── …
//! ```
//! Uploads are written to a hidden `.part` file in the same directory,
//! flushed to disk and renamed into place, so a stored name never refers to
//! a half-written file.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::{DriveError, Result};

/// Longest sanitized original name kept in a stored filename, in UTF-8 bytes.
///
/// Leaves room for the `.{millis}-{random}-` prefix and `.part` suffix of
/// the temporary name within the 255-byte filename limit.
pub const MAX_STORED_NAME_SUFFIX: usize = 200;

/// Upper bound (exclusive) of the random component in stored filenames.
const RANDOM_SUFFIX_BOUND: u32 = 1_000_000_000;

/// File storage service managing per-user directories.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Root directory for all user directories.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory will be created if it doesn't exist.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve the directory of a user.
    ///
    /// The user ID must be a single plain path component.
    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        let mut components = Path::new(user_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.base_path.join(user_id)),
            _ => Err(DriveError::Validation(format!(
                "invalid user directory name: {user_id:?}"
            ))),
        }
    }

    /// Create the user's directory if it does not exist yet.
    ///
    /// Safe to call concurrently for the same user.
    pub async fn ensure_user_dir(&self, user_id: &str) -> Result<PathBuf> {
        let dir = self.user_dir(user_id)?;
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Start writing an upload for `user_id`.
    ///
    /// The returned [`PendingUpload`] must be either committed or discarded.
    pub async fn begin_upload(&self, user_id: &str, original_name: &str) -> Result<PendingUpload> {
        let dir = self.ensure_user_dir(user_id).await?;
        let stored_name = generate_stored_name(original_name);
        let temp_path = dir.join(format!(".{stored_name}.part"));
        let final_path = dir.join(&stored_name);

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await?;

        Ok(PendingUpload {
            file,
            temp_path,
            final_path,
            stored_name,
            written: 0,
        })
    }

    /// Delete stored bytes.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub async fn delete(&self, path: impl AsRef<Path>) -> Result<bool> {
        match fs::remove_file(path.as_ref()).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// An upload being streamed to a temporary file.
#[derive(Debug)]
pub struct PendingUpload {
    file: fs::File,
    temp_path: PathBuf,
    final_path: PathBuf,
    stored_name: String,
    written: u64,
}

/// Outcome of a committed upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Generated stored filename.
    pub stored_name: String,
    /// Final location of the bytes.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

impl PendingUpload {
    /// Append a chunk of the upload.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Generated stored filename.
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Flush, fsync and move the file to its final name.
    pub async fn commit(mut self) -> Result<StoredFile> {
        let synced = async {
            self.file.flush().await?;
            self.file.sync_all().await
        }
        .await;

        if let Err(e) = synced {
            remove_temp(&self.temp_path).await;
            return Err(e.into());
        }
        drop(self.file);

        if let Err(e) = fs::rename(&self.temp_path, &self.final_path).await {
            remove_temp(&self.temp_path).await;
            return Err(e.into());
        }

        Ok(StoredFile {
            stored_name: self.stored_name,
            path: self.final_path,
            size: self.written,
        })
    }

    /// Abandon the upload and remove the temporary file.
    pub async fn discard(self) {
        drop(self.file);
        remove_temp(&self.temp_path).await;
    }
}

async fn remove_temp(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Failed to remove temporary upload");
        }
    }
}

/// Generate the stored name `{unix_millis}-{random}-{sanitized original}`.
pub fn generate_stored_name(original_name: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let random: u32 = rand::random_range(0..RANDOM_SUFFIX_BOUND);
    format!("{millis}-{random}-{}", sanitize_filename(original_name))
}

/// Reduce a client-supplied filename to a safe single path component.
///
/// Directory parts and control characters are removed; an empty or
/// dot-only result becomes `file`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = truncate_to_bytes(&cleaned, MAX_STORED_NAME_SUFFIX).trim();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Cut `s` to at most `max` bytes without splitting a character.
fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let end = (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0);
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_storage() -> (TempDir, FileStorage) {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path()).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_new_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let storage_path = temp_dir.path().join("uploads");

        assert!(!storage_path.exists());

        let storage = FileStorage::new(&storage_path).unwrap();

        assert!(storage_path.exists());
        assert_eq!(storage.base_path(), storage_path);
    }

    #[test]
    fn test_user_dir() {
        let (_temp_dir, storage) = setup_storage();

        let dir = storage.user_dir("user-1").unwrap();
        assert_eq!(dir, storage.base_path().join("user-1"));

        assert!(storage.user_dir("").is_err());
        assert!(storage.user_dir("..").is_err());
        assert!(storage.user_dir("a/b").is_err());
        assert!(storage.user_dir("/etc").is_err());
    }

    #[tokio::test]
    async fn test_ensure_user_dir_is_idempotent() {
        let (_temp_dir, storage) = setup_storage();

        let first = storage.ensure_user_dir("user-1").await.unwrap();
        let second = storage.ensure_user_dir("user-1").await.unwrap();

        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[tokio::test]
    async fn test_upload_commit() {
        let (_temp_dir, storage) = setup_storage();

        let mut upload = storage.begin_upload("user-1", "a.txt").await.unwrap();
        upload.write_chunk(b"hel").await.unwrap();
        upload.write_chunk(b"lo").await.unwrap();
        assert_eq!(upload.written(), 5);
        assert!(upload.stored_name().ends_with("-a.txt"));

        let stored = upload.commit().await.unwrap();

        assert_eq!(stored.size, 5);
        assert_eq!(stored.path.parent().unwrap(), storage.base_path().join("user-1"));
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"hello");

        // Only the final file remains.
        let entries: Vec<_> = std::fs::read_dir(storage.base_path().join("user-1"))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_upload_discard() {
        let (_temp_dir, storage) = setup_storage();

        let mut upload = storage.begin_upload("user-1", "a.txt").await.unwrap();
        upload.write_chunk(b"partial").await.unwrap();
        upload.discard().await;

        let entries = std::fs::read_dir(storage.base_path().join("user-1"))
            .unwrap()
            .count();
        assert_eq!(entries, 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_temp_dir, storage) = setup_storage();

        let mut upload = storage.begin_upload("user-1", "a.txt").await.unwrap();
        upload.write_chunk(b"data").await.unwrap();
        let stored = upload.commit().await.unwrap();

        assert!(stored.path.exists());
        assert!(storage.delete(&stored.path).await.unwrap());
        assert!(!stored.path.exists());
        assert!(!storage.delete(&stored.path).await.unwrap());
    }

    #[test]
    fn test_generate_stored_name() {
        let name = generate_stored_name("report.pdf");
        let parts: Vec<&str> = name.splitn(3, '-').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().unwrap() > 0);
        assert!(parts[1].parse::<u32>().unwrap() < RANDOM_SUFFIX_BOUND);
        assert_eq!(parts[2], "report.pdf");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a.txt"), "a.txt");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\doc.docx"), "doc.docx");
        assert_eq!(sanitize_filename("bad\r\nname\0.txt"), "badname.txt");
        assert_eq!(sanitize_filename("日本語.txt"), "日本語.txt");
    }

    #[test]
    fn test_sanitize_filename_fallback() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename(".."), "file");
        assert_eq!(sanitize_filename("dir/"), "file");
        assert_eq!(sanitize_filename("\u{7}"), "file");
    }

    #[test]
    fn test_sanitize_filename_truncates() {
        let long = "x".repeat(MAX_STORED_NAME_SUFFIX + 50);
        assert_eq!(sanitize_filename(&long).len(), MAX_STORED_NAME_SUFFIX);
    }

    #[test]
    fn test_sanitize_filename_truncates_multibyte_on_char_boundary() {
        // 3 bytes per character; 200 is not a multiple of 3.
        let long = format!("{}.txt", "日".repeat(100));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized, "日".repeat(66));
        assert!(sanitized.len() <= MAX_STORED_NAME_SUFFIX);

        let emoji = "😀".repeat(80);
        assert_eq!(sanitize_filename(&emoji), "😀".repeat(50));
    }

    #[tokio::test]
    async fn test_begin_upload_with_long_multibyte_name() {
        let (_temp_dir, storage) = setup_storage();
        let name = format!("{}.txt", "日".repeat(100));

        let mut upload = storage.begin_upload("user-1", &name).await.unwrap();
        upload.write_chunk(b"hello").await.unwrap();
        let stored = upload.commit().await.unwrap();

        assert!(stored.stored_name.len() < 255);
        assert_eq!(std::fs::read(&stored.path).unwrap(), b"hello");
    }
}
