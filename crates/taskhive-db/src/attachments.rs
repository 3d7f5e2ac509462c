//! Attachment store: keeps on-disk file bytes consistent with the attachment
//! records carried on a task.
//!
//! The store never persists the task itself: it produces and prunes
//! [`AttachmentRecord`] lists and performs the matching filesystem side
//! effects. The task repository saves the record list afterwards, so file
//! deletion always happens *before* a record is dropped: a crash mid-update
//! can orphan a record (recoverable) but not an untracked file.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use taskhive_core::defaults::MAX_UPLOAD_BYTES;
use taskhive_core::{AttachmentRecord, Error, Result};

/// File extensions accepted for upload (images and documents).
const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "pdf", "doc", "docx", "txt", "xlsx",
];

/// Storage backend trait for different storage implementations.
///
/// Allows abstracting over the local filesystem in production and failure
/// injection in tests.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified storage-relative path.
    async fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read data from the specified path.
    async fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified path. Deleting a missing file is not an
    /// error.
    async fn delete(&self, path: &str) -> Result<()>;

    /// Check if data exists at the specified path.
    async fn exists(&self, path: &str) -> Result<bool>;
}

/// Filesystem storage backend rooted at a content directory.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Map a storage-relative reference to an absolute location, rejecting
    /// any path that would escape the storage root.
    ///
    /// The check is lexical: only plain file-name components are accepted, so
    /// `..`, absolute segments, and embedded separators are all refused
    /// before the filesystem is touched.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let mut valid = !path.is_empty();
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => {
                    valid = false;
                    break;
                }
            }
        }
        if !valid {
            return Err(Error::Storage(format!(
                "Attachment path escapes storage root: {}",
                path
            )));
        }
        Ok(self.base_path.join(relative))
    }

    /// Validate that the backend can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_file = self.base_path.join(".health-check");

        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", self.base_path, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path)?;
        debug!(
            subsystem = "storage",
            storage_path = %path,
            size = data.len(),
            "attachment write"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await?;

        // 0644, no execute
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&full_path, std::fs::Permissions::from_mode(0o644)).await?;
        }

        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path)?;
        Ok(fs::read(full_path).await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.resolve(path)?;
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let full_path = self.resolve(path)?;
        Ok(fs::try_exists(full_path).await?)
    }
}

/// Undo Latin-1 mojibake in an uploaded filename.
///
/// Multipart filenames frequently arrive decoded byte-per-char (Latin-1), so
/// a multi-byte original like `báo cáo.pdf` shows up as `bÃ¡o cÃ¡o.pdf`. If
/// every char fits in one byte and those bytes form valid UTF-8, the
/// reinterpretation is the intended name; otherwise the input is returned
/// unchanged.
pub fn decode_original_filename(raw: &str) -> String {
    if raw.chars().any(|c| c as u32 > 0xFF) {
        return raw.to_string();
    }
    let bytes: Vec<u8> = raw.chars().map(|c| c as u8).collect();
    match String::from_utf8(bytes) {
        Ok(decoded) => decoded,
        Err(_) => raw.to_string(),
    }
}

/// Strip directory components and control characters from a filename.
pub fn sanitize_filename(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();
    let trimmed = base.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lowercased extension of a filename, if any.
fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Validate an upload against the extension allow-list and size cap.
pub fn validate_upload(filename: &str, size: u64) -> Result<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(Error::Validation(format!(
            "File exceeds maximum size of {} bytes",
            MAX_UPLOAD_BYTES
        )));
    }
    match extension_of(filename) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(Error::Validation(
            "Invalid file type. Only images and documents are allowed.".to_string(),
        )),
    }
}

/// Generate a collision-proof storage name distinct from the original:
/// `upload-{unix millis}-{9-digit random}{.ext}`.
pub fn storage_name_for(filename: &str) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    match extension_of(filename) {
        Some(ext) => format!("upload-{}-{:09}.{}", millis, suffix, ext),
        None => format!("upload-{}-{:09}", millis, suffix),
    }
}

/// Manages attachment records and their backing files.
#[derive(Clone)]
pub struct AttachmentStore {
    backend: Arc<dyn StorageBackend>,
}

impl AttachmentStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Persist uploaded bytes and build the record to append to a task.
    ///
    /// The caller is responsible for saving the task; the record is not
    /// persisted here.
    pub async fn store_upload(
        &self,
        original_filename: &str,
        data: &[u8],
    ) -> Result<AttachmentRecord> {
        validate_upload(original_filename, data.len() as u64)?;

        let filename = sanitize_filename(&decode_original_filename(original_filename));
        let stored_name = storage_name_for(&filename);
        self.backend.write(&stored_name, data).await?;

        Ok(AttachmentRecord {
            id: Uuid::now_v7(),
            filename,
            stored_name,
            uploaded_at: Utc::now(),
        })
    }

    /// Remove the attachments matching `ids` from `records`, deleting their
    /// files first.
    ///
    /// Ids with no matching record are silently ignored. A filesystem error
    /// keeps the record (metadata is never lost to a failed disk cleanup) and
    /// adds a warning; a missing file is fine, the record is still dropped.
    pub async fn remove_attachments(
        &self,
        records: Vec<AttachmentRecord>,
        ids: &[Uuid],
    ) -> (Vec<AttachmentRecord>, Vec<String>) {
        let mut kept = Vec::with_capacity(records.len());
        let mut warnings = Vec::new();

        for record in records {
            if !ids.contains(&record.id) {
                kept.push(record);
                continue;
            }
            match self.backend.delete(&record.stored_name).await {
                Ok(()) => {
                    debug!(
                        subsystem = "storage",
                        attachment_id = %record.id,
                        stored_name = %record.stored_name,
                        "attachment file removed"
                    );
                }
                Err(e) => {
                    warn!(
                        subsystem = "storage",
                        attachment_id = %record.id,
                        error = %e,
                        "failed to remove attachment file; keeping record"
                    );
                    warnings.push(format!(
                        "Attachment {} could not be removed from storage: {}",
                        record.filename, e
                    ));
                    kept.push(record);
                }
            }
        }

        (kept, warnings)
    }

    /// Read an attachment's bytes for download.
    pub async fn read(&self, record: &AttachmentRecord) -> Result<Vec<u8>> {
        self.backend.read(&record.stored_name).await
    }
}
