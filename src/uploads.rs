//! Upload scratch area.
//!
//! Uploaded images live here only while the pipeline runs. Every saved upload is wrapped
//! in an [`UploadedFile`] guard which deletes it when dropped, whatever the outcome.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Errors that can occur during upload handling.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),
}

/// Default set of accepted image extensions.
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

pub struct UploadStore {
    /// Scratch directory for uploads.
    dir: PathBuf,
    /// Maximum file size in bytes.
    max_file_size: u64,
    /// Lowercase extensions without the dot.
    allowed_extensions: Vec<String>,
}

impl UploadStore {
    pub fn new(
        dir: impl Into<PathBuf>,
        max_file_size: u64,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            max_file_size,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
        }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    /// Creates the scratch directory if needed.
    pub async fn init(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Checks the extension after the last dot, case-insensitively.
    pub fn is_allowed(&self, filename: &str) -> bool {
        file_extension(filename)
            .map(|ext| self.allowed_extensions.iter().any(|a| *a == ext))
            .unwrap_or(false)
    }

    /// Saves uploaded bytes under a unique, sanitized name.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<UploadedFile, UploadError> {
        let size = data.len() as u64;
        if size > self.max_file_size {
            return Err(UploadError::FileTooLarge(size, self.max_file_size));
        }

        let safe_filename = sanitize_filename(filename).unwrap_or_else(|| {
            let ext = file_extension(filename).unwrap_or_default();
            format!("upload.{}", ext)
        });
        let unique = Uuid::new_v4().simple().to_string();
        let stored_name = format!(
            "{}_{}_{}",
            Local::now().format("%Y%m%d_%H%M%S"),
            &unique[..8],
            safe_filename
        );

        let path = self.dir.join(stored_name);
        let mut file = fs::File::create(&path).await?;
        // From here on the guard owns the file, so a failed write still cleans up.
        let upload = UploadedFile { path };
        file.write_all(data).await?;
        file.flush().await?;

        debug!("Saved upload {:?} ({} bytes)", upload.path, size);
        Ok(upload)
    }
}

/// A saved upload, deleted when dropped.
#[derive(Debug)]
pub struct UploadedFile {
    path: PathBuf,
}

impl UploadedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed upload {:?}", self.path),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Failed to remove upload {:?}: {}", self.path, err),
        }
    }
}

fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Sanitize a filename to prevent path traversal attacks.
fn sanitize_filename(filename: &str) -> Option<String> {
    // Get just the filename part (no path), treating both separators alike
    let name = filename.rsplit(['/', '\\']).next()?;

    if name.contains('\0') || name.starts_with('.') {
        return None;
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            _ => c,
        })
        .collect();

    if sanitized.is_empty() {
        return None;
    }

    Some(sanitized)
}
