//! Output artifact store.
//!
//! Visualizations are written as `features_{METHOD}_{YYYYMMDD_HHMMSS}.png` and kept
//! forever. Names are reserved with create-new semantics so two requests landing in the
//! same second never overwrite each other: the second one moves to the next free second.
//!
//! The reserved name stays an empty placeholder while rendering happens in a hidden
//! staging file next to it. Committing renames the staging file over the placeholder.
//! Empty files are never served, so clients only ever see complete images.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeDelta};
use thiserror::Error;

use crate::features::DetectionMethod;

/// How many consecutive seconds are probed before giving up on a reservation.
const MAX_RESERVATION_ATTEMPTS: i64 = 120;

/// Public URL prefix under which artifacts are served.
pub const OUTPUTS_URL_PREFIX: &str = "/api/outputs";

#[derive(Debug, Error)]
pub enum OutputStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Output not found: {0}")]
    NotFound(String),

    #[error("No free output name for {0} after {1} attempts")]
    Exhausted(DetectionMethod, i64),
}

/// A reserved, empty artifact file waiting for its rendered content.
#[derive(Debug)]
pub struct ReservedArtifact {
    pub filename: String,
    pub path: PathBuf,
}

impl ReservedArtifact {
    pub fn url(&self) -> String {
        format!("{}/{}", OUTPUTS_URL_PREFIX, self.filename)
    }

    /// Where the renderer writes. Hidden names are rejected by [`OutputStore::resolve`].
    pub fn staging_path(&self) -> PathBuf {
        self.path.with_file_name(format!(".{}", self.filename))
    }

    /// Publishes the staged file under the reserved name.
    pub fn commit(&self) -> Result<(), OutputStoreError> {
        std::fs::rename(self.staging_path(), &self.path)?;
        Ok(())
    }

    /// Drops the placeholder and any staged output after a failed render.
    pub fn discard(self) {
        for path in [self.staging_path(), self.path] {
            if let Err(err) = std::fs::remove_file(&path) {
                if err.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to remove output file {:?}: {}", path, err);
                }
            }
        }
    }
}

pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Creates the output directory if needed.
    pub fn init(&self) -> Result<(), OutputStoreError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn artifact_name(method: DetectionMethod, at: &NaiveDateTime) -> String {
        format!("features_{}_{}.png", method, at.format("%Y%m%d_%H%M%S"))
    }

    pub fn reserve(&self, method: DetectionMethod) -> Result<ReservedArtifact, OutputStoreError> {
        self.reserve_at(method, Local::now().naive_local())
    }

    /// Reserves the first free name at or after `start`.
    pub fn reserve_at(
        &self,
        method: DetectionMethod,
        start: NaiveDateTime,
    ) -> Result<ReservedArtifact, OutputStoreError> {
        for offset in 0..MAX_RESERVATION_ATTEMPTS {
            let at = start + TimeDelta::seconds(offset);
            let filename = Self::artifact_name(method, &at);
            let path = self.dir.join(&filename);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(_) => return Ok(ReservedArtifact { filename, path }),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Err(OutputStoreError::Exhausted(method, MAX_RESERVATION_ATTEMPTS))
    }

    /// Maps a client supplied filename to a file inside the store.
    ///
    /// Only a single plain path segment is accepted. Placeholders still being rendered
    /// are empty and count as missing.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, OutputStoreError> {
        validate_filename(filename)?;
        let path = self.dir.join(filename);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(path),
            _ => Err(OutputStoreError::NotFound(filename.to_string())),
        }
    }
}

fn validate_filename(filename: &str) -> Result<(), OutputStoreError> {
    let invalid = filename.is_empty()
        || filename.starts_with('.')
        || filename.contains("..")
        || filename.contains(['/', '\\', '\0', ':'])
        || Path::new(filename).is_absolute();

    if invalid {
        return Err(OutputStoreError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}
