//! File-based state backend with atomic writes.
//!
//! Stores the metrics record as JSON, by default under
//! `dirs::data_dir()/<namespace>/stats.json`. Writes go to a temp file that
//! is flushed to disk and then renamed over the record, so a crash mid-write
//! leaves either the old record or the new one, never a torn file.

use crate::state::models::MetricsState;
use crate::store::backend::StateBackend;
use crate::store::format::{from_json, to_json};
use crate::MeterError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// File name of the record inside a namespace directory.
pub const STATE_FILE_NAME: &str = "stats.json";

/// File-based state backend.
#[derive(Debug, Clone)]
pub struct FileBackend {
    /// Path of the durable record.
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend that stores the record at `path`.
    ///
    /// The parent directory is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

/// Flush directory metadata so a completed rename survives a crash.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> Result<(), MeterError> {
    let handle = fs::File::open(dir).await.map_err(|e| {
        MeterError::PersistenceUnavailable(format!("Failed to open {}: {}", dir.display(), e))
    })?;
    handle.sync_all().await.map_err(|e| {
        MeterError::PersistenceUnavailable(format!("Failed to sync {}: {}", dir.display(), e))
    })
}

// No directory handle to sync off unix.
#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> Result<(), MeterError> {
    Ok(())
}

#[async_trait]
impl StateBackend for FileBackend {
    async fn load(&self) -> Result<Option<MetricsState>, MeterError> {
        let json = match fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MeterError::PersistenceUnavailable(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        from_json(&json).map(Some)
    }

    async fn persist(&self, state: &MetricsState) -> Result<(), MeterError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir).await.map_err(|e| {
            MeterError::PersistenceUnavailable(format!("Failed to create dir: {}", e))
        })?;

        let json = to_json(state)?;
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            MeterError::PersistenceUnavailable(format!("Failed to create temp file: {}", e))
        })?;
        file.write_all(json.as_bytes()).await.map_err(|e| {
            MeterError::PersistenceUnavailable(format!("Failed to write temp file: {}", e))
        })?;
        file.sync_all().await.map_err(|e| {
            MeterError::PersistenceUnavailable(format!("Failed to sync temp file: {}", e))
        })?;
        drop(file);

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            MeterError::PersistenceUnavailable(format!("Failed to rename state file: {}", e))
        })?;

        sync_dir(dir).await
    }
}
