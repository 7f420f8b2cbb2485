//! Append-only pin log
//!
//! One line per completed pin: `<source> <hash> <version>`. The file is
//! opened once at startup and every write goes through a single lock, so
//! concurrent pins never interleave partial lines.

use crate::error::{GexpinError, GexpinResult};
use crate::package::PackageRecord;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// File-based audit log of completed pins
pub struct AuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AuditLog {
    /// Open the log for appending, creating it (and its parent directory) if absent
    pub async fn open(path: impl Into<PathBuf>) -> GexpinResult<Self> {
        let path = path.into();
        let open_err = |source: std::io::Error| GexpinError::AuditOpen {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(open_err)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(open_err)?;

        debug!("Opened pin log at {}", path.display());
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one record
    pub async fn append(&self, record: &PackageRecord) -> GexpinResult<()> {
        let mut line = record.log_line();
        line.push('\n');

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(GexpinError::AuditWrite)?;
        file.flush().await.map_err(GexpinError::AuditWrite)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
