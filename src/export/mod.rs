//! Export of the order collection to a standalone, shareable JSON file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::clock::Clock;

pub const EXPORT_MIME_TYPE: &str = "application/json";
const SHARE_TITLE: &str = "Export orders";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExportError {
    #[error("Sharing is not available on this device")]
    ShareUnavailable,
    #[error("Could not serialize orders: {0}")]
    Serialize(String),
    #[error("Could not write export file {path}: {message}")]
    Write { path: String, message: String },
    #[error("Could not share export file: {0}")]
    Share(String),
}

/// Hands a finished file to whatever lets the user send it somewhere.
pub trait ShareTarget: Send + Sync + 'static {
    fn is_available(&self) -> bool;
    fn share(&self, path: &Path, mime_type: &str, title: &str) -> Result<(), String>;
}

/// Prints the file location for the person at the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleShare;

impl ShareTarget for ConsoleShare {
    fn is_available(&self) -> bool {
        true
    }

    fn share(&self, path: &Path, mime_type: &str, title: &str) -> Result<(), String> {
        println!("{} ({}): {}", title, mime_type, path.display());
        Ok(())
    }
}

/// Used when sharing is turned off; every export is refused up front.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledShare;

impl ShareTarget for DisabledShare {
    fn is_available(&self) -> bool {
        false
    }

    fn share(&self, _path: &Path, _mime_type: &str, _title: &str) -> Result<(), String> {
        Err("sharing is disabled".to_string())
    }
}

/// Writes export files as `<prefix>-<timestamp>.json` in `dir`.
///
/// Files are left in place after sharing; the receiver may read them later.
pub struct Exporter {
    dir: PathBuf,
    prefix: String,
    share: Arc<dyn ShareTarget>,
    clock: Arc<dyn Clock>,
}

impl Exporter {
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        share: Arc<dyn ShareTarget>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            share,
            clock,
        }
    }

    pub fn file_name(&self, at: DateTime<Utc>) -> String {
        format!("{}-{}.json", self.prefix, at.format("%Y-%m-%dT%H-%M-%S-%3f"))
    }

    #[instrument(skip(self, contents), fields(bytes = contents.len()))]
    pub async fn export(&self, contents: &str) -> Result<PathBuf, ExportError> {
        if !self.share.is_available() {
            warn!("Share target unavailable; export skipped");
            return Err(ExportError::ShareUnavailable);
        }

        let path = self.dir.join(self.file_name(self.clock.now()));
        let write_error = |path: &Path, e: std::io::Error| ExportError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_error(self.dir.as_path(), e))?;
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| write_error(path.as_path(), e))?;

        self.share
            .share(&path, EXPORT_MIME_TYPE, SHARE_TITLE)
            .map_err(ExportError::Share)?;

        info!(path = %path.display(), "Orders exported");
        Ok(path)
    }
}
