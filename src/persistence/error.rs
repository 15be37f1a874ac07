use std::path::Path;

use thiserror::Error;

/// Errors raised by the storage layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {message}")]
    Io { path: String, message: String },
    #[error("Persisted state '{key}' is corrupt: {message}")]
    Corrupt { key: String, message: String },
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        StorageError::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}
