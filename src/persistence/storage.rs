use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::StorageError;

/// Named-blob storage the order collection is mirrored to.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Returns `None` when nothing has been stored under `key` yet.
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn write(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// Stores each blob as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl Storage for FileStorage {
    #[instrument(skip(self))]
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(blob) => {
                debug!(bytes = blob.len(), "Read persisted blob");
                Ok(Some(blob))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No persisted blob yet");
                Ok(None)
            }
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    /// Writes to a sibling temp file first, then renames over the target.
    #[instrument(skip(self, blob), fields(bytes = blob.len()))]
    async fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StorageError::io(&self.dir, e))?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob).await.map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| StorageError::io(&path, e))?;
        debug!("Blob written");
        Ok(())
    }
}

#[cfg(test)]
pub use memory::MemoryStorage;
