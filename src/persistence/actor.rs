use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

use super::{Storage, StorageError};

#[derive(Debug)]
pub enum PersistRequest {
    Write {
        blob: String,
    },
    /// Answered once every write queued before it has been attempted.
    Flush {
        respond_to: oneshot::Sender<Result<(), StorageError>>,
    },
}

/// Background writer for the persisted blob.
///
/// Writes are fire-and-forget: failures are logged and remembered until the
/// next [`PersistenceClient::flush`], which reports the first of them.
pub struct PersistenceActor {
    receiver: mpsc::UnboundedReceiver<PersistRequest>,
    storage: Arc<dyn Storage>,
    key: String,
    first_error: Option<StorageError>,
}

impl PersistenceActor {
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> (Self, PersistenceClient) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = Self {
            receiver,
            storage,
            key: key.into(),
            first_error: None,
        };
        (actor, PersistenceClient { sender })
    }

    #[instrument(name = "persistence_actor", skip(self), fields(key = %self.key))]
    pub async fn run(mut self) {
        info!("PersistenceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                PersistRequest::Write { blob } => self.handle_write(blob).await,
                PersistRequest::Flush { respond_to } => {
                    let result = match self.first_error.take() {
                        Some(e) => Err(e),
                        None => Ok(()),
                    };
                    let _ = respond_to.send(result);
                }
            }
        }
        info!("PersistenceActor stopped");
    }

    async fn handle_write(&mut self, blob: String) {
        debug!(bytes = blob.len(), "Writing persisted state");
        if let Err(e) = self.storage.write(&self.key, &blob).await {
            error!(error = %e, "Failed to persist orders");
            if self.first_error.is_none() {
                self.first_error = Some(e);
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct PersistenceClient {
    sender: mpsc::UnboundedSender<PersistRequest>,
}

impl PersistenceClient {
    /// Queues a write and returns immediately.
    pub fn write(&self, blob: String) {
        if self.sender.send(PersistRequest::Write { blob }).is_err() {
            warn!("Persistence actor closed; write dropped");
        }
    }

    /// Waits for queued writes and reports the first failure since the last flush.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<(), StorageError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PersistRequest::Flush { respond_to })
            .map_err(|_| StorageError::Unavailable("persistence actor closed".to_string()))?;
        response
            .await
            .map_err(|_| StorageError::Unavailable("persistence actor dropped".to_string()))?
    }
}
