use std::fmt::{Debug, Display};
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, instrument};

use crate::clock::Clock;
use crate::persistence::{encode_state, PersistedState, PersistenceClient};

// =============================================================================
// 1. THE ABSTRACTION (Entity trait with update hook)
// =============================================================================

/// Trait that any record must implement to be kept by a [`CollectionActor`].
pub trait Entity: Clone + Debug + Send + Sync + Serialize + 'static {
    type Id: Eq + Clone + Send + Sync + Display + Debug;
    type Patch: Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Last modification time, used to keep update stamps strictly increasing.
    fn updated_at(&self) -> DateTime<Utc>;

    /// Merge `patch` into the record and stamp it with `stamp`.
    fn on_update(&mut self, patch: Self::Patch, stamp: DateTime<Utc>) -> Result<(), String>;
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped")]
    ActorDropped,
    #[error("Update rejected: {0}")]
    Hook(String),
}

// =============================================================================
// 2. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum CollectionRequest<T: Entity> {
    Add {
        item: T,
        respond_to: Response<u64>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    /// Responds `None` when no record has the id.
    Update {
        id: T::Id,
        patch: T::Patch,
        respond_to: Response<Option<T>>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<bool>,
    },
    Clear {
        respond_to: Response<usize>,
    },
    ReplaceAll {
        items: Vec<T>,
        respond_to: Response<usize>,
    },
}

/// Immutable view of the collection as published after each change.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub items: Arc<Vec<T>>,
    /// Change marker; strictly increases with every state change.
    pub last_updated: u64,
}

#[cfg(test)]
impl<T> Snapshot<T> {
    pub fn empty() -> Self {
        Self { items: Arc::new(Vec::new()), last_updated: 0 }
    }
}

// =============================================================================
// 3. THE GENERIC ACTOR SERVER
// =============================================================================

/// Owns an insertion-ordered collection and serialises every access to it.
///
/// After each state change the actor publishes a new [`Snapshot`] before
/// answering, then hands the encoded state to the persistence actor without
/// waiting for it to be written.
pub struct CollectionActor<T: Entity> {
    receiver: mpsc::Receiver<CollectionRequest<T>>,
    items: Vec<T>,
    last_updated: u64,
    clock: Arc<dyn Clock>,
    snapshots: watch::Sender<Snapshot<T>>,
    persistence: Option<PersistenceClient>,
}

impl<T: Entity> CollectionActor<T> {
    pub fn new(
        buffer_size: usize,
        clock: Arc<dyn Clock>,
        initial: Option<PersistedState<T>>,
        persistence: Option<PersistenceClient>,
    ) -> (Self, CollectionClient<T>) {
        let PersistedState { orders: items, last_updated } = initial.unwrap_or(PersistedState {
            orders: Vec::new(),
            last_updated: 0,
        });
        let (sender, receiver) = mpsc::channel(buffer_size);
        let (snapshots, snapshot_rx) = watch::channel(Snapshot {
            items: Arc::new(items.clone()),
            last_updated,
        });
        let actor = Self {
            receiver,
            items,
            last_updated,
            clock,
            snapshots,
            persistence,
        };
        (actor, CollectionClient::new(sender, snapshot_rx))
    }

    #[instrument(name = "collection_actor", skip(self))]
    pub async fn run(mut self) {
        info!(items = self.items.len(), "CollectionActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CollectionRequest::Add { item, respond_to } => {
                    debug!(id = %item.id(), "Adding item");
                    self.items.push(item);
                    self.commit();
                    let _ = respond_to.send(Ok(self.last_updated));
                }
                CollectionRequest::Get { id, respond_to } => {
                    let item = self.items.iter().find(|item| item.id() == &id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                CollectionRequest::Update { id, patch, respond_to } => {
                    let _ = respond_to.send(self.handle_update(id, patch));
                }
                CollectionRequest::Delete { id, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_delete(id)));
                }
                CollectionRequest::Clear { respond_to } => {
                    let removed = self.items.len();
                    self.items.clear();
                    self.commit();
                    info!(removed, "Collection cleared");
                    let _ = respond_to.send(Ok(removed));
                }
                CollectionRequest::ReplaceAll { items, respond_to } => {
                    let count = items.len();
                    self.items = items;
                    self.commit();
                    info!(count, "Collection replaced");
                    let _ = respond_to.send(Ok(count));
                }
            }
        }
        info!("CollectionActor stopped");
    }

    #[instrument(fields(id = %id), skip(self, patch))]
    fn handle_update(&mut self, id: T::Id, patch: T::Patch) -> Result<Option<T>, FrameworkError> {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == &id) else {
            debug!("No item with this id; update ignored");
            return Ok(None);
        };

        let now = self.clock.now();
        let previous = item.updated_at();
        let stamp = if now > previous { now } else { previous + TimeDelta::milliseconds(1) };

        // Patch a copy so a rejected update leaves the stored record untouched.
        let mut updated = item.clone();
        updated.on_update(patch, stamp).map_err(FrameworkError::Hook)?;
        *item = updated.clone();

        self.commit();
        Ok(Some(updated))
    }

    #[instrument(fields(id = %id), skip(self))]
    fn handle_delete(&mut self, id: T::Id) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != &id);
        if self.items.len() == before {
            debug!("No item with this id; delete ignored");
            return false;
        }
        self.commit();
        true
    }

    /// Bumps the change marker, publishes a snapshot and queues a write.
    fn commit(&mut self) {
        let now = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or(0);
        self.last_updated = now.max(self.last_updated + 1);

        self.snapshots.send_replace(Snapshot {
            items: Arc::new(self.items.clone()),
            last_updated: self.last_updated,
        });

        if let Some(persistence) = &self.persistence {
            match encode_state(&self.items, self.last_updated) {
                Ok(blob) => persistence.write(blob),
                Err(e) => error!(error = %e, "Failed to encode collection for persistence"),
            }
        }
    }
}

// =============================================================================
// 4. THE GENERIC CLIENT
// =============================================================================

pub struct CollectionClient<T: Entity> {
    sender: mpsc::Sender<CollectionRequest<T>>,
    snapshots: watch::Receiver<Snapshot<T>>,
}

impl<T: Entity> Clone for CollectionClient<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            snapshots: self.snapshots.clone(),
        }
    }
}

impl<T: Entity> CollectionClient<T> {
    pub fn new(sender: mpsc::Sender<CollectionRequest<T>>, snapshots: watch::Receiver<Snapshot<T>>) -> Self {
        Self { sender, snapshots }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> CollectionRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    /// Appends `item`; returns the new change marker.
    pub async fn add(&self, item: T) -> Result<u64, FrameworkError> {
        self.request(|respond_to| CollectionRequest::Add { item, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| CollectionRequest::Get { id, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, patch: T::Patch) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| CollectionRequest::Update { id, patch, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> Result<bool, FrameworkError> {
        self.request(|respond_to| CollectionRequest::Delete { id, respond_to }).await
    }

    pub async fn clear(&self) -> Result<usize, FrameworkError> {
        self.request(|respond_to| CollectionRequest::Clear { respond_to }).await
    }

    pub async fn replace_all(&self, items: Vec<T>) -> Result<usize, FrameworkError> {
        self.request(|respond_to| CollectionRequest::ReplaceAll { items, respond_to }).await
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    #[cfg(test)]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.snapshots.clone()
    }
}

// =============================================================================
// 5. EXAMPLE USAGE (Test)
// =============================================================================
