use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::actor_framework::CollectionActor;
use crate::clients::OrderClient;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ShareKind};
use crate::domain::Order;
use crate::export::{ConsoleShare, DisabledShare, Exporter, ShareTarget};
use crate::order_actor::OrderError;
use crate::persistence::{load_state, FileStorage, PersistenceActor, PersistenceClient, Storage};

/// The composition root: loads persisted orders, starts the actors and wires
/// the client to them.
pub struct OrderSystem {
    pub order_client: OrderClient,
    persistence: PersistenceClient,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderSystem {
    /// Starts the system on file storage as described by `config`.
    pub async fn start(config: &Config) -> Result<Self, OrderError> {
        let storage = Arc::new(FileStorage::new(&config.storage.data_dir));
        let share: Arc<dyn ShareTarget> = match config.export.share {
            ShareKind::Console => Arc::new(ConsoleShare),
            ShareKind::Disabled => Arc::new(DisabledShare),
        };
        Self::with_parts(config, storage, share, Arc::new(SystemClock)).await
    }

    #[instrument(name = "order_system", skip_all, fields(key = %config.storage.key))]
    pub async fn with_parts(
        config: &Config,
        storage: Arc<dyn Storage>,
        share: Arc<dyn ShareTarget>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, OrderError> {
        // 1. Load whatever was persisted last time
        let initial = load_state::<Order>(storage.as_ref(), &config.storage.key).await?;
        match &initial {
            Some(state) => info!(orders = state.orders.len(), "Loaded persisted orders"),
            None => info!("No persisted orders; starting empty"),
        }

        // 2. Setup the background writer
        let (persistence_actor, persistence) = PersistenceActor::new(storage, config.storage.key.clone());
        let persistence_handle = tokio::spawn(persistence_actor.run());

        // 3. Setup the order collection
        let (order_actor, order_resource_client) = CollectionActor::<Order>::new(
            config.actor.buffer_size,
            clock.clone(),
            initial,
            Some(persistence.clone()),
        );
        let order_handle = tokio::spawn(order_actor.run());

        let exporter = Arc::new(Exporter::new(
            config.export.dir.clone(),
            config.export.prefix.clone(),
            share,
            clock,
        ));

        Ok(Self {
            order_client: OrderClient::new(order_resource_client, exporter),
            persistence,
            // The order actor must stop before the persistence actor can.
            handles: vec![order_handle, persistence_handle],
        })
    }

    /// Waits until every queued write has been attempted.
    pub async fn flush(&self) -> Result<(), OrderError> {
        Ok(self.persistence.flush().await?)
    }

    /// Flushes pending writes and stops the actors.
    ///
    /// Clones of `order_client` held elsewhere keep the order actor alive, so
    /// drop them first.
    pub async fn shutdown(self) -> Result<(), OrderError> {
        info!("Shutting down system...");
        let flushed = self.flush().await;

        // Dropping the last senders closes the channels; each actor loop then ends.
        drop(self.order_client);
        drop(self.persistence);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(OrderError::ActorCommunicationError(format!("Actor task failed: {:?}", e)));
            }
        }

        flushed?;
        info!("System shutdown complete.");
        Ok(())
    }
}
