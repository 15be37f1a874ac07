use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{CollectionClient, Snapshot};
use crate::analytics::{summarize, Summary, TimeWindow};
use crate::domain::{gym_names, Order, OrderPatch, OrderQuery};
use crate::export::{ExportError, Exporter};
use crate::order_actor::{parse_import, serialize_orders, OperationReport, OrderError};

/// Client for the order collection.
///
/// Mutations go through the collection actor; reads are served from the
/// latest published snapshot.
#[derive(Clone)]
pub struct OrderClient {
    inner: CollectionClient<Order>,
    exporter: Arc<Exporter>,
}

impl OrderClient {
    pub fn new(inner: CollectionClient<Order>, exporter: Arc<Exporter>) -> Self {
        Self { inner, exporter }
    }

    /// Appends a fully built order. Id uniqueness is the caller's job.
    #[instrument(skip(self, order), fields(order_id = %order.id, gym = %order.gym_name))]
    pub async fn add_order(&self, order: Order) -> Result<(), OrderError> {
        debug!("Sending request");
        self.inner.add(order).await?;
        Ok(())
    }

    /// Merges `patch` into the order with `id`.
    ///
    /// Returns `Ok(None)` and changes nothing when no order has that id.
    #[instrument(skip(self, patch))]
    pub async fn update_order(&self, id: String, patch: OrderPatch) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        let updated = self.inner.update(id, patch).await?;
        if updated.is_none() {
            debug!("Update ignored: unknown order");
        }
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn clear_orders(&self) -> Result<usize, OrderError> {
        debug!("Sending request");
        Ok(self.inner.clear().await?)
    }

    #[instrument(skip(self, orders), fields(count = orders.len()))]
    pub async fn replace_all(&self, orders: Vec<Order>) -> Result<usize, OrderError> {
        debug!("Sending request");
        Ok(self.inner.replace_all(orders).await?)
    }

    pub fn orders(&self) -> Arc<Vec<Order>> {
        self.inner.snapshot().items
    }

    pub fn snapshot(&self) -> Snapshot<Order> {
        self.inner.snapshot()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<Snapshot<Order>> {
        self.inner.subscribe()
    }

    /// Pretty-printed JSON array of the current orders.
    pub fn serialize(&self) -> Result<String, OrderError> {
        serialize_orders(&self.orders()).map_err(|e| OrderError::SerializationError(e.to_string()))
    }

    /// Replaces the whole collection with the orders in `text`.
    ///
    /// Destructive: existing orders are discarded, nothing is merged. On any
    /// validation failure the collection is left as it was.
    #[instrument(skip(self, text), fields(bytes = text.len()))]
    pub async fn import_from_text(&self, text: &str) -> OperationReport {
        let orders = match parse_import(text) {
            Ok(orders) => orders,
            Err(e) => {
                warn!(error = %e, "Import rejected");
                return OperationReport::from_import(Err(e));
            }
        };

        match self.replace_all(orders).await {
            Ok(count) => {
                info!(count, "Orders imported");
                OperationReport::from_import(Ok(count))
            }
            Err(e) => OperationReport::failed(e.to_string()),
        }
    }

    /// Writes the serialized collection to a new file and shares it.
    #[instrument(skip(self))]
    pub async fn export_to_sharable_file(&self) -> OperationReport {
        let result = match serialize_orders(&self.orders()) {
            Ok(json) => self.exporter.export(&json).await,
            Err(e) => Err(ExportError::Serialize(e.to_string())),
        };
        if let Err(e) = &result {
            warn!(error = %e, "Export failed");
        }
        OperationReport::from_export(result)
    }

    pub fn query(&self, query: &OrderQuery) -> Vec<Order> {
        query.apply(&self.orders()).into_iter().cloned().collect()
    }

    pub fn gym_names(&self) -> Vec<String> {
        gym_names(&self.orders())
    }

    pub fn summary<Tz: TimeZone>(&self, window: TimeWindow, now: &DateTime<Tz>) -> Summary {
        summarize(&self.orders(), window, now)
    }
}

crate::impl_client_methods!(OrderClient, Order, OrderError, order);
