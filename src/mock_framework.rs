//! # Mock Framework
//!
//! Utilities for testing clients in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_update`] or [`expect_replace_all`] to assert behavior.

use tokio::sync::{mpsc, watch};

use crate::actor_framework::{CollectionClient, CollectionRequest, Entity, Response, Snapshot};

/// Creates a mock client and a receiver for asserting requests.
///
/// The returned watch sender stands in for the actor's snapshot publisher.
pub fn create_mock_client<T: Entity>(
    buffer_size: usize,
) -> (CollectionClient<T>, mpsc::Receiver<CollectionRequest<T>>, watch::Sender<Snapshot<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    let (snapshots, snapshot_rx) = watch::channel(Snapshot::empty());
    (CollectionClient::new(sender, snapshot_rx), receiver, snapshots)
}

/// Helper to verify that the next message is an Add request
pub async fn expect_add<T: Entity>(receiver: &mut mpsc::Receiver<CollectionRequest<T>>) -> Option<(T, Response<u64>)> {
    match receiver.recv().await {
        Some(CollectionRequest::Add { item, respond_to }) => Some((item, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Update request
pub async fn expect_update<T: Entity>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<(T::Id, T::Patch, Response<Option<T>>)> {
    match receiver.recv().await {
        Some(CollectionRequest::Update { id, patch, respond_to }) => Some((id, patch, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Delete request
pub async fn expect_delete<T: Entity>(receiver: &mut mpsc::Receiver<CollectionRequest<T>>) -> Option<(T::Id, Response<bool>)> {
    match receiver.recv().await {
        Some(CollectionRequest::Delete { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a ReplaceAll request
pub async fn expect_replace_all<T: Entity>(
    receiver: &mut mpsc::Receiver<CollectionRequest<T>>,
) -> Option<(Vec<T>, Response<usize>)> {
    match receiver.recv().await {
        Some(CollectionRequest::ReplaceAll { items, respond_to }) => Some((items, respond_to)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Order, OrderStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver, _snapshots) = create_mock_client::<Order>(10);

        let add_task = tokio::spawn(async move {
            let order = Order::new("1", "Test Gym", Vec::new(), OrderStatus::Delivered, Utc::now());
            client.add(order).await
        });

        let (item, responder) = expect_add(&mut receiver).await.expect("Expected Add request");
        assert_eq!(item.gym_name, "Test Gym");
        responder.send(Ok(7)).unwrap();

        let result = add_task.await.unwrap();
        assert_eq!(result, Ok(7));
    }
}
