//! Durable mirror of the order collection.
//!
//! The collection is stored as one named blob holding
//! `{"orders": [...], "lastUpdated": <millis>}`.

mod actor;
pub mod error;
mod storage;

pub use actor::*;
pub use error::*;
pub use storage::*;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState<T> {
    pub orders: Vec<T>,
    #[serde(default)]
    pub last_updated: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersistedStateRef<'a, T> {
    orders: &'a [T],
    last_updated: u64,
}

/// Renders the blob for `items` without cloning them.
pub fn encode_state<T: Serialize>(items: &[T], last_updated: u64) -> Result<String, serde_json::Error> {
    serde_json::to_string(&PersistedStateRef { orders: items, last_updated })
}

/// Reads and decodes the blob stored under `key`, if any.
pub async fn load_state<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<PersistedState<T>>, StorageError> {
    let Some(blob) = storage.read(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&blob)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_round_trips_through_storage() {
        let storage = MemoryStorage::new();
        let blob = encode_state(&[1u32, 2, 3], 42).unwrap();
        assert_eq!(blob, r#"{"orders":[1,2,3],"lastUpdated":42}"#);
        storage.write("orders-storage", &blob).await.unwrap();

        let state: PersistedState<u32> = load_state(&storage, "orders-storage").await.unwrap().unwrap();
        assert_eq!(state, PersistedState { orders: vec![1, 2, 3], last_updated: 42 });
    }

    #[tokio::test]
    async fn missing_blob_loads_as_none() {
        let storage = MemoryStorage::new();
        let state: Option<PersistedState<u32>> = load_state(&storage, "orders-storage").await.unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn corrupt_blob_is_an_error() {
        let storage = MemoryStorage::new();
        storage.write("orders-storage", "not json").await.unwrap();
        let err = load_state::<u32>(&storage, "orders-storage").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { ref key, .. } if key == "orders-storage"));
    }
}
