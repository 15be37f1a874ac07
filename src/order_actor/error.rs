use thiserror::Error;

use crate::actor_framework::FrameworkError;
use crate::persistence::StorageError;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Order update rejected: {0}")]
    ValidationError(String),
    #[error("Order serialization error: {0}")]
    SerializationError(String),
    #[error("Order storage error: {0}")]
    StorageError(#[from] StorageError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<FrameworkError> for OrderError {
    fn from(err: FrameworkError) -> Self {
        match err {
            FrameworkError::Hook(msg) => OrderError::ValidationError(msg),
            other => OrderError::ActorCommunicationError(other.to_string()),
        }
    }
}

/// Reasons an import payload is rejected. The collection is left unchanged.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Syntax(String),
    #[error("Invalid format: expected a JSON array of orders")]
    NotAnArray,
    #[error("Invalid order at position {index}: expected an object")]
    NotAnObject { index: usize },
    #[error("Invalid order at position {index}: missing or invalid '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("Invalid order at position {index}: {message}")]
    Malformed { index: usize, message: String },
}
