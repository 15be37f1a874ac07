//! Typed handles for talking to the actors.

mod macros;
pub mod order_client;

pub use order_client::*;
