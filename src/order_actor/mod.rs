//! Order-specific collection logic: the update hook, the JSON codec used for
//! import/export, and the user-facing operation report.

mod codec;
pub mod entity;
pub mod error;
mod report;

pub use codec::*;
pub use error::*;
pub use report::*;
