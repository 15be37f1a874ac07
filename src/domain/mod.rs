pub mod product;
pub mod order;
pub mod query;

pub use product::*;
pub use order::*;
pub use query::*;
