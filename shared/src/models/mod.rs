//! Data models
//!
//! Shared between the cart core and the Order/Cart API client. Wire
//! structs serialize camelCase to match the storefront backend; all
//! ids are `String`.

pub mod cart;
pub mod customer;
pub mod geo;
pub mod order;
pub mod product;

// Re-exports
pub use cart::*;
pub use customer::*;
pub use geo::*;
pub use order::*;
pub use product::*;
