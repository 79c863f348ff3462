//! Storefront API client
//!
//! Async client for the Order/Cart REST API: an object-safe transport
//! trait with a network (`reqwest`) and an in-process (`axum` oneshot)
//! implementation, plus endpoint wrappers that normalize the backend's
//! envelope quirks into typed payloads.

pub mod cart;
pub mod config;
pub mod error;
pub mod oneshot;
pub mod order;
pub mod transport;

// Re-exports
pub use cart::CartApi;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use oneshot::OneshotTransport;
pub use order::OrderApi;
pub use transport::{HttpTransport, NetworkTransport};
