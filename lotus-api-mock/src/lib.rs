//! Mock Order/Cart API
//!
//! In-memory stand-in for the storefront backend, reproducing its
//! envelope quirks: configurable `data` nesting around cart payloads,
//! order ids at `data.id` or `data.data.id`, Vietnamese failure
//! messages, and strict bearer-token checks that 401 on anything
//! stale. Integration tests drive the router in process; `main` serves
//! it on a port for manual poking.

pub mod api;
pub mod state;

pub use api::build_router;
pub use state::{AppState, MockOptions};
