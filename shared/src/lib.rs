//! Shared types for the Lotus storefront core
//!
//! Wire models for the Order/Cart API (camelCase on the wire), the
//! response envelope with its nested-payload probing, and money/time
//! helpers used across the workspace.

pub mod envelope;
pub mod models;
pub mod money;
pub mod util;

// Re-exports
pub use envelope::ApiEnvelope;
pub use serde::{Deserialize, Serialize};
