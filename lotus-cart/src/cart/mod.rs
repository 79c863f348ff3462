//! Cart state and its two backends

pub mod engine;
pub mod guest;
pub mod line_item;

pub use engine::{BackendMode, CartEngine, CartState, LineView, MigrationReport, OpKind};
pub use guest::{GuestCartStore, MAX_GUEST_LINES};
pub use line_item::LineItemController;
