//! Cart and checkout subsystem of the storefront.
//!
//! The [`cart::CartEngine`] is the single entry point for cart
//! mutations. It dispatches each operation to the device-local guest
//! cart or the server cart depending on whether a session token is
//! stored, and funnels every result into one shared state shape.
//! [`checkout::CheckoutFlow`] sits on top of the engine for order
//! submission, including the guest OTP gate.

pub mod cart;
pub mod checkout;
pub mod error;
pub mod session;
pub mod signals;

pub use cart::{
    BackendMode, CartEngine, CartState, GuestCartStore, LineItemController, LineView,
    MigrationReport,
};
pub use checkout::{CheckoutFlow, CheckoutForm, CheckoutOutcome};
pub use error::{CartError, CartResult};
pub use session::{AuthSession, SessionStore};
pub use signals::{SessionSignal, SignalHub};
