//! Checkout validation and submission

pub mod orchestrator;
pub mod validate;

pub use orchestrator::{CheckoutFlow, CheckoutOutcome};
pub use validate::{CheckoutForm, FieldError, ValidatedCheckout, ValidationErrors, validate};
