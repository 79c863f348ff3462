//! Cart error types

use thiserror::Error;

use lotus_client::ClientError;

/// Errors raised across the cart and checkout flows.
#[derive(Error, Debug)]
pub enum CartError {
    /// Malformed input to a cart or checkout operation
    #[error("{0}")]
    Validation(String),

    /// Requested quantity would pass the available stock
    #[error("only {available} left in stock")]
    StockExceeded { available: u32 },

    /// Guest cart distinct-product ceiling reached
    #[error("cart is limited to {max} distinct products")]
    CapacityFull { max: usize },

    /// Mutation referenced a line that is not in the cart
    #[error("{0}")]
    NotFound(String),

    /// Backend or network failure, with the backend's text when it
    /// sent any
    #[error("{0}")]
    Transport(String),

    /// HTTP 401; handled globally, not by the caller
    #[error("session expired")]
    AuthExpired,

    /// Order creation came back unusable or the cart was empty/stale
    #[error("order submission failed: {0}")]
    OrderSubmission(String),

    /// Persisted client-side state could not be read or written
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted client-side state did not parse
    #[error("corrupt persisted state: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CartResult<T> = Result<T, CartError>;

impl From<ClientError> for CartError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Unauthorized => CartError::AuthExpired,
            ClientError::NotFound(message) => CartError::NotFound(message),
            other => CartError::Transport(other.user_message()),
        }
    }
}
