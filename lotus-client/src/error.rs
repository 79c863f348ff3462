//! Client error types

use thiserror::Error;

/// Errors surfaced by the storefront API client.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network-level failure (DNS, connect, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response arrived but its shape was unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// HTTP 401; the stored session is no longer valid
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 404 for a resource the caller referenced
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend rejected the request and said why
    #[error("{message}")]
    Api { message: String },

    /// JSON encode/decode failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// In-process transport plumbing failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Human-readable text preferring whatever the backend said.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { message } => message.clone(),
            ClientError::NotFound(msg) if !msg.is_empty() => msg.clone(),
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
