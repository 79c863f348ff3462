//! HTTP transport
//!
//! Object-safe transport trait plus the network implementation. The
//! backend wraps everything in envelopes with unpredictable nesting,
//! so the transport hands back raw `serde_json::Value` and the
//! endpoint wrappers do the probing.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

use shared::envelope::{ApiEnvelope, probe_for};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Async HTTP transport to the storefront API.
///
/// The token is swappable at runtime so one shared transport follows
/// the session through login and logout.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, path: &str) -> ClientResult<Value>;
    async fn post(&self, path: &str, body: Value) -> ClientResult<Value>;
    async fn put(&self, path: &str, body: Value) -> ClientResult<Value>;
    async fn delete(&self, path: &str) -> ClientResult<Value>;
    async fn set_token(&self, token: Option<String>);
    async fn token(&self) -> Option<String>;
}

/// Map a non-success HTTP status to a client error, extracting the
/// backend's own message from the body when it sent one.
pub(crate) fn error_from_status(status: StatusCode, body: &str) -> ClientError {
    // 401 is session invalidation, never a generic failure, so it is
    // classified before the body is considered.
    if status == StatusCode::UNAUTHORIZED {
        return ClientError::Unauthorized;
    }
    if let Ok(envelope) = serde_json::from_str::<ApiEnvelope<Value>>(body) {
        return match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(envelope.failure_message()),
            _ => ClientError::Api {
                message: envelope.failure_message(),
            },
        };
    }
    match status {
        StatusCode::NOT_FOUND => ClientError::NotFound(body.to_string()),
        _ => ClientError::Api {
            message: if body.is_empty() {
                format!("request failed with status {}", status.as_u16())
            } else {
                body.to_string()
            },
        },
    }
}

/// Decode the object holding `key` under a response's `data` into `T`,
/// searching down through the nested `data` layers.
pub(crate) fn decode_payload<T: DeserializeOwned>(
    data: &Value,
    key: &str,
    missing: &str,
) -> ClientResult<T> {
    let holder =
        probe_for(data, key).ok_or_else(|| ClientError::InvalidResponse(missing.to_string()))?;
    Ok(serde_json::from_value(holder.clone())?)
}

/// Network transport over `reqwest`.
#[derive(Debug, Clone)]
pub struct NetworkTransport {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl NetworkTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(config.token.clone())),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn auth_header(&self) -> Option<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| format!("Bearer {}", t))
    }

    async fn handle_response(&self, response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(error_from_status(status, &text));
        }
        serde_json::from_str(&text)
            .map_err(|e| ClientError::InvalidResponse(format!("JSON parse error: {}", e)))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> ClientResult<Value> {
        let mut req = req;
        if let Some(auth) = self.auth_header().await {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        let response = req.send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl HttpTransport for NetworkTransport {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        self.send(self.client.get(self.url(path))).await
    }

    async fn post(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.send(self.client.post(self.url(path)).json(&body)).await
    }

    async fn put(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.send(self.client.put(self.url(path)).json(&body)).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.send(self.client.delete(self.url(path))).await
    }

    async fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().await;
        *guard = token;
    }

    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}
