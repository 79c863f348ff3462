//! In-process transport
//!
//! Drives an `axum::Router` through Tower's oneshot call, so tests and
//! demos can exercise the full client stack against a mock API with no
//! socket in between.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::Request;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, error_from_status};

/// Transport that calls a router in memory.
///
/// # Example
///
/// ```ignore
/// let router: Router = lotus_api_mock::build_router(Default::default());
/// let transport = OneshotTransport::new(router);
/// let cart = CartApi::new(Arc::new(transport)).view().await?;
/// ```
#[derive(Debug, Clone)]
pub struct OneshotTransport {
    router: Arc<RwLock<Router>>,
    token: Arc<RwLock<Option<String>>>,
}

impl OneshotTransport {
    pub fn new(router: Router) -> Self {
        Self {
            router: Arc::new(RwLock::new(router)),
            token: Arc::new(RwLock::new(None)),
        }
    }

    async fn build_request(
        &self,
        method: http::Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Request<Body>> {
        let mut builder = Request::builder().method(method).uri(path);

        if let Some(token) = self.token.read().await.clone() {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }

        let body = match body {
            Some(value) => Body::from(serde_json::to_vec(&value)?),
            None => Body::empty(),
        };

        builder
            .header("Content-Type", "application/json")
            .body(body)
            .map_err(|e| ClientError::Internal(format!("failed to build request: {}", e)))
    }

    async fn execute(&self, request: Request<Body>) -> ClientResult<Value> {
        let router = self.router.read().await.clone();

        let response = router
            .oneshot(request)
            .await
            .map_err(|e| ClientError::Internal(format!("oneshot call failed: {}", e)))?;

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ClientError::Internal(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body_bytes).to_string();
            return Err(error_from_status(status, &text));
        }

        serde_json::from_slice(&body_bytes)
            .map_err(|e| ClientError::InvalidResponse(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl HttpTransport for OneshotTransport {
    async fn get(&self, path: &str) -> ClientResult<Value> {
        let request = self.build_request(http::Method::GET, path, None).await?;
        self.execute(request).await
    }

    async fn post(&self, path: &str, body: Value) -> ClientResult<Value> {
        let request = self
            .build_request(http::Method::POST, path, Some(body))
            .await?;
        self.execute(request).await
    }

    async fn put(&self, path: &str, body: Value) -> ClientResult<Value> {
        let request = self
            .build_request(http::Method::PUT, path, Some(body))
            .await?;
        self.execute(request).await
    }

    async fn delete(&self, path: &str) -> ClientResult<Value> {
        let request = self.build_request(http::Method::DELETE, path, None).await?;
        self.execute(request).await
    }

    async fn set_token(&self, token: Option<String>) {
        let mut guard = self.token.write().await;
        *guard = token;
    }

    async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }
}
