//! Cart endpoints
//!
//! Wrappers over the server cart API. Every operation returns the full
//! updated cart, dug out of the envelope no matter how many `data`
//! layers the backend wrapped it in.

use serde_json::{Value, json};
use std::sync::Arc;

use shared::envelope::ApiEnvelope;
use shared::models::CartPayload;

use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpTransport, decode_payload};

/// Client for the authenticated cart endpoints.
#[derive(Clone)]
pub struct CartApi {
    transport: Arc<dyn HttpTransport>,
}

impl CartApi {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<dyn HttpTransport> {
        &self.transport
    }

    fn item_path(product_id: &str) -> String {
        format!("/api/cart/items/{}", urlencoding::encode(product_id))
    }

    /// `GET /api/cart`
    pub async fn view(&self) -> ClientResult<CartPayload> {
        let value = self.transport.get("/api/cart").await?;
        parse_cart_response(value)
    }

    /// `POST /api/cart/items`
    pub async fn add_item(&self, product_id: &str, quantity: u32) -> ClientResult<CartPayload> {
        tracing::debug!(product_id = %product_id, quantity, "adding item to server cart");
        let body = json!({ "productId": product_id, "quantity": quantity });
        let value = self.transport.post("/api/cart/items", body).await?;
        parse_cart_response(value)
    }

    /// `PUT /api/cart/items/{productId}/increase`
    pub async fn increase_item(&self, product_id: &str, amount: u32) -> ClientResult<CartPayload> {
        let path = format!("{}/increase", Self::item_path(product_id));
        let value = self.transport.put(&path, json!({ "amount": amount })).await?;
        parse_cart_response(value)
    }

    /// `PUT /api/cart/items/{productId}/decrease`
    pub async fn decrease_item(&self, product_id: &str, amount: u32) -> ClientResult<CartPayload> {
        let path = format!("{}/decrease", Self::item_path(product_id));
        let value = self.transport.put(&path, json!({ "amount": amount })).await?;
        parse_cart_response(value)
    }

    /// `DELETE /api/cart/items/{productId}`
    pub async fn remove_item(&self, product_id: &str) -> ClientResult<CartPayload> {
        let value = self.transport.delete(&Self::item_path(product_id)).await?;
        parse_cart_response(value)
    }

    /// `DELETE /api/cart`
    pub async fn clear(&self) -> ClientResult<CartPayload> {
        let value = self.transport.delete("/api/cart").await?;
        parse_cart_response(value)
    }
}

/// Normalize a cart endpoint response into `CartPayload`.
///
/// The payload may sit at `data`, `data.data`, or `data.data.data`; a
/// success with no data at all (clear returns this) is an empty cart.
fn parse_cart_response(value: Value) -> ClientResult<CartPayload> {
    let envelope: ApiEnvelope<Value> = serde_json::from_value(value)?;
    if !envelope.success {
        return Err(ClientError::Api {
            message: envelope.failure_message(),
        });
    }
    let Some(data) = envelope.data else {
        return Ok(CartPayload::default());
    };
    decode_payload(&data, "cartItems", "cart payload not found in response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cart_json() -> Value {
        json!({
            "cartItems": [{
                "id": "line-1",
                "productId": "p1",
                "quantity": 2,
                "product": {
                    "id": "p1",
                    "name": "RTX 4070",
                    "price": 15_990_000.0,
                    "stock": 8,
                    "images": [],
                }
            }],
            "totalAmount": 31_980_000.0
        })
    }

    #[test]
    fn parses_payload_at_any_nesting_depth() {
        let shapes = [
            json!({ "success": true, "message": "ok", "data": cart_json() }),
            json!({ "success": true, "message": "ok", "data": { "data": cart_json() } }),
            json!({ "success": true, "message": "ok", "data": { "data": { "data": cart_json() } } }),
        ];
        for shape in shapes {
            let payload = parse_cart_response(shape).expect("payload parsed");
            assert_eq!(payload.cart_items.len(), 1);
            assert_eq!(payload.cart_items[0].product_id, "p1");
            assert_eq!(payload.total_amount, 31_980_000.0);
        }
    }

    #[test]
    fn success_without_data_is_empty_cart() {
        let payload =
            parse_cart_response(json!({ "success": true, "message": "Đã xóa giỏ hàng" })).unwrap();
        assert!(payload.cart_items.is_empty());
        assert_eq!(payload.total_amount, 0.0);
    }

    #[test]
    fn failure_envelope_surfaces_backend_text() {
        let err = parse_cart_response(json!({
            "success": false,
            "message": "Sản phẩm đã hết hàng"
        }))
        .unwrap_err();
        match err {
            ClientError::Api { message } => assert_eq!(message, "Sản phẩm đã hết hàng"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn data_without_cart_items_is_rejected() {
        let err = parse_cart_response(json!({
            "success": true,
            "data": { "data": { "orders": [] } }
        }))
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
