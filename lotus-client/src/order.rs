//! Order endpoints
//!
//! Order creation plus the guest OTP pair. The created order's id may
//! surface at `data.id` or `data.data.id` depending on backend code
//! path; a success response without an id is treated as unusable.

use serde_json::{Value, json};
use std::sync::Arc;

use shared::envelope::{ApiEnvelope, probe_for};
use shared::models::{CreateOrderRequest, CreatedOrder};

use crate::error::{ClientError, ClientResult};
use crate::transport::HttpTransport;

/// Client for order creation and OTP verification.
#[derive(Clone)]
pub struct OrderApi {
    transport: Arc<dyn HttpTransport>,
}

impl OrderApi {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// `POST /api/orders`
    pub async fn create_order(&self, request: &CreateOrderRequest) -> ClientResult<CreatedOrder> {
        tracing::debug!(
            is_guest = request.is_guest,
            payment_method = ?request.payment_method,
            "creating order"
        );
        let body = serde_json::to_value(request)?;
        let value = self.transport.post("/api/orders", body).await?;
        parse_order_response(value)
    }

    /// `POST /api/otp/request`: ask the backend to text a code to the
    /// given phone.
    pub async fn request_otp(&self, phone: &str) -> ClientResult<()> {
        let value = self
            .transport
            .post("/api/otp/request", json!({ "phone": phone }))
            .await?;
        expect_success(value)
    }

    /// `POST /api/otp/verify`: a rejected code comes back as an `Api`
    /// error carrying the backend's text.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> ClientResult<()> {
        let value = self
            .transport
            .post("/api/otp/verify", json!({ "phone": phone, "code": code }))
            .await?;
        expect_success(value)
    }
}

fn expect_success(value: Value) -> ClientResult<()> {
    let envelope: ApiEnvelope<Value> = serde_json::from_value(value)?;
    if !envelope.success {
        return Err(ClientError::Api {
            message: envelope.failure_message(),
        });
    }
    Ok(())
}

fn parse_order_response(value: Value) -> ClientResult<CreatedOrder> {
    let envelope: ApiEnvelope<Value> = serde_json::from_value(value)?;
    if !envelope.success {
        return Err(ClientError::Api {
            message: envelope.failure_message(),
        });
    }
    let data = envelope.data.ok_or_else(|| {
        ClientError::InvalidResponse("order response carried no data".to_string())
    })?;
    let holder = probe_for(&data, "id")
        .ok_or_else(|| ClientError::InvalidResponse("created order has no id".to_string()))?;
    let id = match holder.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(ClientError::InvalidResponse("created order has no id".to_string())),
    };
    let total_amount = holder.get("totalAmount").and_then(Value::as_f64);
    Ok(CreatedOrder { id, total_amount })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn order_id_found_at_both_depths() {
        let direct = json!({
            "success": true,
            "data": { "id": "ord-1", "totalAmount": 200_000.0 }
        });
        let nested = json!({
            "success": true,
            "data": { "data": { "id": "ord-2" } }
        });

        let order = parse_order_response(direct).unwrap();
        assert_eq!(order.id, "ord-1");
        assert_eq!(order.total_amount, Some(200_000.0));

        let order = parse_order_response(nested).unwrap();
        assert_eq!(order.id, "ord-2");
        assert_eq!(order.total_amount, None);
    }

    #[test]
    fn numeric_ids_are_accepted() {
        let order = parse_order_response(json!({
            "success": true,
            "data": { "id": 9137 }
        }))
        .unwrap();
        assert_eq!(order.id, "9137");
    }

    #[test]
    fn success_without_usable_id_is_invalid() {
        let missing = json!({ "success": true, "data": { "status": "PENDING" } });
        assert!(matches!(
            parse_order_response(missing),
            Err(ClientError::InvalidResponse(_))
        ));

        let empty_id = json!({ "success": true, "data": { "id": "" } });
        assert!(matches!(
            parse_order_response(empty_id),
            Err(ClientError::InvalidResponse(_))
        ));
    }

    #[test]
    fn otp_rejection_surfaces_backend_text() {
        let err = expect_success(json!({
            "success": false,
            "message": "Mã OTP không đúng"
        }))
        .unwrap_err();
        match err {
            ClientError::Api { message } => assert_eq!(message, "Mã OTP không đúng"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
