//! Order/Cart API response envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How many `data` wrappers the backend has been observed to stack.
const MAX_DATA_NESTING: usize = 3;

/// Standard wrapper returned by every Order/Cart API endpoint.
///
/// `data` may hold the payload directly or wrap it in further
/// `{ "data": ... }` layers depending on the endpoint; use
/// [`probe_for`] on the raw value to find the real payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Best human-readable failure text: `error` over `message` over a
    /// generic fallback.
    pub fn failure_message(&self) -> String {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("request failed")
            .to_string()
    }
}

/// Find the first object carrying `key`, descending through stacked
/// `data` wrappers.
///
/// Returns the object that contains `key`, not the keyed value itself,
/// so callers can deserialize the whole payload from it.
pub fn probe_for<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = value;
    for _ in 0..=MAX_DATA_NESTING {
        if current.get(key).is_some() {
            return Some(current);
        }
        match current.get("data") {
            Some(inner) => current = inner,
            None => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn probe_finds_payload_at_each_depth() {
        let flat = json!({"cartItems": [], "totalAmount": 0});
        let single = json!({"data": {"cartItems": [], "totalAmount": 0}});
        let double = json!({"data": {"data": {"cartItems": [], "totalAmount": 0}}});
        let triple = json!({"data": {"data": {"data": {"cartItems": [], "totalAmount": 0}}}});

        for value in [&flat, &single, &double, &triple] {
            let found = probe_for(value, "cartItems").expect("payload located");
            assert!(found.get("cartItems").is_some());
        }
    }

    #[test]
    fn probe_misses_when_key_absent() {
        let value = json!({"data": {"data": {"somethingElse": 1}}});
        assert!(probe_for(&value, "cartItems").is_none());
    }

    #[test]
    fn probe_stops_at_depth_limit() {
        let value = json!({"data": {"data": {"data": {"data": {"cartItems": []}}}}});
        assert!(probe_for(&value, "cartItems").is_none());
    }

    #[test]
    fn failure_message_prefers_error_field() {
        let envelope: ApiEnvelope<Value> = serde_json::from_value(json!({
            "success": false,
            "message": "Yêu cầu thất bại",
            "error": "Sản phẩm không tồn tại"
        }))
        .unwrap();
        assert_eq!(envelope.failure_message(), "Sản phẩm không tồn tại");
    }

    #[test]
    fn failure_message_falls_back_to_generic() {
        let envelope: ApiEnvelope<Value> = serde_json::from_value(json!({
            "success": false
        }))
        .unwrap();
        assert_eq!(envelope.failure_message(), "request failed");
    }
}
