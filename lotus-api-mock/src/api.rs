//! Mock API handlers

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use shared::models::CreateOrderRequest;
use shared::money;

use crate::state::{AppState, ServerLine};

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    product_id: String,
    quantity: u32,
}

#[derive(Deserialize)]
pub struct AmountRequest {
    amount: u32,
}

#[derive(Deserialize)]
pub struct OtpRequest {
    phone: String,
}

#[derive(Deserialize)]
pub struct OtpVerifyRequest {
    phone: String,
    code: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "success": false, "message": message })),
    )
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    failure(StatusCode::UNAUTHORIZED, "Phiên đăng nhập hết hạn")
}

fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    match bearer_token(headers) {
        Some(token) if token == state.options.valid_token => Ok(()),
        _ => Err(unauthorized()),
    }
}

/// Wrap a payload in `layers` nested `data` objects (clamped 1 to 3)
/// below the standard envelope.
fn wrap_cart(payload: Value, layers: usize) -> Json<Value> {
    let mut data = payload;
    for _ in 1..layers.clamp(1, 3) {
        data = json!({ "data": data });
    }
    Json(json!({ "success": true, "message": "OK", "data": data }))
}

async fn apply_delay(state: &AppState) {
    if let Some(delay) = state.options.response_delay {
        tokio::time::sleep(delay).await;
    }
}

async fn view_cart(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    require_auth(&state, &headers)?;
    state.hits.view.fetch_add(1, Ordering::SeqCst);
    let payload = state.cart_payload().await;
    Ok(wrap_cart(payload, state.options.cart_nesting))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AddItemRequest>,
) -> ApiResult {
    require_auth(&state, &headers)?;
    apply_delay(&state).await;
    state.hits.add.fetch_add(1, Ordering::SeqCst);

    let stock = {
        let catalog = state.catalog.read().await;
        match catalog.get(&req.product_id) {
            Some(product) => product.stock,
            None => return Err(failure(StatusCode::NOT_FOUND, "Sản phẩm không tồn tại")),
        }
    };

    {
        let mut cart = state.cart.write().await;
        let existing = cart
            .iter_mut()
            .find(|line| line.product_id == req.product_id);
        match existing {
            Some(line) => {
                if line.quantity + req.quantity > stock {
                    return Err(failure(
                        StatusCode::BAD_REQUEST,
                        &format!("Chỉ còn {} sản phẩm trong kho", stock),
                    ));
                }
                line.quantity += req.quantity;
            }
            None => {
                if req.quantity > stock {
                    return Err(failure(
                        StatusCode::BAD_REQUEST,
                        &format!("Chỉ còn {} sản phẩm trong kho", stock),
                    ));
                }
                cart.push(ServerLine {
                    product_id: req.product_id.clone(),
                    quantity: req.quantity,
                });
            }
        }
    }

    let payload = state.cart_payload().await;
    Ok(wrap_cart(payload, state.options.cart_nesting))
}

async fn increase_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(req): Json<AmountRequest>,
) -> ApiResult {
    require_auth(&state, &headers)?;
    apply_delay(&state).await;
    state.hits.increase.fetch_add(1, Ordering::SeqCst);

    let stock = {
        let catalog = state.catalog.read().await;
        catalog.get(&product_id).map(|p| p.stock)
    };
    let Some(stock) = stock else {
        return Err(failure(StatusCode::NOT_FOUND, "Sản phẩm không tồn tại"));
    };

    {
        let mut cart = state.cart.write().await;
        let Some(line) = cart.iter_mut().find(|line| line.product_id == product_id) else {
            return Err(failure(
                StatusCode::NOT_FOUND,
                "Sản phẩm không có trong giỏ hàng",
            ));
        };
        if line.quantity + req.amount > stock {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                &format!("Chỉ còn {} sản phẩm trong kho", stock),
            ));
        }
        line.quantity += req.amount;
    }

    let payload = state.cart_payload().await;
    Ok(wrap_cart(payload, state.options.cart_nesting))
}

async fn decrease_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
    Json(req): Json<AmountRequest>,
) -> ApiResult {
    require_auth(&state, &headers)?;
    apply_delay(&state).await;
    state.hits.decrease.fetch_add(1, Ordering::SeqCst);

    {
        let mut cart = state.cart.write().await;
        let Some(index) = cart.iter().position(|line| line.product_id == product_id) else {
            return Err(failure(
                StatusCode::NOT_FOUND,
                "Sản phẩm không có trong giỏ hàng",
            ));
        };
        if cart[index].quantity <= req.amount {
            cart.remove(index);
        } else {
            cart[index].quantity -= req.amount;
        }
    }

    let payload = state.cart_payload().await;
    Ok(wrap_cart(payload, state.options.cart_nesting))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> ApiResult {
    require_auth(&state, &headers)?;
    apply_delay(&state).await;
    state.hits.remove.fetch_add(1, Ordering::SeqCst);

    {
        let mut cart = state.cart.write().await;
        let Some(index) = cart.iter().position(|line| line.product_id == product_id) else {
            return Err(failure(
                StatusCode::NOT_FOUND,
                "Sản phẩm không có trong giỏ hàng",
            ));
        };
        cart.remove(index);
    }

    let payload = state.cart_payload().await;
    Ok(wrap_cart(payload, state.options.cart_nesting))
}

async fn clear_cart(State(state): State<Arc<AppState>>, headers: HeaderMap) -> ApiResult {
    require_auth(&state, &headers)?;
    state.hits.clear.fetch_add(1, Ordering::SeqCst);
    state.cart.write().await.clear();
    Ok(Json(json!({ "success": true, "message": "Đã xóa giỏ hàng" })))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult {
    state.hits.orders.fetch_add(1, Ordering::SeqCst);

    // Authenticated orders need a valid token; guest orders go through
    // without one but must carry their own lines.
    let total = if req.is_guest {
        let Some(lines) = req.guest_cart_items.as_ref().filter(|l| !l.is_empty()) else {
            return Err(failure(StatusCode::BAD_REQUEST, "Giỏ hàng trống"));
        };
        let phone = req
            .guest_info
            .as_ref()
            .map(|info| info.phone.clone())
            .unwrap_or_default();
        if !state.verified_phones.read().await.contains(&phone) {
            return Err(failure(
                StatusCode::BAD_REQUEST,
                "Số điện thoại chưa được xác minh",
            ));
        }
        money::cart_total(
            lines
                .iter()
                .map(|line| (line.product_id.as_str(), line.price, line.quantity)),
        )
    } else {
        require_auth(&state, &headers)?;
        if state.cart.read().await.is_empty() {
            return Err(failure(StatusCode::BAD_REQUEST, "Giỏ hàng trống"));
        }
        let payload = state.cart_payload().await;
        let total = payload
            .get("totalAmount")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        // The server empties the authenticated cart once the order is
        // placed; the client refreshes to observe it.
        state.cart.write().await.clear();
        total
    };

    let order_id = state.next_order_id();
    tracing::info!(order_id = %order_id, total, is_guest = req.is_guest, "mock order created");

    let order = json!({ "id": order_id, "totalAmount": total, "status": "PENDING" });
    let data = if state.options.deep_order_id {
        json!({ "data": order })
    } else {
        order
    };
    Ok(Json(json!({ "success": true, "message": "OK", "data": data })))
}

async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> ApiResult {
    tracing::info!(phone = %req.phone, code = %state.options.otp_code, "mock OTP issued");
    Ok(Json(json!({ "success": true, "message": "Đã gửi mã OTP" })))
}

async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpVerifyRequest>,
) -> ApiResult {
    if req.code != state.options.otp_code {
        return Err(failure(StatusCode::BAD_REQUEST, "Mã OTP không đúng"));
    }
    state.verified_phones.write().await.insert(req.phone);
    Ok(Json(json!({ "success": true, "message": "Xác minh thành công" })))
}

/// All routes of the mock backend.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/cart", get(view_cart).delete(clear_cart))
        .route("/api/cart/items", post(add_item))
        .route("/api/cart/items/{product_id}/increase", put(increase_item))
        .route("/api/cart/items/{product_id}/decrease", put(decrease_item))
        .route("/api/cart/items/{product_id}", delete(remove_item))
        .route("/api/orders", post(create_order))
        .route("/api/otp/request", post(request_otp))
        .route("/api/otp/verify", post(verify_otp))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
