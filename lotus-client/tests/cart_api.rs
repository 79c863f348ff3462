// lotus-client/tests/cart_api.rs
// CartApi and OrderApi against the mock backend over the in-process transport.

use std::sync::Arc;

use lotus_api_mock::{AppState, MockOptions, build_router};
use lotus_client::{CartApi, ClientError, HttpTransport, OneshotTransport, OrderApi};
use shared::models::{
    CreateOrderRequest, GuestInfo, GuestOrderLine, PaymentMethod, ProductSnapshot, ShippingAddress,
};

fn setup(options: MockOptions) -> (Arc<AppState>, Arc<OneshotTransport>) {
    let state = Arc::new(AppState::new(options));
    let transport = Arc::new(OneshotTransport::new(build_router(Arc::clone(&state))));
    (state, transport)
}

async fn seed_catalog(state: &AppState) {
    state
        .seed_product(ProductSnapshot::new("p1", "Ryzen 7 7800X3D", 9_490_000.0, 5))
        .await;
    state
        .seed_product(ProductSnapshot::new("p2", "RTX 4070 SUPER", 15_990_000.0, 3))
        .await;
}

fn shipping() -> ShippingAddress {
    ShippingAddress {
        full_name: "Nguyễn Văn An".to_string(),
        phone: "0912345678".to_string(),
        email: "an@example.com".to_string(),
        street: "12 Nguyễn Trãi, toà nhà B".to_string(),
        province: "Hà Nội".to_string(),
        district: "Thanh Xuân".to_string(),
        ward: "Khương Trung".to_string(),
    }
}

#[tokio::test]
async fn test_cart_mutations_round_trip() {
    let (state, transport) = setup(MockOptions::default());
    seed_catalog(&state).await;
    transport.set_token(Some("customer-token".to_string())).await;
    let cart = CartApi::new(transport);

    let payload = cart.add_item("p1", 2).await.unwrap();
    assert_eq!(payload.cart_items.len(), 1);
    assert_eq!(payload.cart_items[0].quantity, 2);
    assert_eq!(payload.total_amount, 18_980_000.0);

    let payload = cart.increase_item("p1", 1).await.unwrap();
    assert_eq!(payload.cart_items[0].quantity, 3);

    let payload = cart.decrease_item("p1", 2).await.unwrap();
    assert_eq!(payload.cart_items[0].quantity, 1);

    let payload = cart.add_item("p2", 1).await.unwrap();
    assert_eq!(payload.cart_items.len(), 2);

    let payload = cart.remove_item("p1").await.unwrap();
    assert_eq!(payload.cart_items.len(), 1);
    assert_eq!(payload.cart_items[0].product_id, "p2");

    let payload = cart.clear().await.unwrap();
    assert!(payload.cart_items.is_empty());
    assert_eq!(payload.total_amount, 0.0);
    assert!(state.cart_lines().await.is_empty());
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let (state, transport) = setup(MockOptions::default());
    seed_catalog(&state).await;
    transport.set_token(Some("customer-token".to_string())).await;
    let cart = CartApi::new(transport);

    let err = cart.add_item("ghost", 1).await.unwrap_err();
    match err {
        ClientError::NotFound(message) => assert_eq!(message, "Sản phẩm không tồn tại"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_stock_ceiling_carries_backend_message() {
    let (state, transport) = setup(MockOptions::default());
    seed_catalog(&state).await;
    transport.set_token(Some("customer-token".to_string())).await;
    let cart = CartApi::new(transport);

    let err = cart.add_item("p2", 4).await.unwrap_err();
    match err {
        ClientError::Api { message } => {
            assert!(message.contains("Chỉ còn 3"), "got: {message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_token_gates_every_cart_call() {
    let (state, transport) = setup(MockOptions::default());
    seed_catalog(&state).await;
    let cart = CartApi::new(transport.clone());

    // no token at all
    let err = cart.view().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    // a token the backend no longer accepts
    transport.set_token(Some("stale-token".to_string())).await;
    let err = cart.view().await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized));

    // runtime swap to the good one on the same transport
    transport.set_token(Some("customer-token".to_string())).await;
    assert!(cart.view().await.is_ok());
}

#[tokio::test]
async fn test_deeply_nested_payload_is_normalized() {
    let options = MockOptions {
        cart_nesting: 3,
        ..MockOptions::default()
    };
    let (state, transport) = setup(options);
    seed_catalog(&state).await;
    transport.set_token(Some("customer-token".to_string())).await;
    let cart = CartApi::new(transport);

    let payload = cart.add_item("p1", 1).await.unwrap();
    assert_eq!(payload.cart_items.len(), 1);
    assert_eq!(payload.total_amount, 9_490_000.0);
}

#[tokio::test]
async fn test_guest_order_requires_otp_verification() {
    let (state, transport) = setup(MockOptions::default());
    seed_catalog(&state).await;
    let orders = OrderApi::new(transport);

    let request = CreateOrderRequest {
        shipping_address: shipping(),
        note: None,
        payment_method: PaymentMethod::Cod,
        require_invoice: false,
        is_guest: true,
        guest_info: Some(GuestInfo {
            full_name: "Nguyễn Văn An".to_string(),
            phone: "0912345678".to_string(),
            email: "an@example.com".to_string(),
        }),
        guest_cart_items: Some(vec![GuestOrderLine {
            product_id: "p1".to_string(),
            quantity: 2,
            price: 9_490_000.0,
            name: "Ryzen 7 7800X3D".to_string(),
        }]),
    };

    // unverified phone is refused
    let err = orders.create_order(&request).await.unwrap_err();
    match err {
        ClientError::Api { message } => {
            assert_eq!(message, "Số điện thoại chưa được xác minh");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    orders.request_otp("0912345678").await.unwrap();

    let err = orders.verify_otp("0912345678", "000000").await.unwrap_err();
    match err {
        ClientError::Api { message } => assert_eq!(message, "Mã OTP không đúng"),
        other => panic!("unexpected error: {other:?}"),
    }

    orders.verify_otp("0912345678", "246810").await.unwrap();

    let order = orders.create_order(&request).await.unwrap();
    assert_eq!(order.id, "ord-1");
    assert_eq!(order.total_amount, Some(18_980_000.0));
}

#[tokio::test]
async fn test_authenticated_order_empties_server_cart() {
    let (state, transport) = setup(MockOptions::default());
    seed_catalog(&state).await;
    transport.set_token(Some("customer-token".to_string())).await;
    let cart = CartApi::new(transport.clone());
    let orders = OrderApi::new(transport);

    cart.add_item("p1", 1).await.unwrap();
    cart.add_item("p2", 1).await.unwrap();

    let request = CreateOrderRequest {
        shipping_address: shipping(),
        note: Some("Giao giờ hành chính".to_string()),
        payment_method: PaymentMethod::Online,
        require_invoice: true,
        is_guest: false,
        guest_info: None,
        guest_cart_items: None,
    };
    let order = orders.create_order(&request).await.unwrap();
    assert_eq!(order.id, "ord-1");
    assert_eq!(order.total_amount, Some(25_480_000.0));

    // the server cleared its cart as part of order creation
    assert!(state.cart_lines().await.is_empty());
    let payload = cart.view().await.unwrap();
    assert!(payload.cart_items.is_empty());
}

#[tokio::test]
async fn test_deep_order_id_is_found() {
    let options = MockOptions {
        deep_order_id: true,
        ..MockOptions::default()
    };
    let (state, transport) = setup(options);
    seed_catalog(&state).await;
    transport.set_token(Some("customer-token".to_string())).await;
    let cart = CartApi::new(transport.clone());
    let orders = OrderApi::new(transport);

    cart.add_item("p1", 1).await.unwrap();
    let order = orders
        .create_order(&CreateOrderRequest {
            shipping_address: shipping(),
            note: None,
            payment_method: PaymentMethod::Cod,
            require_invoice: false,
            is_guest: false,
            guest_info: None,
            guest_cart_items: None,
        })
        .await
        .unwrap();
    assert_eq!(order.id, "ord-1");
}
