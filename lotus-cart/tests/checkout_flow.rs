// lotus-cart/tests/checkout_flow.rs
// Order submission flows: OTP gate, payload shaping, failure handling.

use std::sync::Arc;

use axum::{Json, Router, routing::post};
use serde_json::json;
use tempfile::TempDir;

use lotus_api_mock::{AppState, MockOptions, build_router};
use lotus_cart::cart::CartEngine;
use lotus_cart::checkout::{CheckoutFlow, CheckoutForm, CheckoutOutcome};
use lotus_cart::session::AuthSession;
use lotus_cart::signals::{SessionSignal, SignalHub};
use lotus_cart::{CartError, GuestCartStore};
use lotus_client::{CartApi, HttpTransport, OneshotTransport, OrderApi};
use shared::models::{
    CustomerProfile, District, PaymentMethod, ProductSnapshot, Province, Ward,
};

struct Harness {
    backend: Arc<AppState>,
    engine: Arc<CartEngine>,
    flow: CheckoutFlow,
    dir: TempDir,
}

async fn start(options: MockOptions) -> Harness {
    let backend = Arc::new(AppState::new(options));
    let transport = Arc::new(OneshotTransport::new(build_router(Arc::clone(&backend))));
    let dir = TempDir::new().unwrap();
    let engine = Arc::new(CartEngine::new(
        dir.path(),
        CartApi::new(transport.clone()),
        SignalHub::new(),
    ));
    engine.bootstrap().await.unwrap();
    let flow = CheckoutFlow::new(Arc::clone(&engine), OrderApi::new(transport));
    Harness {
        backend,
        engine,
        flow,
        dir,
    }
}

fn profile() -> CustomerProfile {
    CustomerProfile {
        id: "cus-1".to_string(),
        full_name: "Trần Thị Mai".to_string(),
        email: Some("mai@example.com".to_string()),
        phone: Some("0912345678".to_string()),
    }
}

fn p1() -> ProductSnapshot {
    ProductSnapshot::new("p1", "SSD NVMe 1TB", 100_000.0, 5)
}

fn p2() -> ProductSnapshot {
    ProductSnapshot::new("p2", "RAM DDR5 16GB", 50_000.0, 10)
}

fn filled_form() -> CheckoutForm {
    CheckoutForm {
        full_name: "Nguyễn Văn An".to_string(),
        phone: "0912345678".to_string(),
        email: "an.nguyen@example.com".to_string(),
        street: "12 Nguyễn Trãi, toà nhà B, tầng 3".to_string(),
        province: Some(Province {
            code: "01".to_string(),
            name: "Hà Nội".to_string(),
        }),
        district: Some(District {
            code: "005".to_string(),
            name: "Thanh Xuân".to_string(),
            province_code: "01".to_string(),
        }),
        ward: Some(Ward {
            code: "00155".to_string(),
            name: "Khương Trung".to_string(),
            district_code: "005".to_string(),
        }),
        note: None,
        require_invoice: false,
    }
}

impl Harness {
    async fn login(&self) {
        let session = AuthSession::new("customer-token".to_string(), profile());
        self.engine.session().save(&session).unwrap();
        self.engine.handle_login().await.unwrap();
    }
}

#[tokio::test]
async fn test_guest_checkout_is_gated_behind_otp() {
    let h = start(MockOptions::default()).await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();

    let outcome = h.flow.submit(&filled_form(), PaymentMethod::Cod).await.unwrap();
    assert_eq!(
        outcome,
        CheckoutOutcome::AwaitingOtp {
            phone: "0912345678".to_string()
        }
    );
    // nothing was submitted yet
    assert_eq!(h.backend.hits.order_count(), 0);
    assert!(h.flow.has_pending_order().await);

    // a wrong code re-prompts without losing the parked order
    for _ in 0..2 {
        let err = h.flow.verify_otp("000000").await.unwrap_err();
        match &err {
            CartError::Validation(message) => assert_eq!(message, "Mã OTP không đúng"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(h.flow.has_pending_order().await);
    }

    let outcome = h.flow.verify_otp("246810").await.unwrap();
    let CheckoutOutcome::Completed(order) = outcome else {
        panic!("expected a completed order");
    };
    assert_eq!(order.id, "ord-1");
    assert_eq!(order.total_amount, Some(200_000.0));
    assert_eq!(h.backend.hits.order_count(), 1);
    assert!(!h.flow.has_pending_order().await);

    // guest cart is cleared client-side after submission
    assert!(GuestCartStore::open(h.dir.path()).is_empty());
    assert!(h.engine.snapshot().await.items.is_empty());
}

#[tokio::test]
async fn test_guest_payload_carries_only_selected_lines() {
    let h = start(MockOptions::default()).await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();
    h.engine.add_to_cart(&p2(), 3).await.unwrap();
    h.engine.toggle_item_selection("p2").await;

    h.flow.submit(&filled_form(), PaymentMethod::Cod).await.unwrap();
    let outcome = h.flow.verify_otp("246810").await.unwrap();

    let CheckoutOutcome::Completed(order) = outcome else {
        panic!("expected a completed order");
    };
    // the mock totals the submitted guest lines, so p2 never traveled
    assert_eq!(order.total_amount, Some(200_000.0));

    // the whole guest cart is cleared regardless of selection
    assert!(GuestCartStore::open(h.dir.path()).is_empty());
}

#[tokio::test]
async fn test_authenticated_cod_checkout_completes_and_refreshes() {
    let h = start(MockOptions::default()).await;
    h.backend.seed_product(p1()).await;
    h.login().await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();

    let outcome = h.flow.submit(&filled_form(), PaymentMethod::Cod).await.unwrap();

    let CheckoutOutcome::Completed(order) = outcome else {
        panic!("expected a completed order");
    };
    assert_eq!(order.id, "ord-1");
    // no OTP gate for authenticated shoppers
    assert_eq!(h.backend.hits.order_count(), 1);
    // the server emptied the cart; the refresh observed it
    assert!(h.backend.cart_lines().await.is_empty());
    assert!(h.engine.snapshot().await.items.is_empty());
}

#[tokio::test]
async fn test_online_payment_returns_redirect_parameters() {
    let h = start(MockOptions::default()).await;
    h.backend.seed_product(p1()).await;
    h.login().await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();

    let outcome = h
        .flow
        .submit(&filled_form(), PaymentMethod::Online)
        .await
        .unwrap();

    let CheckoutOutcome::RedirectToPayment(redirect) = outcome else {
        panic!("expected a payment redirect");
    };
    assert_eq!(redirect.order_id, "ord-1");
    assert_eq!(redirect.amount, 200_000.0);
}

#[tokio::test]
async fn test_order_id_found_under_deep_envelope() {
    let mut options = MockOptions::default();
    options.deep_order_id = true;
    let h = start(options).await;
    h.backend.seed_product(p1()).await;
    h.login().await;
    h.engine.add_to_cart(&p1(), 1).await.unwrap();

    let outcome = h.flow.submit(&filled_form(), PaymentMethod::Cod).await.unwrap();

    let CheckoutOutcome::Completed(order) = outcome else {
        panic!("expected a completed order");
    };
    assert_eq!(order.id, "ord-1");
}

#[tokio::test]
async fn test_order_response_without_id_is_hard_failure() {
    let h = start(MockOptions::default()).await;
    h.backend.seed_product(p1()).await;
    h.login().await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();

    // a backend that answers success but forgets the order id
    let orderless = Router::new().route(
        "/api/orders",
        post(|| async { Json(json!({ "success": true, "data": { "status": "PENDING" } })) }),
    );
    let flow = CheckoutFlow::new(
        Arc::clone(&h.engine),
        OrderApi::new(Arc::new(OneshotTransport::new(orderless))),
    );

    let err = flow.submit(&filled_form(), PaymentMethod::Cod).await.unwrap_err();
    match err {
        CartError::OrderSubmission(message) => assert!(message.contains("no id")),
        other => panic!("unexpected error: {other:?}"),
    }
    // the cart was not cleared on a failed submission
    assert_eq!(h.engine.item_quantity("p1").await, 2);
    assert_eq!(h.backend.cart_lines().await, vec![("p1".to_string(), 2)]);
}

#[tokio::test]
async fn test_redirect_amount_falls_back_to_selected_subtotal() {
    let h = start(MockOptions::default()).await;
    h.backend.seed_product(p1()).await;
    h.login().await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();

    // order created, id present, amount missing
    let amountless = Router::new().route(
        "/api/orders",
        post(|| async { Json(json!({ "success": true, "data": { "id": "ord-77" } })) }),
    );
    let flow = CheckoutFlow::new(
        Arc::clone(&h.engine),
        OrderApi::new(Arc::new(OneshotTransport::new(amountless))),
    );

    let outcome = flow
        .submit(&filled_form(), PaymentMethod::Online)
        .await
        .unwrap();

    let CheckoutOutcome::RedirectToPayment(redirect) = outcome else {
        panic!("expected a payment redirect");
    };
    assert_eq!(redirect.order_id, "ord-77");
    assert_eq!(redirect.amount, 200_000.0);
}

#[tokio::test]
async fn test_expired_session_at_submission_surfaces_and_signals() {
    let h = start(MockOptions::default()).await;
    h.backend.seed_product(p1()).await;
    h.login().await;
    h.engine.add_to_cart(&p1(), 2).await.unwrap();

    // the order call carries a token the backend no longer accepts
    let stale = Arc::new(OneshotTransport::new(build_router(Arc::clone(&h.backend))));
    stale.set_token(Some("stale-token".to_string())).await;
    let flow = CheckoutFlow::new(Arc::clone(&h.engine), OrderApi::new(stale));

    let mut rx = h.engine.signals().subscribe();
    let err = flow.submit(&filled_form(), PaymentMethod::Cod).await.unwrap_err();

    assert!(matches!(err, CartError::AuthExpired));
    assert_eq!(rx.try_recv().unwrap(), SessionSignal::Unauthorized);
    assert!(h.engine.snapshot().await.items.is_empty());
}
