//! Scripted cart walkthrough
//!
//! Drives the whole subsystem against the in-process mock backend:
//! 1. Guest adds components, hits a stock ceiling, picks a selection
//! 2. Guest checkout behind the OTP gate
//! 3. Login migrates the remaining guest cart into the server cart
//! 4. Authenticated checkout with an online-payment redirect
//!
//! Run: cargo run --example checkout_demo

use std::sync::Arc;

use anyhow::Result;

use lotus_api_mock::{AppState, MockOptions, build_router};
use lotus_cart::cart::CartEngine;
use lotus_cart::checkout::{CheckoutFlow, CheckoutForm, CheckoutOutcome};
use lotus_cart::session::AuthSession;
use lotus_cart::signals::SignalHub;
use lotus_client::{CartApi, OneshotTransport, OrderApi};
use shared::models::{
    CustomerProfile, District, PaymentMethod, ProductSnapshot, Province, Ward,
};
use shared::money::format_vnd;

fn catalog() -> Vec<ProductSnapshot> {
    vec![
        ProductSnapshot::new("cpu-7800x3d", "AMD Ryzen 7 7800X3D", 9_490_000.0, 3),
        ProductSnapshot::new("vga-4070s", "GeForce RTX 4070 SUPER 12GB", 15_990_000.0, 5),
        ProductSnapshot::new("ssd-990pro", "Samsung 990 PRO 1TB", 2_590_000.0, 10),
    ]
}

fn shipping_form() -> CheckoutForm {
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
        note: Some("Giao giờ hành chính".to_string()),
        require_invoice: false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    println!("\n🛒 Lotus cart walkthrough");
    println!("=========================\n");

    // In-process backend; no socket involved.
    let backend = Arc::new(AppState::new(MockOptions::default()));
    for product in catalog() {
        backend.seed_product(product).await;
    }

    let transport = Arc::new(OneshotTransport::new(build_router(Arc::clone(&backend))));
    let store_root = tempfile::tempdir()?;
    let engine = Arc::new(CartEngine::new(
        store_root.path(),
        CartApi::new(transport.clone()),
        SignalHub::new(),
    ));
    engine.bootstrap().await?;
    let checkout = CheckoutFlow::new(Arc::clone(&engine), OrderApi::new(transport));

    // ============ 1. Guest cart ============
    println!("=== Guest shopping ===");
    let [cpu, gpu, ssd] = catalog().try_into().expect("three products");

    engine.add_to_cart(&cpu, 1).await?;
    engine.add_to_cart(&gpu, 1).await?;
    let state = engine.snapshot().await;
    println!(
        "cart: {} lines, total {}",
        state.items.len(),
        format_vnd(state.total_amount)
    );

    // pushing past stock is refused with the available count
    engine.increase_quantity("cpu-7800x3d", 10).await?;
    if let Some(error) = engine.snapshot().await.error {
        println!("increase refused: {error}");
    }

    engine.toggle_item_selection("vga-4070s").await;
    println!(
        "selected subtotal (GPU deselected): {}",
        format_vnd(engine.selected_subtotal().await)
    );

    // ============ 2. Guest checkout with OTP ============
    println!("\n=== Guest checkout ===");
    match checkout.submit(&shipping_form(), PaymentMethod::Cod).await? {
        CheckoutOutcome::AwaitingOtp { phone } => {
            println!("OTP sent to {phone}, verifying…");
        }
        other => println!("unexpected outcome: {other:?}"),
    }
    match checkout.verify_otp("246810").await? {
        CheckoutOutcome::Completed(order) => {
            let amount = order.total_amount.unwrap_or_default();
            println!("order {} placed, {}", order.id, format_vnd(amount));
        }
        other => println!("unexpected outcome: {other:?}"),
    }

    // ============ 3. Login and migration ============
    println!("\n=== Login ===");
    // cart contents from a previous session on another device
    backend.seed_cart_line("cpu-7800x3d", 1).await;

    engine.add_to_cart(&ssd, 2).await?;
    engine.add_to_cart(&cpu, 1).await?;

    let session = AuthSession::new(
        "customer-token".to_string(),
        CustomerProfile {
            id: "cus-1".to_string(),
            full_name: "Nguyễn Văn An".to_string(),
            email: Some("an.nguyen@example.com".to_string()),
            phone: Some("0912345678".to_string()),
        },
    );
    engine.session().save(&session)?;
    let report = engine.handle_login().await?;
    println!(
        "migration: {} migrated, {} skipped, {} failed",
        report.migrated, report.skipped, report.failed
    );
    let state = engine.snapshot().await;
    println!(
        "server cart: {} lines, total {}",
        state.items.len(),
        format_vnd(state.total_amount)
    );

    // ============ 4. Authenticated checkout, online payment ============
    println!("\n=== Online payment checkout ===");
    engine.select_all_items(true).await;
    match checkout
        .submit(&shipping_form(), PaymentMethod::Online)
        .await?
    {
        CheckoutOutcome::RedirectToPayment(redirect) => {
            println!(
                "order {} created, redirecting to pay {}",
                redirect.order_id,
                format_vnd(redirect.amount)
            );
        }
        other => println!("unexpected outcome: {other:?}"),
    }

    let state = engine.snapshot().await;
    println!("cart after checkout: {} lines", state.items.len());
    println!("\ndone ✅");
    Ok(())
}
