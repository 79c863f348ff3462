use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use lotus_api_mock::{AppState, MockOptions, build_router};
use shared::models::ProductSnapshot;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let state = Arc::new(AppState::new(MockOptions::default()));

    // A few PC parts so manual poking has something to add.
    state
        .seed_product(ProductSnapshot::new("cpu-7800x3d", "Ryzen 7 7800X3D", 9_490_000.0, 12))
        .await;
    state
        .seed_product(ProductSnapshot::new("vga-4070s", "RTX 4070 Super", 16_490_000.0, 5))
        .await;
    state
        .seed_product(ProductSnapshot::new("ssd-990pro", "Samsung 990 Pro 2TB", 4_590_000.0, 30))
        .await;

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:8090").await?;
    tracing::info!("mock Order/Cart API listening on http://127.0.0.1:8090");
    axum::serve(listener, router).await?;
    Ok(())
}
