//! Mock backend state

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::RwLock;

use shared::models::ProductSnapshot;
use shared::money;

/// Knobs for the backend behaviors the real API exhibits.
#[derive(Debug, Clone)]
pub struct MockOptions {
    /// The one bearer token the mock accepts.
    pub valid_token: String,
    /// How many `data` layers wrap a cart payload (1 to 3).
    pub cart_nesting: usize,
    /// Put the created order id at `data.data.id` instead of `data.id`.
    pub deep_order_id: bool,
    /// Artificial latency before cart mutations respond.
    pub response_delay: Option<Duration>,
    /// The OTP code `POST /api/otp/verify` accepts.
    pub otp_code: String,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            valid_token: "customer-token".to_string(),
            cart_nesting: 1,
            deep_order_id: false,
            response_delay: None,
            otp_code: "246810".to_string(),
        }
    }
}

/// One server-side cart line; snapshots are joined in from the catalog
/// when the payload is built.
#[derive(Debug, Clone)]
pub struct ServerLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Per-endpoint hit counters for request-dedup assertions.
#[derive(Debug, Default)]
pub struct EndpointHits {
    pub view: AtomicUsize,
    pub add: AtomicUsize,
    pub increase: AtomicUsize,
    pub decrease: AtomicUsize,
    pub remove: AtomicUsize,
    pub clear: AtomicUsize,
    pub orders: AtomicUsize,
}

/// Shared state behind the mock router.
pub struct AppState {
    pub options: MockOptions,
    pub catalog: RwLock<HashMap<String, ProductSnapshot>>,
    pub cart: RwLock<Vec<ServerLine>>,
    pub verified_phones: RwLock<HashSet<String>>,
    pub hits: EndpointHits,
    next_order: AtomicUsize,
}

impl AppState {
    pub fn new(options: MockOptions) -> Self {
        Self {
            options,
            catalog: RwLock::new(HashMap::new()),
            cart: RwLock::new(Vec::new()),
            verified_phones: RwLock::new(HashSet::new()),
            hits: EndpointHits::default(),
            next_order: AtomicUsize::new(1),
        }
    }

    /// Register a product so cart and order endpoints know its price
    /// and stock.
    pub async fn seed_product(&self, product: ProductSnapshot) {
        self.catalog.write().await.insert(product.id.clone(), product);
    }

    /// Pre-populate a server cart line, as left over from an earlier
    /// session on another device.
    pub async fn seed_cart_line(&self, product_id: &str, quantity: u32) {
        self.cart.write().await.push(ServerLine {
            product_id: product_id.to_string(),
            quantity,
        });
    }

    /// Current `(productId, quantity)` pairs, for test assertions.
    pub async fn cart_lines(&self) -> Vec<(String, u32)> {
        self.cart
            .read()
            .await
            .iter()
            .map(|line| (line.product_id.clone(), line.quantity))
            .collect()
    }

    pub fn next_order_id(&self) -> String {
        format!("ord-{}", self.next_order.fetch_add(1, Ordering::SeqCst))
    }

    /// Build the `{ cartItems, totalAmount }` payload from the current
    /// lines joined with catalog snapshots.
    pub async fn cart_payload(&self) -> Value {
        let catalog = self.catalog.read().await;
        let cart = self.cart.read().await;
        let mut items = Vec::with_capacity(cart.len());
        let mut lines = Vec::with_capacity(cart.len());
        for line in cart.iter() {
            let Some(product) = catalog.get(&line.product_id) else {
                continue;
            };
            lines.push((line.product_id.clone(), product.price, line.quantity));
            items.push(json!({
                "id": format!("line-{}", line.product_id),
                "productId": line.product_id,
                "quantity": line.quantity,
                "product": product,
            }));
        }
        let total = money::cart_total(
            lines.iter().map(|(id, price, qty)| (id.as_str(), *price, *qty)),
        );
        json!({ "cartItems": items, "totalAmount": total })
    }
}

impl EndpointHits {
    pub fn view_count(&self) -> usize {
        self.view.load(Ordering::SeqCst)
    }

    pub fn increase_count(&self) -> usize {
        self.increase.load(Ordering::SeqCst)
    }

    pub fn add_count(&self) -> usize {
        self.add.load(Ordering::SeqCst)
    }

    pub fn order_count(&self) -> usize {
        self.orders.load(Ordering::SeqCst)
    }
}
