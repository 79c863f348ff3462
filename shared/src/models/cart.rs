//! Cart payloads
//!
//! Two shapes exist for the same logical cart: the server's
//! `{ cartItems, totalAmount }` payload with full product snapshots,
//! and the flat guest blob persisted client-side.

use serde::{Deserialize, Serialize};

use crate::models::product::ProductSnapshot;
use crate::money;

/// One line of the authenticated cart as the server returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Server-assigned line id; `guest-<productId>` for guest lines.
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
    pub product: ProductSnapshot,
}

impl CartItem {
    /// Price × quantity for this line, rounded to two decimals.
    pub fn line_total(&self) -> f64 {
        money::round_money(self.product.price * self.quantity as f64)
    }
}

/// The `{ cartItems, totalAmount }` object the backend nests inside
/// its response envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartPayload {
    #[serde(default)]
    pub cart_items: Vec<CartItem>,
    #[serde(default)]
    pub total_amount: f64,
}

impl CartPayload {
    /// Total recomputed from the lines, ignoring the wire `totalAmount`.
    pub fn computed_total(&self) -> f64 {
        money::cart_total(
            self.cart_items
                .iter()
                .map(|item| (item.product_id.as_str(), item.product.price, item.quantity)),
        )
    }
}

/// One line of the guest cart, flattened to the add-time snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCartItem {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub stock: u32,
}

impl GuestCartItem {
    pub fn from_snapshot(product: &ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity,
            price: product.price,
            name: product.name.clone(),
            image: product.primary_image().map(str::to_string),
            category: product.category.clone(),
            stock: product.stock,
        }
    }

    /// Rebuild the server-shaped line so both backends feed the same
    /// state type.
    pub fn to_cart_item(&self) -> CartItem {
        CartItem {
            id: format!("guest-{}", self.product_id),
            product_id: self.product_id.clone(),
            quantity: self.quantity,
            product: ProductSnapshot {
                id: self.product_id.clone(),
                name: self.name.clone(),
                price: self.price,
                stock: self.stock,
                images: self.image.iter().cloned().collect(),
                category: self.category.clone(),
            },
        }
    }
}

/// Guest cart blob persisted under the session key, shape
/// `{ items, totalAmount }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestCart {
    #[serde(default)]
    pub items: Vec<GuestCartItem>,
    #[serde(default)]
    pub total_amount: f64,
}

impl GuestCart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Recompute `totalAmount` from the lines.
    pub fn recompute_total(&mut self) {
        self.total_amount = money::cart_total(
            self.items
                .iter()
                .map(|item| (item.product_id.as_str(), item.price, item.quantity)),
        );
    }

    /// Server-shaped view of the guest lines.
    pub fn to_payload(&self) -> CartPayload {
        let cart_items: Vec<CartItem> = self.items.iter().map(GuestCartItem::to_cart_item).collect();
        let mut payload = CartPayload {
            cart_items,
            total_amount: 0.0,
        };
        payload.total_amount = payload.computed_total();
        payload
    }
}
