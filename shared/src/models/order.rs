//! Order creation payloads

use serde::{Deserialize, Serialize};

/// Payment options offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash on delivery; the order completes in place.
    #[serde(rename = "COD")]
    Cod,
    /// Redirect-based online payment; the order is created first, then
    /// the shopper is sent to the payment page with id and amount.
    #[serde(rename = "ONLINE")]
    Online,
}

/// Shipping destination assembled from the validated checkout form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub street: String,
    pub province: String,
    pub district: String,
    pub ward: String,
}

/// Contact details submitted with a guest order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

/// Cart line submitted with a guest order; the server has no cart to
/// resolve, so price and name travel from the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderLine {
    pub product_id: String,
    pub quantity: u32,
    pub price: f64,
    pub name: String,
}

/// Body of `POST /api/orders`.
///
/// Authenticated orders omit the guest fields; the server resolves the
/// lines from the persisted cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub require_invoice: bool,
    pub is_guest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_info: Option<GuestInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_cart_items: Option<Vec<GuestOrderLine>>,
}

/// Created order as the checkout flow needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
}

/// Parameters handed to the external payment page.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRedirect {
    pub order_id: String,
    pub amount: f64,
}
