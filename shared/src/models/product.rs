//! Product snapshot

use serde::{Deserialize, Serialize};

/// Denormalized product data carried on every cart line.
///
/// The authenticated backend refreshes this on each cart view; the
/// guest store captures it once at add time and never updates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    /// Unit price in VND, non-negative.
    pub price: f64,
    /// Units available for sale at snapshot time.
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProductSnapshot {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        price: f64,
        stock: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
            stock,
            images: Vec::new(),
            category: None,
        }
    }

    /// First image reference, used as the row thumbnail.
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}
