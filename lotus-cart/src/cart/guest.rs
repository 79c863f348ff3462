//! Guest cart persistence
//!
//! Before login the cart lives entirely on this device as a JSON
//! file. Lines carry a product snapshot (price, name, stock) taken at
//! the moment they were added, so the cart renders without a backend
//! round trip.

use std::fs;
use std::path::{Path, PathBuf};

use shared::models::{GuestCart, GuestCartItem, ProductSnapshot};

use crate::error::{CartError, CartResult};

const GUEST_CART_FILE: &str = "guest_cart.json";

/// Distinct-product ceiling for the device-local cart.
pub const MAX_GUEST_LINES: usize = 50;

/// File-backed guest cart.
#[derive(Debug)]
pub struct GuestCartStore {
    file_path: PathBuf,
    cart: GuestCart,
}

impl GuestCartStore {
    /// `root` is the app's data directory; the cart lives at
    /// `root/session/guest_cart.json`. A missing or unreadable file
    /// starts an empty cart.
    pub fn open(root: impl AsRef<Path>) -> Self {
        let file_path = root.as_ref().join("session").join(GUEST_CART_FILE);
        let cart = Self::hydrate(&file_path);
        Self { file_path, cart }
    }

    fn hydrate(file_path: &Path) -> GuestCart {
        if !file_path.exists() {
            return GuestCart::default();
        }

        let content = match fs::read_to_string(file_path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("failed to read guest cart file: {}", err);
                return GuestCart::default();
            }
        };

        match serde_json::from_str::<GuestCart>(&content) {
            Ok(mut cart) => {
                cart.recompute_total();
                cart
            }
            Err(err) => {
                tracing::warn!("guest cart file is corrupt, starting empty: {}", err);
                GuestCart::default()
            }
        }
    }

    /// Re-read the cart from disk, dropping any unsaved in-memory
    /// state. Used when switching back to guest mode.
    pub fn reload(&mut self) {
        self.cart = Self::hydrate(&self.file_path);
    }

    fn commit(&mut self) -> CartResult<GuestCart> {
        self.cart.recompute_total();
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.cart)?;
        fs::write(&self.file_path, content)?;
        Ok(self.cart.clone())
    }

    pub fn cart(&self) -> &GuestCart {
        &self.cart
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn quantity_of(&self, product_id: &str) -> u32 {
        self.cart
            .items
            .iter()
            .find(|item| item.product_id == product_id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    /// Add `quantity` of a product, merging into an existing line.
    /// The incoming snapshot refreshes the stored price and stock.
    pub fn add_item(
        &mut self,
        product: &ProductSnapshot,
        quantity: u32,
    ) -> CartResult<GuestCart> {
        if quantity == 0 {
            return Err(CartError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        if product.price < 0.0 {
            return Err(CartError::Validation(format!(
                "product {} has a negative price",
                product.id
            )));
        }

        match self
            .cart
            .items
            .iter_mut()
            .find(|item| item.product_id == product.id)
        {
            Some(line) => {
                let wanted = line.quantity.saturating_add(quantity);
                if wanted > product.stock {
                    return Err(CartError::StockExceeded {
                        available: product.stock,
                    });
                }
                line.quantity = wanted;
                line.price = product.price;
                line.stock = product.stock;
            }
            None => {
                if self.cart.items.len() >= MAX_GUEST_LINES {
                    return Err(CartError::CapacityFull {
                        max: MAX_GUEST_LINES,
                    });
                }
                if quantity > product.stock {
                    return Err(CartError::StockExceeded {
                        available: product.stock,
                    });
                }
                self.cart
                    .items
                    .push(GuestCartItem::from_snapshot(product, quantity));
            }
        }

        self.commit()
    }

    /// Bump an existing line by `amount`, capped by the stock recorded
    /// on the line.
    pub fn increase_quantity(&mut self, product_id: &str, amount: u32) -> CartResult<GuestCart> {
        if amount == 0 {
            return Err(CartError::Validation(
                "amount must be at least 1".to_string(),
            ));
        }

        let line = self
            .cart
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
            .ok_or_else(|| CartError::NotFound(format!("product {product_id} is not in the cart")))?;

        let wanted = line.quantity.saturating_add(amount);
        if wanted > line.stock {
            return Err(CartError::StockExceeded {
                available: line.stock,
            });
        }
        line.quantity = wanted;

        self.commit()
    }

    /// Lower an existing line by `amount`; reaching zero removes the
    /// line entirely.
    pub fn decrease_quantity(&mut self, product_id: &str, amount: u32) -> CartResult<GuestCart> {
        if amount == 0 {
            return Err(CartError::Validation(
                "amount must be at least 1".to_string(),
            ));
        }

        let index = self
            .cart
            .items
            .iter()
            .position(|item| item.product_id == product_id)
            .ok_or_else(|| CartError::NotFound(format!("product {product_id} is not in the cart")))?;

        if self.cart.items[index].quantity <= amount {
            self.cart.items.remove(index);
        } else {
            self.cart.items[index].quantity -= amount;
        }

        self.commit()
    }

    /// Drop a line. Removing a product that is not present is a no-op
    /// and does not rewrite the file.
    pub fn remove_item(&mut self, product_id: &str) -> CartResult<GuestCart> {
        let Some(index) = self
            .cart
            .items
            .iter()
            .position(|item| item.product_id == product_id)
        else {
            return Ok(self.cart.clone());
        };

        self.cart.items.remove(index);
        self.commit()
    }

    pub fn clear(&mut self) -> CartResult<GuestCart> {
        self.cart.items.clear();
        self.commit()
    }
}
