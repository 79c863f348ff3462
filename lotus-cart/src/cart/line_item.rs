//! Optimistic quantity control for one cart row
//!
//! A row bumps its displayed quantity the moment the shopper clicks,
//! then reconciles with the engine's confirmed state when the call
//! resolves. A failed call snaps the display back to the last
//! committed quantity.

use std::sync::Arc;

use crate::cart::engine::CartEngine;
use crate::error::CartResult;

/// Per-row quantity state layered over [`CartEngine`].
pub struct LineItemController {
    engine: Arc<CartEngine>,
    product_id: String,
    displayed: u32,
    committed: u32,
    stock: u32,
}

impl LineItemController {
    /// Bind to an existing cart line. Returns `None` when the product
    /// is not in the cart.
    pub async fn attach(engine: Arc<CartEngine>, product_id: &str) -> Option<Self> {
        let view = engine.line_view(product_id).await?;
        Some(Self {
            engine,
            product_id: product_id.to_string(),
            displayed: view.quantity,
            committed: view.quantity,
            stock: view.stock,
        })
    }

    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// What the row shows right now, confirmed or not.
    pub fn displayed_quantity(&self) -> u32 {
        self.displayed
    }

    pub fn committed_quantity(&self) -> u32 {
        self.committed
    }

    /// Re-pull the confirmed quantity from shared state. A line that
    /// disappeared (removed here or in another tab) shows zero.
    pub async fn sync_committed(&mut self) {
        match self.engine.line_view(&self.product_id).await {
            Some(view) => {
                self.committed = view.quantity;
                self.displayed = view.quantity;
                self.stock = view.stock;
            }
            None => {
                self.committed = 0;
                self.displayed = 0;
            }
        }
    }

    /// Bump the display by one and confirm with the engine. Refuses
    /// outright at the stock ceiling, before any state change.
    pub async fn increase(&mut self) -> CartResult<()> {
        if self.displayed >= self.stock {
            tracing::debug!(
                product_id = %self.product_id,
                stock = self.stock,
                "row is at the stock ceiling"
            );
            return Ok(());
        }

        self.displayed += 1;
        match self.engine.increase_quantity(&self.product_id, 1).await {
            Ok(()) => {
                self.sync_committed().await;
                Ok(())
            }
            Err(err) => {
                self.displayed = self.committed;
                Err(err)
            }
        }
    }

    /// Drop the display by one; at quantity 1 this removes the line
    /// instead of decrementing to zero.
    pub async fn decrease(&mut self) -> CartResult<()> {
        if self.displayed <= 1 {
            return self.remove().await;
        }

        self.displayed -= 1;
        match self.engine.decrease_quantity(&self.product_id, 1).await {
            Ok(()) => {
                self.sync_committed().await;
                Ok(())
            }
            Err(err) => {
                self.displayed = self.committed;
                Err(err)
            }
        }
    }

    pub async fn remove(&mut self) -> CartResult<()> {
        match self.engine.remove_item(&self.product_id).await {
            Ok(()) => {
                self.sync_committed().await;
                Ok(())
            }
            Err(err) => {
                self.displayed = self.committed;
                Err(err)
            }
        }
    }
}
