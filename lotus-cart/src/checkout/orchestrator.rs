//! Order submission flow
//!
//! Validates the form, shapes the request for the shopper type and
//! payment method, and holds guest orders behind the phone
//! verification gate until the OTP checks out.

use std::sync::Arc;

use tokio::sync::Mutex;

use lotus_client::{ClientError, OrderApi};
use shared::models::{
    CreateOrderRequest, CreatedOrder, GuestOrderLine, PaymentMethod, PaymentRedirect,
};

use crate::cart::engine::{BackendMode, CartEngine};
use crate::checkout::validate::{CheckoutForm, validate};
use crate::error::{CartError, CartResult};
use crate::signals::SessionSignal;

/// Where a submission attempt landed.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    /// Order placed; nothing further to do (COD)
    Completed(CreatedOrder),
    /// Order placed; send the shopper to the payment page
    RedirectToPayment(PaymentRedirect),
    /// Guest order parked until the OTP for this phone is verified
    AwaitingOtp { phone: String },
}

/// A guest order held back by the OTP gate.
struct PendingOrder {
    request: CreateOrderRequest,
    selected_total: f64,
    phone: String,
}

/// Drives checkout from form to created order.
pub struct CheckoutFlow {
    engine: Arc<CartEngine>,
    orders: OrderApi,
    pending: Mutex<Option<PendingOrder>>,
}

impl CheckoutFlow {
    pub fn new(engine: Arc<CartEngine>, orders: OrderApi) -> Self {
        Self {
            engine,
            orders,
            pending: Mutex::new(None),
        }
    }

    /// Validate and submit. Guests get an OTP challenge instead of an
    /// immediate submission; authenticated shoppers go straight to
    /// order creation.
    pub async fn submit(
        &self,
        form: &CheckoutForm,
        payment_method: PaymentMethod,
    ) -> CartResult<CheckoutOutcome> {
        let validated = match validate(form) {
            Ok(validated) => validated,
            Err(errors) => return Err(CartError::Validation(errors.summary())),
        };

        let is_guest = self.engine.backend_mode() == BackendMode::Guest;
        let state = self.engine.snapshot().await;

        let selected: Vec<_> = state
            .items
            .iter()
            .filter(|item| state.selected.contains(&item.product_id))
            .collect();
        if selected.is_empty() {
            return Err(CartError::OrderSubmission(
                "no items selected for checkout".to_string(),
            ));
        }
        let selected_total = state.selected_subtotal();

        let request = CreateOrderRequest {
            shipping_address: validated.shipping_address,
            note: validated.note,
            payment_method,
            require_invoice: validated.require_invoice,
            is_guest,
            guest_info: is_guest.then(|| validated.contact.clone()),
            guest_cart_items: is_guest.then(|| {
                selected
                    .iter()
                    .map(|item| GuestOrderLine {
                        product_id: item.product_id.clone(),
                        quantity: item.quantity,
                        price: item.product.price,
                        name: item.product.name.clone(),
                    })
                    .collect()
            }),
        };

        if is_guest {
            let phone = validated.contact.phone.clone();
            self.orders.request_otp(&phone).await?;
            tracing::info!(phone = %phone, "order parked awaiting OTP verification");

            let mut pending = self.pending.lock().await;
            *pending = Some(PendingOrder {
                request,
                selected_total,
                phone: phone.clone(),
            });
            return Ok(CheckoutOutcome::AwaitingOtp { phone });
        }

        self.place_order(request, selected_total).await
    }

    /// Submit the parked guest order once its OTP verifies. A wrong
    /// code keeps the order parked for another attempt.
    pub async fn verify_otp(&self, code: &str) -> CartResult<CheckoutOutcome> {
        let mut pending = self.pending.lock().await;
        let Some(parked) = pending.take() else {
            return Err(CartError::OrderSubmission(
                "no order awaiting verification".to_string(),
            ));
        };

        if let Err(err) = self.orders.verify_otp(&parked.phone, code).await {
            let message = match err {
                ClientError::Api { message } => message,
                other => other.user_message(),
            };
            tracing::warn!("OTP verification failed: {}", message);
            *pending = Some(parked);
            return Err(CartError::Validation(message));
        }
        drop(pending);

        self.place_order(parked.request, parked.selected_total)
            .await
    }

    /// Throw away a parked guest order without submitting it.
    pub async fn cancel_pending(&self) {
        let mut pending = self.pending.lock().await;
        if pending.take().is_some() {
            tracing::debug!("parked order discarded");
        }
    }

    pub async fn has_pending_order(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    async fn place_order(
        &self,
        request: CreateOrderRequest,
        selected_total: f64,
    ) -> CartResult<CheckoutOutcome> {
        let is_guest = request.is_guest;
        let payment_method = request.payment_method;

        let order = match self.orders.create_order(&request).await {
            Ok(order) => order,
            Err(ClientError::Unauthorized) => {
                self.engine.handle_signal(SessionSignal::Unauthorized).await;
                self.engine.signals().emit(SessionSignal::Unauthorized);
                return Err(CartError::AuthExpired);
            }
            // the backend refused the order (empty cart, stale stock)
            Err(ClientError::Api { message }) => {
                return Err(CartError::OrderSubmission(message));
            }
            // transport succeeded but the envelope is unusable
            Err(ClientError::InvalidResponse(message)) => {
                return Err(CartError::OrderSubmission(message));
            }
            Err(err) => return Err(err.into()),
        };

        tracing::info!(order_id = %order.id, is_guest, "order created");

        // the server emptied the authenticated cart; the guest cart is
        // ours to clear. Never the other way around.
        if is_guest {
            if let Err(err) = self.engine.clear_cart().await {
                tracing::warn!("failed to clear guest cart after order: {}", err);
            }
        } else if let Err(err) = self.engine.refresh_cart().await {
            tracing::warn!("failed to refresh cart after order: {}", err);
        }

        match payment_method {
            PaymentMethod::Cod => Ok(CheckoutOutcome::Completed(order)),
            PaymentMethod::Online => {
                let amount = order.total_amount.unwrap_or(selected_total);
                Ok(CheckoutOutcome::RedirectToPayment(PaymentRedirect {
                    order_id: order.id.clone(),
                    amount,
                }))
            }
        }
    }
}
