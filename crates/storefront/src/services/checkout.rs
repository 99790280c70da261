//! Checkout orchestration.
//!
//! A linear wizard, `shipping → payment → review`, whose draft lives in the
//! session. Placing the order posts it to the backend; cash-on-delivery
//! orders are done at that point, online orders continue with a payment
//! intent, the Razorpay widget and a verification callback.

use std::fmt;

use bazaar_core::{
    AddressError, OrderId, OrderTotals, PaymentMethod, PricingRules, ShippingAddress,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::backend::{
    BackendClient, BackendError, CartItem, OrderRequest, PaymentCallback, PaymentIntent,
};
use crate::models::UserSession;
use crate::models::session_keys;

use super::cart::{CartSnapshot, CartStore};
use super::load_snapshot;

/// Session key for the payment awaiting the widget.
const PENDING_PAYMENT_KEY: &str = "checkout-payment";

/// Errors that stop the checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("please complete the {0} step first")]
    StepIncomplete(CheckoutStep),

    #[error("{0}")]
    InvalidAddress(#[from] AddressError),

    #[error("some items are no longer available: {}", .0.join(", "))]
    UnavailableItems(Vec<String>),

    #[error("no payment is pending for order {0}")]
    PaymentNotStarted(OrderId),

    #[error("payment does not match order {0}")]
    PaymentMismatch(OrderId),

    /// The order exists but its payment could not be set up.
    #[error("order {order_id} was placed but payment could not be started: {source}")]
    PaymentSetup {
        order_id: OrderId,
        source: BackendError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl CheckoutError {
    /// The backend error behind this failure, if any.
    #[must_use]
    pub const fn backend(&self) -> Option<&BackendError> {
        match self {
            Self::Backend(e) | Self::PaymentSetup { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

// =============================================================================
// Steps and draft
// =============================================================================

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    pub const ALL: [Self; 3] = [Self::Shipping, Self::Payment, Self::Review];

    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Shipping => "/checkout/shipping",
            Self::Payment => "/checkout/payment",
            Self::Review => "/checkout/review",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shipping => "shipping",
            Self::Payment => "payment",
            Self::Review => "review",
        }
    }

    /// The step before this one.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Shipping => None,
            Self::Payment => Some(Self::Shipping),
            Self::Review => Some(Self::Payment),
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Data collected by the wizard so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub address: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
}

impl CheckoutDraft {
    /// The furthest step whose prerequisites are met.
    #[must_use]
    pub const fn current_step(&self) -> CheckoutStep {
        match (&self.address, &self.payment_method) {
            (None, _) => CheckoutStep::Shipping,
            (Some(_), None) => CheckoutStep::Payment,
            (Some(_), Some(_)) => CheckoutStep::Review,
        }
    }

    /// Whether `step` may be shown. Earlier steps always may.
    #[must_use]
    pub fn can_enter(&self, step: CheckoutStep) -> bool {
        step <= self.current_step()
    }

    /// Record a validated shipping address.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn set_address(&mut self, address: ShippingAddress) -> Result<(), CheckoutError> {
        self.address = Some(address.validated()?);
        Ok(())
    }

    /// Record the payment method.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::StepIncomplete`] without a shipping address.
    pub fn set_payment_method(&mut self, method: PaymentMethod) -> Result<(), CheckoutError> {
        if !self.can_enter(CheckoutStep::Payment) {
            return Err(CheckoutError::StepIncomplete(CheckoutStep::Shipping));
        }
        self.payment_method = Some(method);
        Ok(())
    }
}

/// Everything the review page shows and the order is built from.
#[derive(Debug, Clone)]
pub struct CheckoutReview {
    pub items: Vec<CartItem>,
    pub address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub totals: OrderTotals,
}

/// Outcome of placing an order.
#[derive(Debug, Clone)]
pub enum PlacedOrder {
    /// Cash on delivery: nothing left to do.
    Completed { order_id: OrderId },
    /// Online: the widget must collect payment for `intent`.
    AwaitingPayment {
        order_id: OrderId,
        intent: PaymentIntent,
    },
}

/// An online payment waiting for the widget, kept in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPayment {
    pub order_id: OrderId,
    pub intent: PaymentIntent,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Drives the checkout for the signed-in shopper.
pub struct CheckoutOrchestrator<'a> {
    backend: &'a BackendClient,
    session: &'a Session,
    user: &'a UserSession,
    rules: &'a PricingRules,
}

impl<'a> CheckoutOrchestrator<'a> {
    #[must_use]
    pub const fn new(
        backend: &'a BackendClient,
        session: &'a Session,
        user: &'a UserSession,
        rules: &'a PricingRules,
    ) -> Self {
        Self {
            backend,
            session,
            user,
            rules,
        }
    }

    fn cart(&self) -> CartStore<'a> {
        CartStore::new(self.backend, self.session, self.user)
    }

    /// The draft so far.
    pub async fn draft(&self) -> CheckoutDraft {
        load_snapshot(self.session, session_keys::CHECKOUT).await
    }

    async fn save_draft(&self, draft: &CheckoutDraft) -> Result<(), CheckoutError> {
        self.session.insert(session_keys::CHECKOUT, draft).await?;
        Ok(())
    }

    /// Forget the draft.
    pub async fn discard_draft(&self) {
        if let Err(e) = self.session.remove_value(session_keys::CHECKOUT).await {
            warn!(error = %e, "Failed to discard checkout draft");
        }
    }

    /// Totals for a cart under the configured pricing rules.
    #[must_use]
    pub fn totals(&self, cart: &CartSnapshot) -> OrderTotals {
        OrderTotals::compute(cart.subtotal().amount, self.rules)
    }

    /// Complete the shipping step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidAddress`] if the address fails validation.
    pub async fn save_address(&self, address: ShippingAddress) -> Result<CheckoutDraft, CheckoutError> {
        let mut draft = self.draft().await;
        draft.set_address(address)?;
        self.save_draft(&draft).await?;
        Ok(draft)
    }

    /// Complete the payment step.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::StepIncomplete`] if shipping is not done.
    pub async fn save_payment_method(
        &self,
        method: PaymentMethod,
    ) -> Result<CheckoutDraft, CheckoutError> {
        let mut draft = self.draft().await;
        draft.set_payment_method(method)?;
        self.save_draft(&draft).await?;
        Ok(draft)
    }

    /// Assemble the review from the draft and a fresh cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::StepIncomplete`] for an unfinished draft and
    /// [`CheckoutError::EmptyCart`] when there is nothing to buy.
    pub async fn review(&self) -> Result<CheckoutReview, CheckoutError> {
        let draft = self.draft().await;
        let step = draft.current_step();
        let (Some(address), Some(payment_method)) = (draft.address, draft.payment_method) else {
            return Err(CheckoutError::StepIncomplete(draft_gap(step)));
        };

        let cart = self.cart().fetch().await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(CheckoutReview {
            totals: self.totals(&cart),
            items: cart.items,
            address,
            payment_method,
        })
    }

    /// Place the order.
    ///
    /// For cash on delivery the cart is cleared and the order is complete.
    /// For online payment a payment intent is created and remembered in the
    /// session until the widget reports back.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnavailableItems`] when the cart holds lines
    /// that can no longer be bought, and [`CheckoutError::PaymentSetup`] when
    /// the order was created but its payment intent was not.
    #[instrument(skip(self), fields(user_id = %self.user.user.id))]
    pub async fn place_order(&self) -> Result<PlacedOrder, CheckoutError> {
        let review = self.review().await?;

        let unavailable: Vec<String> = review
            .items
            .iter()
            .filter(|item| !item.available)
            .map(|item| item.name.clone())
            .collect();
        if !unavailable.is_empty() {
            return Err(CheckoutError::UnavailableItems(unavailable));
        }

        let request = OrderRequest {
            items: &review.items,
            address: &review.address,
            payment_method: review.payment_method,
            totals: &review.totals,
        };
        let order_id = self.backend.create_order(&self.user.token, &request).await?;
        info!(order_id = %order_id, method = review.payment_method.as_str(), "Order placed");

        self.discard_draft().await;

        match review.payment_method {
            PaymentMethod::Cod => {
                self.cart().clear().await;
                Ok(PlacedOrder::Completed { order_id })
            }
            PaymentMethod::Online => {
                let intent = self
                    .backend
                    .create_payment_intent(&self.user.token, &order_id, review.totals.total)
                    .await
                    .map_err(|source| CheckoutError::PaymentSetup {
                        order_id: order_id.clone(),
                        source,
                    })?;

                let pending = PendingPayment {
                    order_id: order_id.clone(),
                    intent: intent.clone(),
                };
                self.session.insert(PENDING_PAYMENT_KEY, &pending).await?;

                Ok(PlacedOrder::AwaitingPayment { order_id, intent })
            }
        }
    }

    /// The payment awaiting the widget for `order_id`.
    pub async fn pending_payment(&self, order_id: &OrderId) -> Option<PendingPayment> {
        load_snapshot::<Option<PendingPayment>>(self.session, PENDING_PAYMENT_KEY)
            .await
            .filter(|pending| &pending.order_id == order_id)
    }

    /// Verify the widget's success callback with the backend, then clear the
    /// cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PaymentMismatch`] when the callback is for a
    /// different gateway order, or the backend's rejection.
    #[instrument(skip(self, callback), fields(order_id = %order_id))]
    pub async fn verify_payment(
        &self,
        order_id: &OrderId,
        callback: &PaymentCallback,
    ) -> Result<(), CheckoutError> {
        let pending = self
            .pending_payment(order_id)
            .await
            .ok_or_else(|| CheckoutError::PaymentNotStarted(order_id.clone()))?;
        if pending.intent.gateway_order_id != callback.razorpay_order_id {
            return Err(CheckoutError::PaymentMismatch(order_id.clone()));
        }

        self.backend
            .verify_payment(&self.user.token, order_id, callback)
            .await?;
        info!("Payment verified");

        self.forget_pending().await;
        self.cart().clear().await;
        Ok(())
    }

    /// Report an abandoned payment. Best-effort: failures are logged and
    /// swallowed.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_payment(&self, order_id: &OrderId) {
        let gateway_order_id = self
            .pending_payment(order_id)
            .await
            .map(|pending| pending.intent.gateway_order_id);

        if let Err(e) = self
            .backend
            .cancel_payment(&self.user.token, order_id, gateway_order_id.as_deref())
            .await
        {
            warn!(error = %e, "Payment cancellation failed");
        }
        self.forget_pending().await;
    }

    async fn forget_pending(&self) {
        if let Err(e) = self.session.remove_value(PENDING_PAYMENT_KEY).await {
            warn!(error = %e, "Failed to clear pending payment");
        }
    }
}

/// The step still missing data, given the furthest reachable one.
const fn draft_gap(current: CheckoutStep) -> CheckoutStep {
    match current {
        CheckoutStep::Shipping => CheckoutStep::Shipping,
        CheckoutStep::Payment | CheckoutStep::Review => CheckoutStep::Payment,
    }
}
