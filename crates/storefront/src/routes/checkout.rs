//! Checkout route handlers.
//!
//! `shipping → payment → review`, then placement. Cash-on-delivery orders go
//! straight to the success page; online orders go through the Razorpay
//! widget page, which posts back to `verify` or `cancel`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use bazaar_core::{OrderId, OrderTotals, PaymentMethod, ShippingAddress};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::backend::{BackendError, CartItem, Order, PaymentCallback, PaymentIntent};
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::models::UserSession;
use crate::models::flash::{self, Flash};
use crate::routes::{PageContext, sentence};
use crate::services::{
    CartSnapshot, CartStore, CheckoutError, CheckoutOrchestrator, CheckoutStep, PlacedOrder,
};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Payment step form data.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment_method: String,
}

/// Fields posted by the widget's success handler.
#[derive(Debug, Deserialize)]
pub struct VerifyForm {
    pub order_id: OrderId,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
}

/// Posted when the widget is dismissed.
#[derive(Debug, Deserialize)]
pub struct CancelForm {
    pub order_id: OrderId,
}

// =============================================================================
// Templates
// =============================================================================

/// Progress indicator entry.
pub struct StepView {
    pub label: &'static str,
    pub path: &'static str,
    pub current: bool,
    pub reachable: bool,
}

fn step_views(current: CheckoutStep, furthest: CheckoutStep) -> Vec<StepView> {
    CheckoutStep::ALL
        .into_iter()
        .map(|step| StepView {
            label: step.label(),
            path: step.path(),
            current: step == current,
            reachable: step <= furthest,
        })
        .collect()
}

/// Shipping step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/shipping.html")]
pub struct ShippingTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub address: ShippingAddress,
    pub totals: OrderTotals,
    pub error: Option<String>,
}

/// Payment step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/payment.html")]
pub struct PaymentTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub methods: Vec<MethodView>,
    pub totals: OrderTotals,
}

/// A payment method radio button.
pub struct MethodView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Review step template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/review.html")]
pub struct ReviewTemplate {
    pub ctx: PageContext,
    pub steps: Vec<StepView>,
    pub items: Vec<CartItem>,
    pub address: ShippingAddress,
    pub payment_label: &'static str,
    pub is_online: bool,
    pub totals: OrderTotals,
}

/// Razorpay widget page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/pay.html")]
pub struct PayTemplate {
    pub ctx: PageContext,
    pub order_id: OrderId,
    pub intent: PaymentIntent,
    pub customer_name: String,
    pub customer_email: String,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct SuccessTemplate {
    pub ctx: PageContext,
    pub order_id: OrderId,
    pub order: Option<Order>,
}

// =============================================================================
// Helpers
// =============================================================================

fn orchestrator<'a>(
    state: &'a AppState,
    session: &'a Session,
    user: &'a UserSession,
) -> CheckoutOrchestrator<'a> {
    CheckoutOrchestrator::new(state.backend(), session, user, &state.config().pricing)
}

/// A fresh cart, or the last snapshot if the backend is unreachable.
async fn current_cart(store: &CartStore<'_>) -> Result<CartSnapshot> {
    match store.fetch().await {
        Ok(cart) => Ok(cart),
        Err(e) if e.is_auth_failure() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Using cached cart for checkout");
            Ok(store.cached().await)
        }
    }
}

/// Turn a checkout failure into a flash and a redirect to where it can be
/// fixed. Token rejections are returned for the forced-logout layer.
async fn recover(session: &Session, error: CheckoutError) -> Result<Response> {
    if error.backend().is_some_and(BackendError::is_auth_failure) {
        return Err(error.into());
    }

    let to = match &error {
        CheckoutError::StepIncomplete(step) => step.path().to_owned(),
        CheckoutError::InvalidAddress(_) => CheckoutStep::Shipping.path().to_owned(),
        CheckoutError::EmptyCart | CheckoutError::UnavailableItems(_) => "/cart".to_owned(),
        CheckoutError::PaymentSetup { order_id, .. }
        | CheckoutError::PaymentNotStarted(order_id)
        | CheckoutError::PaymentMismatch(order_id) => format!("/account/orders/{order_id}"),
        CheckoutError::Backend(_) | CheckoutError::Session(_) => {
            CheckoutStep::Review.path().to_owned()
        }
    };

    tracing::warn!(error = %error, redirect = %to, "Checkout step failed");
    let message = match &error {
        CheckoutError::PaymentSetup { .. } => {
            "Your order was placed but the payment could not be started. \
             You can pay from the order page or contact support."
                .to_owned()
        }
        CheckoutError::Backend(e) => e.user_message(),
        other => sentence(&other.to_string()),
    };
    flash::push(session, Flash::error(message)).await;
    Ok(Redirect::to(&to).into_response())
}

// =============================================================================
// Wizard
// =============================================================================

/// Send the shopper to the furthest step they can enter.
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Redirect {
    let draft = orchestrator(&state, &session, &user).draft().await;
    Redirect::to(draft.current_step().path())
}

/// Display the shipping address form.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id))]
pub async fn shipping_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let checkout = orchestrator(&state, &session, &user);
    let cart = current_cart(&CartStore::new(state.backend(), &session, &user)).await?;
    if cart.is_empty() {
        flash::push(&session, Flash::info("Add something to your cart first")).await;
        return Ok(ctx.redirect("/cart").await.into_response());
    }

    let draft = checkout.draft().await;
    let address = draft.address.clone().unwrap_or_else(|| ShippingAddress {
        full_name: user.user.name.clone(),
        ..ShippingAddress::default()
    });

    Ok(ShippingTemplate {
        ctx,
        steps: step_views(CheckoutStep::Shipping, draft.current_step()),
        address,
        totals: checkout.totals(&cart),
        error: None,
    }
    .into_response())
}

/// Save the shipping address. Invalid input re-renders the form.
#[instrument(skip(state, session, ctx, user, address), fields(user_id = %user.user.id))]
pub async fn save_shipping(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Form(address): Form<ShippingAddress>,
) -> Result<Response> {
    let checkout = orchestrator(&state, &session, &user);
    match checkout.save_address(address.clone()).await {
        Ok(_) => Ok(ctx
            .redirect(CheckoutStep::Payment.path())
            .await
            .into_response()),
        Err(CheckoutError::InvalidAddress(e)) => {
            let cart = CartStore::new(state.backend(), &session, &user).cached().await;
            let draft = checkout.draft().await;
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                ShippingTemplate {
                    ctx,
                    steps: step_views(CheckoutStep::Shipping, draft.current_step()),
                    address,
                    totals: checkout.totals(&cart),
                    error: Some(sentence(&e.to_string())),
                },
            )
                .into_response())
        }
        Err(e) => recover(&session, e).await,
    }
}

/// Display the payment method choice.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id))]
pub async fn payment_page(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let checkout = orchestrator(&state, &session, &user);
    let draft = checkout.draft().await;
    if !draft.can_enter(CheckoutStep::Payment) {
        return Ok(ctx
            .redirect(draft.current_step().path())
            .await
            .into_response());
    }

    let cart = CartStore::new(state.backend(), &session, &user).cached().await;
    let chosen = draft.payment_method.unwrap_or_default();
    let methods = [PaymentMethod::Cod, PaymentMethod::Online]
        .into_iter()
        .map(|method| MethodView {
            value: method.as_str(),
            label: method.label(),
            selected: method == chosen,
        })
        .collect();

    Ok(PaymentTemplate {
        ctx,
        steps: step_views(CheckoutStep::Payment, draft.current_step()),
        methods,
        totals: checkout.totals(&cart),
    }
    .into_response())
}

/// Save the payment method.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn save_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Response> {
    let method = PaymentMethod::parse_lenient(&form.payment_method);
    match orchestrator(&state, &session, &user)
        .save_payment_method(method)
        .await
    {
        Ok(_) => Ok(Redirect::to(CheckoutStep::Review.path()).into_response()),
        Err(e) => recover(&session, e).await,
    }
}

/// Display the order review.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id))]
pub async fn review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> Result<Response> {
    let checkout = orchestrator(&state, &session, &user);
    let draft = checkout.draft().await;
    let review = match checkout.review().await {
        Ok(review) => review,
        Err(e) => {
            ctx.keep_flashes().await;
            return recover(&session, e).await;
        }
    };

    Ok(ReviewTemplate {
        ctx,
        steps: step_views(CheckoutStep::Review, draft.current_step()),
        payment_label: review.payment_method.label(),
        is_online: review.payment_method == PaymentMethod::Online,
        items: review.items,
        address: review.address,
        totals: review.totals,
    }
    .into_response())
}

/// Place the order.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    match orchestrator(&state, &session, &user).place_order().await {
        Ok(PlacedOrder::Completed { order_id }) => {
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
            flash::push(&session, Flash::success("Thank you! Your order has been placed.")).await;
            Ok(Redirect::to(&format!("/checkout/success/{order_id}")).into_response())
        }
        Ok(PlacedOrder::AwaitingPayment { order_id, .. }) => {
            add_breadcrumb(
                "checkout",
                "Order awaiting payment",
                Some(&[("order_id", order_id.as_str())]),
            );
            Ok(Redirect::to(&format!("/checkout/pay/{order_id}")).into_response())
        }
        Err(e) => recover(&session, e).await,
    }
}

// =============================================================================
// Online payment
// =============================================================================

/// Display the Razorpay widget for a pending payment.
#[instrument(skip(state, session, ctx, user), fields(user_id = %user.user.id, order_id = %order_id))]
pub async fn pay(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
    Path(order_id): Path<OrderId>,
) -> Result<Response> {
    let Some(pending) = orchestrator(&state, &session, &user)
        .pending_payment(&order_id)
        .await
    else {
        flash::push(
            &session,
            Flash::info("There is no payment waiting for this order."),
        )
        .await;
        return Ok(ctx
            .redirect(&format!("/account/orders/{order_id}"))
            .await
            .into_response());
    };

    Ok(PayTemplate {
        ctx,
        order_id,
        intent: pending.intent,
        customer_name: user.user.name.clone(),
        customer_email: user.user.email.clone(),
    }
    .into_response())
}

/// Verify the widget's success callback.
#[instrument(skip(state, session, user, form), fields(user_id = %user.user.id, order_id = %form.order_id))]
pub async fn verify_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<VerifyForm>,
) -> Result<Response> {
    let callback = PaymentCallback {
        razorpay_order_id: form.razorpay_order_id,
        razorpay_payment_id: form.razorpay_payment_id,
        razorpay_signature: form.razorpay_signature,
    };

    match orchestrator(&state, &session, &user)
        .verify_payment(&form.order_id, &callback)
        .await
    {
        Ok(()) => {
            add_breadcrumb(
                "checkout",
                "Payment verified",
                Some(&[("order_id", form.order_id.as_str())]),
            );
            flash::push(&session, Flash::success("Payment received. Thank you!")).await;
            Ok(Redirect::to(&format!("/checkout/success/{}", form.order_id)).into_response())
        }
        Err(CheckoutError::Backend(e)) if !e.is_auth_failure() => {
            tracing::warn!(error = %e, "Payment verification rejected");
            flash::push(
                &session,
                Flash::error(
                    "We could not confirm your payment. If money was deducted, \
                     it will be refunded or applied once confirmed.",
                ),
            )
            .await;
            Ok(Redirect::to(&format!("/account/orders/{}", form.order_id)).into_response())
        }
        Err(e) => recover(&session, e).await,
    }
}

/// Record an abandoned payment. Always succeeds from the shopper's side.
#[instrument(skip(state, session, user), fields(user_id = %user.user.id, order_id = %form.order_id))]
pub async fn cancel_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CancelForm>,
) -> Redirect {
    orchestrator(&state, &session, &user)
        .cancel_payment(&form.order_id)
        .await;
    flash::push(
        &session,
        Flash::info("Payment cancelled. Your order is saved and unpaid."),
    )
    .await;
    Redirect::to(&format!("/account/orders/{}", form.order_id))
}

/// Display the order confirmation.
#[instrument(skip(state, ctx, user), fields(user_id = %user.user.id, order_id = %order_id))]
pub async fn success(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    mut ctx: PageContext,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let order = match state.backend().get_order(&user.token, &order_id).await {
        Ok(order) => Some(order),
        Err(e) if e.is_auth_failure() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Confirmation page could not load the order");
            None
        }
    };
    ctx.cart_count = 0;

    Ok(SuccessTemplate {
        ctx,
        order_id,
        order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_views_mark_reachability() {
        let steps = step_views(CheckoutStep::Shipping, CheckoutStep::Payment);
        assert!(steps[0].current);
        assert!(steps[1].reachable);
        assert!(!steps[2].reachable);
    }
}
