//! Checkout handoff to the payment widget.
//!
//! ```text
//! GET  /checkout           - Contact form and order summary
//! POST /checkout           - Validate contact, return widget options (JSON)
//! POST /checkout/complete  - Widget resolved: verify, clear cart, confirm
//! POST /checkout/cancel    - Widget dismissed: keep cart, back to checkout
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use thryft_core::Email;
use tower_sessions::Session;
use tracing::instrument;

use super::cart::CartView;
use super::page::{PageContext, load, set_flash, store};
use crate::cart::Cart;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session_keys;
use crate::services::payments::{
    CHECKOUT_SCRIPT_URL, CheckoutContact, CheckoutOptions, PaymentError, PaymentResult,
};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub name: String,
    pub email: String,
    pub payments_ready: bool,
    pub script_url: &'static str,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/complete.html")]
pub struct CheckoutCompleteTemplate {
    pub ctx: PageContext,
    pub payment_id: String,
    pub total: String,
    pub item_count: u32,
}

/// Widget dismissal form. Carries nothing the server needs.
#[derive(Debug, Default, Deserialize)]
pub struct CancelForm {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Display the checkout page.
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
) -> Response {
    let cart: Cart = load(&session, session_keys::CART).await;
    if cart.is_empty() {
        return Redirect::to("/cart").into_response();
    }

    let (name, email) = ctx.user.as_ref().map_or_else(Default::default, |user| {
        (
            user.name.clone(),
            user.email
                .as_ref()
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
        )
    });

    CheckoutTemplate {
        cart: CartView::from(&cart),
        name,
        email,
        payments_ready: state.payments().is_configured(),
        script_url: CHECKOUT_SCRIPT_URL,
        ctx,
    }
    .into_response()
}

/// Validate the contact form and build widget options.
#[instrument(skip_all)]
pub async fn start(
    State(state): State<AppState>,
    session: Session,
    Form(contact): Form<CheckoutContact>,
) -> Result<Json<CheckoutOptions>> {
    if contact.name.trim().is_empty() {
        return Err(AppError::BadRequest("Enter your name".to_string()));
    }
    let email = Email::parse(&contact.email)
        .map_err(|_| AppError::BadRequest("Enter a valid email address".to_string()))?;

    let cart: Cart = load(&session, session_keys::CART).await;
    let options = state.payments().checkout_options(&cart, &contact, &email)?;

    add_breadcrumb("checkout", "Opened payment widget", None);
    Ok(Json(options))
}

/// Leave the cart alone and send the buyer back to checkout.
async fn cancelled(session: &Session) -> Response {
    tracing::info!("Payment cancelled");
    set_flash(session, PaymentError::Cancelled.to_string()).await;
    Redirect::to("/checkout").into_response()
}

/// Payment resolved in the widget.
#[instrument(skip_all)]
pub async fn complete(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Form(result): Form<PaymentResult>,
) -> Result<Response> {
    match state.payments().verify(&result) {
        Ok(()) => {}
        Err(PaymentError::Cancelled) => return Ok(cancelled(&session).await),
        Err(e) => return Err(e.into()),
    }

    let cart: Cart = load(&session, session_keys::CART).await;
    let total = cart.totals().map(|t| t.total);
    store(&session, session_keys::CART, &Cart::new()).await?;

    tracing::info!(total = ?total.map(|t| t.amount), "Payment completed");

    Ok(CheckoutCompleteTemplate {
        payment_id: result.razorpay_payment_id,
        total: total.map(|t| t.display()).unwrap_or_default(),
        item_count: cart.item_count(),
        ctx: PageContext {
            cart_count: 0,
            ..ctx
        },
    }
    .into_response())
}

/// Payment widget dismissed.
#[instrument(skip_all)]
pub async fn cancel(session: Session, Form(_form): Form<CancelForm>) -> Response {
    cancelled(&session).await
}
