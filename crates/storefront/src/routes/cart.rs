//! Cart route handlers.
//!
//! The cart lives in the session. Every mutation loads it, applies the
//! change and writes it back before redirecting to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, load, set_flash, store};
use super::products::parse_id;
use crate::cart::{Cart, CartItem, CartTotals};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

/// Shown in place of an amount that can't be computed.
const UNAVAILABLE: &str = "Unavailable";

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    pub size: String,
    pub seller_name: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.product.id.to_string(),
            title: item.product.title.clone(),
            image: item.product.image.clone(),
            size: item.product.size.clone(),
            seller_name: item.product.seller_name.clone(),
            quantity: item.quantity,
            price: item.product.price.display(),
            line_price: item
                .line_price()
                .map_or_else(|| UNAVAILABLE.to_string(), |p| p.display()),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub shipping: String,
    pub total: String,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let lines = cart.items().iter().map(CartLineView::from).collect();
        let Some(CartTotals {
            subtotal,
            shipping,
            total,
            item_count,
        }) = cart.totals()
        else {
            return Self {
                lines,
                subtotal: UNAVAILABLE.to_string(),
                shipping: UNAVAILABLE.to_string(),
                total: UNAVAILABLE.to_string(),
                item_count: cart.item_count(),
            };
        };
        Self {
            lines,
            subtotal: subtotal.display(),
            shipping: if shipping.is_positive() {
                shipping.display()
            } else {
                "Free".to_string()
            },
            total: total.display(),
            item_count,
        }
    }
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: String,
}

/// Display cart page.
#[instrument(skip_all)]
pub async fn show(ctx: PageContext, session: Session) -> impl IntoResponse {
    let cart: Cart = load(&session, session_keys::CART).await;
    CartShowTemplate {
        ctx,
        cart: CartView::from(&cart),
    }
}

/// Add a live product to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let id = parse_id(&form.product_id)?;
    let product = state
        .catalog()
        .product(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let mut cart: Cart = load(&session, session_keys::CART).await;
    if let Err(e) = cart.add(&product, form.quantity.unwrap_or(1)) {
        set_flash(&session, e.to_string()).await;
        return Ok(Redirect::to(&format!("/product/{id}")));
    }
    store(&session, session_keys::CART, &cart).await?;

    let id = id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", &id)]));
    set_flash(&session, format!("Added {} to your cart", product.title)).await;
    Ok(Redirect::to("/cart"))
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateCartForm>) -> Result<Redirect> {
    let id = parse_id(&form.product_id)?;
    let mut cart: Cart = load(&session, session_keys::CART).await;
    match cart.set_quantity(id, form.quantity) {
        Ok(()) => store(&session, session_keys::CART, &cart).await?,
        Err(e) => set_flash(&session, e.to_string()).await,
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let id = parse_id(&form.product_id)?;
    let mut cart: Cart = load(&session, session_keys::CART).await;
    if cart.remove(id) {
        store(&session, session_keys::CART, &cart).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Redirect> {
    store(&session, session_keys::CART, &Cart::new()).await?;
    Ok(Redirect::to("/cart"))
}
