//! Product detail and hold-notification handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use thryft_core::{Email, MeasurementUnit, Product, ProductId, ProductStatus};
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, ProductCard, cards, load, saved_for, set_flash};
use crate::cart::Cart;
use crate::catalog::related;
use crate::error::{AppError, Result};
use crate::filters;
use crate::models::session_keys;
use crate::state::AppState;

/// Seller block on the detail page.
#[derive(Debug, Clone)]
pub struct SellerView {
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub rating: String,
    pub total_sales: u32,
    pub verified: bool,
    pub response_time: String,
    pub location: String,
}

/// Product display data for the detail page.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub category: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<u32>,
    pub images: Vec<String>,
    pub size_label: String,
    pub size: String,
    pub condition: &'static str,
    pub era: Option<String>,
    pub description: String,
    pub status: ProductStatus,
    pub measurements: Option<String>,
    pub tags: Vec<String>,
    pub allow_offers: bool,
    pub local_pickup: bool,
    pub shipping: String,
    pub likes: u32,
    pub views: u32,
    pub listed_on: String,
    pub seller: SellerView,
}

impl ProductView {
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.status.is_purchasable()
    }

    #[must_use]
    pub fn is_hold(&self) -> bool {
        self.status == ProductStatus::Hold
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

fn measurements_line(product: &Product) -> Option<String> {
    let m = product.measurements?;
    let unit = match m.unit {
        MeasurementUnit::Cm => "cm",
        MeasurementUnit::In => "in",
    };
    let parts: Vec<String> = [
        ("Chest", m.chest),
        ("Length", m.length),
        ("Waist", m.waist),
        ("Inseam", m.inseam),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.map(|v| format!("{label} {v}{unit}")))
    .collect();
    (!parts.is_empty()).then(|| parts.join(" · "))
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        let seller = &product.seller;
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            category: product.category.clone(),
            price: product.price.display(),
            original_price: product
                .discount_percent()
                .and(product.original_price)
                .map(|p| p.display()),
            discount: product.discount_percent(),
            images: product.images.clone(),
            size_label: product
                .known_category()
                .map_or("Size", |c| c.schema().size_label)
                .to_string(),
            size: product.size.clone(),
            condition: product.condition.label(),
            era: product.era.clone(),
            description: product.description.clone(),
            status: product.status,
            measurements: measurements_line(product),
            tags: product.tags.clone(),
            allow_offers: product.allow_offers,
            local_pickup: product.local_pickup,
            shipping: if product.shipping_cost.is_positive() {
                product.shipping_cost.display()
            } else {
                "Free".to_string()
            },
            likes: product.likes,
            views: product.views,
            listed_on: product.created_at.format("%-d %b %Y").to_string(),
            seller: SellerView {
                name: seller.name.clone(),
                username: seller.username.clone(),
                avatar: Some(seller.avatar.clone()).filter(|a| !a.is_empty()),
                rating: format!("{:.1}", seller.rating),
                total_sales: seller.total_sales,
                verified: seller.verified,
                response_time: seller.response_time.clone(),
                location: seller.location.clone(),
            },
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub ctx: PageContext,
    pub product: ProductView,
    pub saved: bool,
    pub in_cart: bool,
    pub related: Vec<ProductCard>,
}

pub(super) fn parse_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("product {raw}")))
}

/// Display a product.
#[instrument(skip(state, ctx, session))]
pub async fn show(
    State(state): State<AppState>,
    ctx: PageContext,
    session: Session,
    Path(id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = parse_id(&id)?;
    let product = state
        .catalog()
        .product(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    let products = state.catalog().products().await;
    let saved = saved_for(&state, ctx.user.as_ref()).await;
    let cart: Cart = load(&session, session_keys::CART).await;

    Ok(ProductShowTemplate {
        product: ProductView::from(&product),
        saved: saved.contains(id),
        in_cart: cart.contains(id),
        related: cards(related(&product, &products), &saved),
        ctx,
    })
}

/// Hold notification form.
#[derive(Debug, Deserialize)]
pub struct NotifyForm {
    pub email: String,
}

/// Sign up to hear when a held product is available again.
#[instrument(skip(state, session, form))]
pub async fn notify(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<NotifyForm>,
) -> Result<Redirect> {
    let id = parse_id(&id)?;
    let back = Redirect::to(&format!("/product/{id}"));

    let Ok(email) = Email::parse(&form.email) else {
        set_flash(&session, "Enter a valid email address").await;
        return Ok(back);
    };

    let product = state
        .catalog()
        .product(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    if product.status != ProductStatus::Hold {
        set_flash(&session, "This item isn't on hold").await;
        return Ok(back);
    }

    match state
        .backend()
        .insert_hold_notification(id, email.as_str())
        .await
    {
        Ok(()) => set_flash(&session, "We'll email you if it becomes available").await,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to save hold notification");
            set_flash(&session, "Couldn't save that right now. Try again.").await;
        }
    }

    Ok(back)
}

#[cfg(test)]
mod tests {
    use thryft_core::Measurements;

    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_measurements_line() {
        let mut p = product("Accessories", 500);
        assert_eq!(measurements_line(&p), None);
        p.measurements = Some(Measurements {
            chest: Some(52.0),
            length: None,
            waist: Some(40.5),
            inseam: None,
            unit: MeasurementUnit::Cm,
        });
        assert_eq!(
            measurements_line(&p).as_deref(),
            Some("Chest 52cm · Waist 40.5cm")
        );
    }

    #[test]
    fn test_view_free_shipping_and_size_label() {
        let view = ProductView::from(&product("Watch", 9_000));
        assert_eq!(view.shipping, "Free");
        assert_eq!(view.size_label, "Case size");
        assert!(view.is_live());
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(matches!(parse_id("nope"), Err(AppError::NotFound(_))));
    }
}
