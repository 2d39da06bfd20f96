//! Admin dashboard.
//!
//! ```text
//! GET  /admin                       - Stats, listings and users
//! POST /admin/products/{id}/status  - Change a listing's status
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use thryft_core::{CurrencyCode, Price, Product, ProductStatus, UserProfile};
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, set_flash};
use super::products::parse_id;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Headline numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub users: usize,
    pub live: usize,
    pub hold: usize,
    pub sold: usize,
    /// Sum of sold listing prices.
    pub gmv: String,
}

impl DashboardStats {
    #[must_use]
    pub fn compute(products: &[Product], users: usize) -> Self {
        let count = |status: ProductStatus| products.iter().filter(|p| p.status == status).count();
        let gmv = Price::sum(
            CurrencyCode::INR,
            products
                .iter()
                .filter(|p| p.status == ProductStatus::Sold)
                .map(|p| p.price),
        );
        Self {
            users,
            live: count(ProductStatus::Live),
            hold: count(ProductStatus::Hold),
            sold: count(ProductStatus::Sold),
            gmv: gmv.map_or_else(|| "Unavailable".to_string(), |p| p.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingRow {
    pub id: String,
    pub title: String,
    pub category: String,
    pub seller_name: String,
    pub price: String,
    pub status: ProductStatus,
    pub listed_on: String,
}

impl From<&Product> for ListingRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            category: product.category.clone(),
            seller_name: product.seller.name.clone(),
            price: product.price.display(),
            status: product.status,
            listed_on: product.created_at.format("%d %b %Y").to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub name: String,
    pub email: String,
    pub location: String,
}

impl From<&UserProfile> for UserRow {
    fn from(user: &UserProfile) -> Self {
        Self {
            name: user.name.clone(),
            email: user
                .email
                .as_ref()
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
            location: user.location.clone().unwrap_or_default(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub ctx: PageContext,
    pub stats: DashboardStats,
    pub listings: Vec<ListingRow>,
    pub users: Vec<UserRow>,
    pub statuses: [ProductStatus; 3],
}

#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ctx: PageContext,
) -> Result<impl IntoResponse> {
    let products = state.backend().products().await?;
    let users = match state.backend().users(&admin.access_token).await {
        Ok(users) => users,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load users");
            Vec::new()
        }
    };

    Ok(DashboardTemplate {
        stats: DashboardStats::compute(&products, users.len()),
        listings: products.iter().map(ListingRow::from).collect(),
        users: users.iter().map(UserRow::from).collect(),
        statuses: ProductStatus::ALL,
        ctx,
    })
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Change a listing's status.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    let id = parse_id(&id)?;
    let status: ProductStatus = form
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Unknown status: {}", form.status)))?;

    state
        .backend()
        .update_product_status(&admin.access_token, id, status)
        .await?;

    let id = id.to_string();
    add_breadcrumb(
        "admin",
        "Listing status changed",
        Some(&[("product_id", &id), ("status", status.as_str())]),
    );
    set_flash(&session, format!("Listing marked {}", status.label())).await;
    Ok(Redirect::to("/admin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_stats_count_statuses_and_gmv() {
        let mut sold_a = product("iPhone", 30_000);
        sold_a.status = ProductStatus::Sold;
        let mut sold_b = product("iPad", 20_000);
        sold_b.status = ProductStatus::Sold;
        let mut held = product("Watch", 9_000);
        held.status = ProductStatus::Hold;
        let live = product("MacBook", 80_000);

        let stats = DashboardStats::compute(&[sold_a, sold_b, held, live], 4);
        assert_eq!(stats.users, 4);
        assert_eq!(stats.live, 1);
        assert_eq!(stats.hold, 1);
        assert_eq!(stats.sold, 2);
        assert_eq!(stats.gmv, "₹50000");
    }

    #[test]
    fn test_stats_empty() {
        let stats = DashboardStats::compute(&[], 0);
        assert_eq!(stats.gmv, "₹0");
    }

    #[test]
    fn test_stats_gmv_overflow_is_unavailable() {
        let mut sold_a = product("iPhone", 0);
        sold_a.status = ProductStatus::Sold;
        sold_a.price = Price::inr(rust_decimal::Decimal::MAX);
        let sold_b = sold_a.clone();

        let stats = DashboardStats::compute(&[sold_a, sold_b], 1);
        assert_eq!(stats.sold, 2);
        assert_eq!(stats.gmv, "Unavailable");
    }
}
