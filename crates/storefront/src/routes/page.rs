//! Shared page context, view models and session helpers for route handlers.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Serialize, de::DeserializeOwned};
use thryft_core::{Product, ProductStatus};
use tower_sessions::Session;

use crate::cart::Cart;
use crate::error::AppError;
use crate::middleware::CspNonce;
use crate::models::{CurrentUser, session_keys};
use crate::saved::SavedSet;
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Read a session value, falling back to its default when missing or unreadable.
pub async fn load<T>(session: &Session, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    match session.get::<T>(key).await {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read session value");
            T::default()
        }
    }
}

/// Write a session value.
pub async fn store<T>(session: &Session, key: &str, value: &T) -> Result<(), AppError>
where
    T: Serialize + Send + Sync,
{
    session.insert(key, value).await?;
    Ok(())
}

/// Queue a one-shot message for the next rendered page.
pub async fn set_flash(session: &Session, message: impl Into<String>) {
    if let Err(e) = session.insert(session_keys::FLASH, message.into()).await {
        tracing::warn!(error = %e, "Failed to set flash message");
    }
}

async fn take_flash(session: &Session) -> Option<String> {
    session
        .remove::<String>(session_keys::FLASH)
        .await
        .ok()
        .flatten()
}

/// Only same-site paths are followed after sign-in.
#[must_use]
pub fn safe_return_path(path: Option<&str>) -> String {
    path.filter(|p| p.starts_with('/') && !p.starts_with("//") && !p.contains('\\'))
        .map_or_else(|| "/".to_string(), str::to_string)
}

// =============================================================================
// Page Context
// =============================================================================

/// Everything the base layout needs.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub is_admin: bool,
    pub cart_count: u32,
    pub location: Option<String>,
    pub flash: Option<String>,
    pub nonce: String,
}

impl PageContext {
    #[must_use]
    pub const fn signed_in(&self) -> bool {
        self.user.is_some()
    }
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;

        let Some(session) = parts.extensions.get::<Session>().cloned() else {
            return Ok(Self {
                nonce,
                ..Default::default()
            });
        };

        let user: Option<CurrentUser> = load(&session, session_keys::CURRENT_USER).await;
        let cart: Cart = load(&session, session_keys::CART).await;
        let location: Option<String> = load(&session, session_keys::LOCATION).await;

        let is_admin = user
            .as_ref()
            .and_then(|u| u.email.as_ref())
            .is_some_and(|email| state.config().is_admin_email(email.as_str()));

        Ok(Self {
            user,
            is_admin,
            cart_count: cart.item_count(),
            location,
            flash: take_flash(&session).await,
            nonce,
        })
    }
}

// =============================================================================
// View Models
// =============================================================================

/// Product tile used by every feed.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub price: String,
    pub original_price: Option<String>,
    pub discount: Option<u32>,
    pub image: Option<String>,
    pub size: String,
    pub condition: &'static str,
    pub status: ProductStatus,
    pub seller_name: String,
    pub saved: bool,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, saved: &SavedSet) -> Self {
        Self {
            id: product.id.to_string(),
            title: product.title.clone(),
            brand: product.brand.clone(),
            price: product.price.display(),
            original_price: product
                .discount_percent()
                .and(product.original_price)
                .map(|p| p.display()),
            discount: product.discount_percent(),
            image: product.cover_image().map(String::from),
            size: product.size.clone(),
            condition: product.condition.label(),
            status: product.status,
            seller_name: product.seller.name.clone(),
            saved: saved.contains(product.id),
        }
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        self.status.label()
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.status.is_purchasable()
    }
}

/// Cards for a list of products.
pub fn cards<'a, I>(products: I, saved: &SavedSet) -> Vec<ProductCard>
where
    I: IntoIterator<Item = &'a Product>,
{
    products
        .into_iter()
        .map(|p| ProductCard::new(p, saved))
        .collect()
}

/// Saved set for the signed-in user, empty otherwise.
pub async fn saved_for(state: &AppState, user: Option<&CurrentUser>) -> SavedSet {
    match user {
        Some(user) => state.saved().saved(user).await,
        None => SavedSet::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_safe_return_path() {
        assert_eq!(safe_return_path(Some("/profile")), "/profile");
        assert_eq!(safe_return_path(Some("//evil.example")), "/");
        assert_eq!(safe_return_path(Some("https://evil.example")), "/");
        assert_eq!(safe_return_path(Some("/\\evil.example")), "/");
        assert_eq!(safe_return_path(None), "/");
    }

    #[test]
    fn test_card_shows_discount_only_when_cheaper() {
        let mut p = product("iPhone", 699);
        p.original_price = Some(thryft_core::Price::inr(rust_decimal::Decimal::from(2999)));
        let card = ProductCard::new(&p, &SavedSet::default());
        assert_eq!(card.discount, Some(77));
        assert_eq!(card.original_price.as_deref(), Some("₹2999"));

        p.original_price = Some(p.price);
        let card = ProductCard::new(&p, &SavedSet::default());
        assert_eq!(card.discount, None);
        assert_eq!(card.original_price, None);
    }

    #[test]
    fn test_card_marks_saved() {
        let p = product("iPad", 100);
        let saved: SavedSet = [p.id].into_iter().collect();
        assert!(ProductCard::new(&p, &saved).saved);
        assert!(ProductCard::new(&p, &saved).is_live());
    }
}
