//! Profile page and visitor location.
//!
//! ```text
//! GET  /profile           - Saved products, own listings, location
//! POST /profile/location  - Set location from coordinates or manual entry
//! ```

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use thryft_core::{Product, SellerId};
use tower_sessions::Session;
use tracing::instrument;

use super::page::{PageContext, ProductCard, cards, safe_return_path, set_flash, store};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CurrentUser, session_keys};
use crate::services::geocoding::manual_location;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub ctx: PageContext,
    pub name: String,
    pub email: String,
    pub initial: String,
    pub avatar: Option<String>,
    pub saved: Vec<ProductCard>,
    pub listings: Vec<ProductCard>,
}

/// Listings created by this user, whether through the wizard or as seller.
fn own_listings<'a>(user: &CurrentUser, products: &'a [Product]) -> Vec<&'a Product> {
    let seller_id = SellerId::from(user.id);
    products
        .iter()
        .filter(|p| p.listed_by == Some(user.id) || p.seller.id == seller_id)
        .collect()
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ctx: PageContext,
) -> impl IntoResponse {
    let products = state.catalog().products().await;
    let saved = state.saved().saved(&user).await;

    ProfileTemplate {
        name: user.name.clone(),
        email: user
            .email
            .as_ref()
            .map(|e| e.as_str().to_string())
            .unwrap_or_default(),
        initial: user.initial(),
        avatar: user.avatar.clone(),
        saved: cards(products.iter().filter(|p| saved.contains(p.id)), &saved),
        listings: cards(own_listings(&user, &products), &saved),
        ctx,
    }
}

/// Location form. Coordinates come from the browser; `manual` from the text box.
#[derive(Debug, Default, Deserialize)]
pub struct LocationForm {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    #[serde(default)]
    pub manual: String,
    pub return_to: Option<String>,
}

/// Resolve and store the visitor's location.
#[instrument(skip_all)]
pub async fn update_location(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    session: Session,
    Form(form): Form<LocationForm>,
) -> Result<Redirect> {
    let back = Redirect::to(&safe_return_path(form.return_to.as_deref()));

    let place = match (form.lat, form.lon) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
            state.geocoder().place_name(lat, lon).await
        }
        _ => match manual_location(&form.manual) {
            Ok(place) => place,
            Err(message) => {
                set_flash(&session, message).await;
                return Ok(back);
            }
        },
    };

    store(&session, session_keys::LOCATION, &place).await?;

    if let Some(user) = user
        && let Err(e) = state
            .backend()
            .update_location(&user.access_token, user.id, &place)
            .await
    {
        tracing::warn!(error = %e, "Failed to save location to profile");
    }

    tracing::debug!(%place, "Location set");
    Ok(back)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::product;
    use thryft_core::UserId;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::random(),
            email: None,
            name: "Kiran".to_string(),
            avatar: None,
            access_token: "token".to_string(),
        }
    }

    #[test]
    fn test_own_listings_by_listed_by_or_seller() {
        let me = user();
        let mut mine = product("iPhone", 100);
        mine.listed_by = Some(me.id);
        let mut as_seller = product("iPad", 200);
        as_seller.seller.id = SellerId::from(me.id);
        let other = product("Watch", 300);

        let products = vec![mine, as_seller, other];
        let own = own_listings(&me, &products);
        assert_eq!(own.len(), 2);
        assert!(own.iter().all(|p| p.category != "Watch"));
    }
}
