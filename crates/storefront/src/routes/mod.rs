//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page
//! GET  /health                    - Liveness
//! GET  /health/ready              - Readiness (backend reachable)
//!
//! # Catalog
//! GET  /browse                    - Browse and search
//! GET  /product/{id}              - Product detail
//! POST /product/{id}/notify       - Hold notification sign-up
//! GET  /categories                - Category index
//! GET  /collections               - Redirect to /categories
//!
//! # Saved (JSON)
//! POST /saved/{id}/toggle         - Toggle saved
//!
//! # Sell (requires auth)
//! GET  /sell                      - Listing wizard
//! POST /sell/...                  - Wizard actions
//!
//! # Cart and checkout
//! GET  /cart                      - Cart page
//! POST /cart/add|update|remove|clear
//! GET  /checkout                  - Checkout page
//! POST /checkout                  - Payment widget options (JSON)
//! POST /checkout/complete|cancel
//!
//! # Account
//! GET  /profile                   - Profile (requires auth)
//! POST /profile/location          - Set location
//! GET  /admin                     - Admin dashboard (requires admin)
//! POST /admin/products/{id}/status
//!
//! # Auth
//! GET  /auth/login | /auth/google | /auth/callback
//! POST /auth/logout
//!
//! # Pages
//! GET  /about | /privacy | /terms
//! ```
//!
//! Mutating routes sit behind a per-IP rate limiter; page reads do not.

pub mod admin;
pub mod auth;
pub mod browse;
pub mod cart;
pub mod categories;
pub mod checkout;
pub mod home;
pub mod page;
pub mod pages;
pub mod products;
pub mod profile;
pub mod saved;
pub mod sell;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::middleware::{relaxed_rate_limiter, strict_rate_limiter};
use crate::state::AppState;
use crate::wizard::{MAX_IMAGE_BYTES, MAX_PHOTOS};

/// Multipart overhead on top of the photo bytes.
const UPLOAD_SLACK_BYTES: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/google", get(auth::start))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
        .route_layer(strict_rate_limiter())
        .route("/login", get(auth::login_page))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/browse", get(browse::index))
        .route("/product/{id}", get(products::show))
        .route("/categories", get(categories::index))
        .route("/collections", get(categories::collections_redirect))
        .route("/collections/{*rest}", get(categories::collections_redirect))
}

/// Create the sell routes router.
pub fn sell_routes() -> Router<AppState> {
    let actions = Router::new()
        .route("/category", post(sell::category))
        .route(
            "/photos",
            post(sell::upload_photos)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES * MAX_PHOTOS + UPLOAD_SLACK_BYTES)),
        )
        .route("/photos/{index}/remove", post(sell::remove_photo))
        .route("/details", post(sell::details))
        .route("/pricing", post(sell::pricing))
        .route("/continue", post(sell::advance))
        .route("/back", post(sell::back))
        .route("/publish", post(sell::publish_listing))
        .route("/reset", post(sell::reset))
        .route("/another", post(sell::another))
        .route_layer(relaxed_rate_limiter());

    Router::new()
        .route("/", get(sell::show))
        .route("/photos/preview/{handle}", get(sell::preview))
        .merge(actions)
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route_layer(relaxed_rate_limiter())
        .route("/", get(cart::show))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::start))
        .route("/complete", post(checkout::complete))
        .route("/cancel", post(checkout::cancel))
        .route_layer(strict_rate_limiter())
        .route("/", get(checkout::show))
}

/// Create the account routes router: saved, profile, hold notifications, admin.
pub fn account_routes() -> Router<AppState> {
    let mutations = Router::new()
        .route("/saved/{id}/toggle", post(saved::toggle))
        .route("/product/{id}/notify", post(products::notify))
        .route("/profile/location", post(profile::update_location))
        .route("/admin/products/{id}/status", post(admin::update_status))
        .route_layer(relaxed_rate_limiter());

    Router::new()
        .route("/profile", get(profile::show))
        .route("/admin", get(admin::dashboard))
        .merge(mutations)
}

/// Create the static page routes router.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/about", get(pages::about))
        .route("/privacy", get(pages::privacy))
        .route("/terms", get(pages::terms))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(catalog_routes())
        .merge(account_routes())
        .merge(page_routes())
        .nest("/sell", sell_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/auth", auth_routes())
        .fallback(pages::not_found)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the backend is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.backend().is_healthy().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
