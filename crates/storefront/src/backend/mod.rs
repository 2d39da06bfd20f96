//! Hosted backend-as-a-service client.
//!
//! # Architecture
//!
//! - PostgREST-style REST data API for `products`, `sellers`, `users`,
//!   `saved_products` and `hold_notifications`
//! - Object storage for listing photos (public URLs)
//! - OAuth with PKCE for sign-in
//! - The hosted store is the source of truth; product reads are cached
//!   in-process via `moka` and invalidated by writes
//!
//! # Example
//!
//! ```rust,ignore
//! use thryft_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend);
//! let products = client.products().await?;
//! let one = client.product(products[0].id).await?;
//! ```

mod auth;
mod cache;
mod client;
pub mod rows;

pub use auth::{AuthSession, AuthUser, PkcePair, authorize_url};
pub use client::BackendClient;

use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The access token was rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}
