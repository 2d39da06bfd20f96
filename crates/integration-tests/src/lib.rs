//! Integration tests for the Thryft storefront.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p thryft-integration-tests
//! ```
//!
//! None of these tests need a running backend. The backend URL points at a
//! closed local port, so anything that reaches it fails fast.
//!
//! # Test Files
//!
//! - `listing_wizard` - wizard flow with the preview store
//! - `cart_checkout` - cart totals and payment verification
//! - `saved_toggle` - optimistic saved toggles and rollback
//! - `router` - routing, redirects and headers through the full app

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thryft_core::{
    Condition, Price, Product, ProductId, ProductStatus, Seller, SellerId, UserId,
};
use thryft_storefront::config::{
    BackendConfig, GeocodingConfig, PaymentConfig, SentryConfig, StorefrontConfig,
};
use thryft_storefront::models::CurrentUser;

/// Backend address that refuses connections.
pub const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9";

/// Configuration for an app that never reaches a real backend.
#[must_use]
#[allow(clippy::missing_panics_doc, clippy::unwrap_used)]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        backend: BackendConfig {
            url: UNREACHABLE_BACKEND.to_string(),
            anon_key: SecretString::from("anon"),
            storage_bucket: "product-images".to_string(),
            cache_ttl: Duration::from_secs(60),
        },
        payments: PaymentConfig::default(),
        geocoding: GeocodingConfig::default(),
        admin_emails: vec!["admin@thryft.in".to_string()],
        sentry: SentryConfig::default(),
    }
}

/// A live product priced in whole rupees.
#[must_use]
pub fn product(category: &str, price: i64, shipping: i64) -> Product {
    Product {
        id: ProductId::random(),
        title: format!("{category} in great shape"),
        price: Price::inr(Decimal::from(price)),
        original_price: None,
        images: vec![format!("https://cdn.example.com/{category}.jpg")],
        category: category.to_string(),
        subcategory: String::new(),
        brand: "Apple".to_string(),
        size: "256GB".to_string(),
        condition: Condition::GentlyUsed,
        era: Some("2022".to_string()),
        description: String::new(),
        seller: Seller {
            id: SellerId::random(),
            name: "Ananya".to_string(),
            username: "ananya".to_string(),
            avatar: String::new(),
            rating: 4.8,
            total_sales: 12,
            verified: true,
            response_time: "within an hour".to_string(),
            location: "Pune".to_string(),
        },
        status: ProductStatus::Live,
        listed_by: None,
        measurements: None,
        tags: Vec::new(),
        allow_offers: false,
        shipping_cost: Price::inr(Decimal::from(shipping)),
        local_pickup: false,
        created_at: Utc::now(),
        likes: 0,
        views: 0,
    }
}

/// A signed-in user with a dummy token.
#[must_use]
pub fn user() -> CurrentUser {
    CurrentUser {
        id: UserId::random(),
        email: None,
        name: "Rohan".to_string(),
        avatar: None,
        access_token: "test-token".to_string(),
    }
}
