//! Marketplace entities as the storefront sees them.
//!
//! These are view-side shapes, already joined (a product embeds its seller).
//! The hosted store owns the rows; the storefront only reads and writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, Condition, Email, Price, ProductId, ProductStatus, SellerId, UserId};

/// A product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub original_price: Option<Price>,
    pub images: Vec<String>,
    /// Raw category value. Rows may carry categories this build doesn't know.
    pub category: String,
    pub subcategory: String,
    pub brand: String,
    pub size: String,
    pub condition: Condition,
    pub era: Option<String>,
    pub description: String,
    pub seller: Seller,
    pub status: ProductStatus,
    pub listed_by: Option<UserId>,
    pub measurements: Option<Measurements>,
    pub tags: Vec<String>,
    pub allow_offers: bool,
    pub shipping_cost: Price,
    pub local_pickup: bool,
    pub created_at: DateTime<Utc>,
    pub likes: u32,
    pub views: u32,
}

impl Product {
    /// The category, if it is one this build has a schema for.
    #[must_use]
    pub fn known_category(&self) -> Option<Category> {
        self.category.parse().ok()
    }

    /// Discount against the original price, in whole percent.
    #[must_use]
    pub fn discount_percent(&self) -> Option<u32> {
        self.original_price
            .as_ref()
            .and_then(|original| self.price.discount_percent(original))
    }

    /// First image, used as the cover.
    #[must_use]
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.status.is_purchasable()
    }
}

/// Public seller profile embedded in a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub name: String,
    pub username: String,
    pub avatar: String,
    pub rating: f32,
    pub total_sales: u32,
    pub verified: bool,
    pub response_time: String,
    pub location: String,
}

/// Garment-style measurements. Optional on every listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub chest: Option<f32>,
    pub length: Option<f32>,
    pub waist: Option<f32>,
    pub inseam: Option<f32>,
    pub unit: MeasurementUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    #[default]
    Cm,
    In,
}

/// A signed-in user's profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Option<Email>,
    pub avatar: Option<String>,
    pub location: Option<String>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal::Decimal;

    use super::*;

    pub fn seller() -> Seller {
        Seller {
            id: SellerId::random(),
            name: "Asha".to_string(),
            username: "asha".to_string(),
            avatar: String::new(),
            rating: 4.8,
            total_sales: 12,
            verified: true,
            response_time: "within an hour".to_string(),
            location: "Pune".to_string(),
        }
    }

    pub fn product(price: i64, original: Option<i64>) -> Product {
        Product {
            id: ProductId::random(),
            title: "iPhone 13".to_string(),
            price: Price::inr(Decimal::from(price)),
            original_price: original.map(|o| Price::inr(Decimal::from(o))),
            images: vec!["https://cdn.example/1.jpg".to_string()],
            category: "iPhone".to_string(),
            subcategory: String::new(),
            brand: "Apple".to_string(),
            size: "128GB".to_string(),
            condition: Condition::LikeNew,
            era: None,
            description: String::new(),
            seller: seller(),
            status: ProductStatus::Live,
            listed_by: None,
            measurements: None,
            tags: Vec::new(),
            allow_offers: true,
            shipping_cost: Price::inr(Decimal::ZERO),
            local_pickup: false,
            created_at: Utc::now(),
            likes: 0,
            views: 0,
        }
    }
}
