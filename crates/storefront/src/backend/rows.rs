//! Row shapes of the hosted REST data API and their conversion into domain types.
//!
//! Rows are read loosely: nullable columns default, and unknown enum strings
//! fall back to a safe value instead of failing the whole feed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thryft_core::{
    Condition, Email, MeasurementUnit, Measurements, Price, Product, ProductId, ProductStatus,
    Seller, SellerId, UserId, UserProfile,
};

/// A row of the `products` table.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub size: String,
    pub condition: String,
    #[serde(default)]
    pub era: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub listed_by_uid: Option<UserId>,
    #[serde(default)]
    pub measurements: Option<MeasurementsRow>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub allow_offers: bool,
    #[serde(default)]
    pub shipping_cost: Decimal,
    #[serde(default)]
    pub local_pickup: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub views: i64,
}

/// The JSON `measurements` column.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MeasurementsRow {
    pub chest: Option<f32>,
    pub length: Option<f32>,
    pub waist: Option<f32>,
    pub inseam: Option<f32>,
    #[serde(default)]
    pub unit: MeasurementUnit,
}

impl From<MeasurementsRow> for Measurements {
    fn from(row: MeasurementsRow) -> Self {
        Self {
            chest: row.chest,
            length: row.length,
            waist: row.waist,
            inseam: row.inseam,
            unit: row.unit,
        }
    }
}

impl ProductRow {
    /// Join this row with its seller.
    #[must_use]
    pub fn into_product(self, seller: Seller) -> Product {
        let condition = self.condition.parse().unwrap_or_else(|_| {
            tracing::debug!(product_id = %self.id, condition = %self.condition, "Unknown condition");
            Condition::GentlyUsed
        });
        let status = self
            .status
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(ProductStatus::Live);

        Product {
            id: self.id,
            title: self.title,
            price: Price::inr(self.price),
            original_price: self.original_price.map(Price::inr),
            images: self.images.unwrap_or_default(),
            category: self.category,
            subcategory: self.subcategory.unwrap_or_default(),
            brand: self.brand,
            size: self.size,
            condition,
            era: self.era.filter(|e| !e.is_empty()),
            description: self.description,
            seller,
            status,
            listed_by: self.listed_by_uid,
            measurements: self.measurements.map(Measurements::from),
            tags: self.tags.unwrap_or_default(),
            allow_offers: self.allow_offers,
            shipping_cost: Price::inr(self.shipping_cost),
            local_pickup: self.local_pickup,
            created_at: self.created_at,
            likes: saturating_u32(self.likes),
            views: saturating_u32(self.views),
        }
    }
}

/// A row of the `sellers` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SellerRow {
    pub id: SellerId,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub total_sales: i64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub response_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<SellerRow> for Seller {
    fn from(row: SellerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            username: row.username,
            avatar: row.avatar.unwrap_or_default(),
            rating: row.rating,
            total_sales: saturating_u32(row.total_sales),
            verified: row.verified,
            response_time: row.response_time.unwrap_or_default(),
            location: row.location.unwrap_or_default(),
        }
    }
}

/// A row of the `users` table.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name.unwrap_or_default(),
            email: row.email.as_deref().and_then(|e| Email::parse(e).ok()),
            avatar: row.avatar,
            location: row.location,
        }
    }
}

/// A row of the `saved_products` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SavedRow {
    pub user_id: UserId,
    pub product_id: ProductId,
}

/// Insert payload for a new listing.
#[derive(Debug, Clone, Serialize)]
pub struct NewListing {
    pub seller_id: SellerId,
    pub listed_by_uid: UserId,
    pub title: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub images: Vec<String>,
    pub category: String,
    pub subcategory: Option<String>,
    pub brand: String,
    pub size: String,
    pub condition: &'static str,
    pub era: Option<String>,
    pub description: String,
    pub tags: Vec<String>,
    pub allow_offers: bool,
    pub shipping_cost: Decimal,
    pub local_pickup: bool,
    pub status: &'static str,
}

/// Upsert payload for the seller row of a signed-in user.
#[derive(Debug, Clone, Serialize)]
pub struct SellerUpsert {
    pub id: SellerId,
    pub name: String,
    pub username: String,
    pub avatar: Option<String>,
    pub location: Option<String>,
}

/// Upsert payload for a profile row, written on sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileUpsert {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

/// Insert payload for a hold notification sign-up.
#[derive(Debug, Clone, Serialize)]
pub struct HoldNotificationRow {
    pub product_id: ProductId,
    pub email: String,
}

/// Row returned by inserts that select only the id.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IdRow {
    pub id: ProductId,
}

fn saturating_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
