//! Listing form fields, validation limits and the publishable draft.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thryft_core::{Category, Condition, Price, ProductStatus, SellerId, UserId};

use super::{PhotoRef, WizardError};
use crate::backend::rows::NewListing;

pub const MAX_TITLE_CHARS: usize = 80;
pub const MAX_DESCRIPTION_CHARS: usize = 800;

/// Largest price, original price or shipping cost a listing accepts, in rupees.
pub const MAX_PRICE_RUPEES: i64 = 10_000_000;

/// Era choices offered when listing. Browse facets use years instead.
pub const LISTING_ERAS: &[&str] = &["2020s", "2010s", "2000s", "90s", "80s", "70s", "Vintage"];

/// Platform fee in percent of the listing price.
pub const PLATFORM_FEE_PERCENT: u32 = 7;

/// Brand used when the seller leaves it blank.
pub const DEFAULT_BRAND: &str = "Apple";

/// Fields collected on the Details step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetails {
    pub title: String,
    pub brand: String,
    pub size: String,
    pub condition: Option<Condition>,
    pub era: String,
    pub description: String,
    /// Category-specific extras by field key. Empty values are not stored.
    pub extras: BTreeMap<String, String>,
}

impl ListingDetails {
    /// Title, size and condition are all present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.size.trim().is_empty() && self.condition.is_some()
    }

    /// Validate and normalize against a category schema.
    pub(super) fn validated(mut self, category: Option<Category>) -> Result<Self, WizardError> {
        self.title = self.title.trim().to_string();
        self.brand = self.brand.trim().to_string();
        self.size = self.size.trim().to_string();
        self.era = self.era.trim().to_string();
        self.description = self.description.trim().to_string();

        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(WizardError::TitleTooLong {
                max: MAX_TITLE_CHARS,
            });
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(WizardError::DescriptionTooLong {
                max: MAX_DESCRIPTION_CHARS,
            });
        }

        if !self.era.is_empty() && !LISTING_ERAS.contains(&self.era.as_str()) {
            return Err(WizardError::InvalidOption {
                field: "era".to_string(),
                value: self.era,
            });
        }

        let schema = category.map(Category::schema);

        if let Some(schema) = schema
            && !self.size.is_empty()
            && !schema.size_options.contains(&self.size.as_str())
        {
            return Err(WizardError::InvalidOption {
                field: schema.size_label.to_string(),
                value: self.size,
            });
        }

        let mut extras = BTreeMap::new();
        for (key, value) in self.extras {
            let value = value.trim().to_string();
            if value.is_empty() {
                continue;
            }
            let field = schema
                .and_then(|s| s.field(&key))
                .ok_or_else(|| WizardError::UnknownExtraField(key.clone()))?;
            if !field.accepts(&value) {
                return Err(WizardError::InvalidOption {
                    field: field.label.to_string(),
                    value,
                });
            }
            extras.insert(key, value);
        }
        self.extras = extras;

        Ok(self)
    }

    /// Extras rendered as `Label: value` tags, in schema order.
    #[must_use]
    pub fn extra_tags(&self, category: Category) -> Vec<String> {
        category
            .schema()
            .extra_fields
            .iter()
            .filter_map(|field| {
                self.extras
                    .get(field.key)
                    .map(|value| format!("{}: {value}", field.label))
            })
            .collect()
    }
}

/// Fields collected on the Pricing step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingPricing {
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub allow_offers: bool,
    pub shipping_included: bool,
    pub shipping_cost: Decimal,
    pub local_pickup: bool,
}

impl Default for ListingPricing {
    fn default() -> Self {
        Self {
            price: None,
            original_price: None,
            allow_offers: true,
            shipping_included: false,
            shipping_cost: Decimal::ZERO,
            local_pickup: false,
        }
    }
}

impl ListingPricing {
    /// Price is set and strictly positive.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.price.is_some_and(|p| p > Decimal::ZERO)
    }

    pub(super) fn validated(mut self) -> Result<Self, WizardError> {
        let negative = |v: Option<Decimal>| v.is_some_and(|v| v < Decimal::ZERO);
        if negative(self.price) || negative(self.original_price) || self.shipping_cost < Decimal::ZERO {
            return Err(WizardError::NegativeAmount);
        }
        let max = Decimal::from(MAX_PRICE_RUPEES);
        let too_large = |v: Option<Decimal>| v.is_some_and(|v| v > max);
        if too_large(self.price) || too_large(self.original_price) || self.shipping_cost > max {
            return Err(WizardError::AmountTooLarge {
                max: MAX_PRICE_RUPEES,
            });
        }
        if self.shipping_included {
            self.shipping_cost = Decimal::ZERO;
        }
        Ok(self)
    }

    /// Fee split for the current price.
    #[must_use]
    pub fn fees(&self) -> Option<FeeBreakdown> {
        self.price
            .filter(|p| *p > Decimal::ZERO)
            .and_then(|p| FeeBreakdown::for_price(Price::inr(p)))
    }
}

/// What the platform keeps and what the seller earns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub price: Price,
    pub platform_fee: Price,
    pub seller_earns: Price,
}

impl FeeBreakdown {
    /// Fee and earnings are each rounded to whole rupees. `None` if the
    /// price is too large to split.
    #[must_use]
    pub fn for_price(price: Price) -> Option<Self> {
        let fee_percent = Decimal::from(PLATFORM_FEE_PERCENT);
        Some(Self {
            price,
            platform_fee: price.whole_percent(fee_percent)?,
            seller_earns: price.whole_percent(Decimal::ONE_HUNDRED - fee_percent)?,
        })
    }
}

/// A fully validated listing ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDraft {
    pub category: Category,
    pub photos: Vec<PhotoRef>,
    pub details: ListingDetails,
    pub price: Decimal,
    pub pricing: ListingPricing,
}

impl ListingDraft {
    /// Build the insert payload once photos are uploaded.
    #[must_use]
    pub fn into_new_listing(self, user_id: UserId, image_urls: Vec<String>) -> NewListing {
        let tags = self.details.extra_tags(self.category);
        let condition = self.details.condition.unwrap_or(Condition::GentlyUsed);
        let brand = if self.details.brand.is_empty() {
            DEFAULT_BRAND.to_string()
        } else {
            self.details.brand
        };

        NewListing {
            seller_id: SellerId::from(user_id),
            listed_by_uid: user_id,
            title: self.details.title,
            price: self.price,
            original_price: self.pricing.original_price.filter(|o| *o > self.price),
            images: image_urls,
            category: self.category.name().to_string(),
            subcategory: None,
            brand,
            size: self.details.size,
            condition: condition.as_str(),
            era: Some(self.details.era).filter(|e| !e.is_empty()),
            description: self.details.description,
            tags,
            allow_offers: self.pricing.allow_offers,
            shipping_cost: self.pricing.shipping_cost,
            local_pickup: self.pricing.local_pickup,
            status: ProductStatus::Live.as_str(),
        }
    }
}
