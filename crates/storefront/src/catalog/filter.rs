//! Browse filters.

use rust_decimal::Decimal;
use serde::Deserialize;
use thryft_core::{Category, Condition, Product};

/// Era facet values on browse. "Older" matches any other recorded era.
pub const ERAS: &[&str] = &["2024", "2023", "2022", "2021", "2020", "Older"];

/// A labelled price band for the browse sidebar.
#[derive(Debug, Clone, Copy)]
pub struct PriceRange {
    pub label: &'static str,
    pub min: i64,
    pub max: Option<i64>,
}

pub const PRICE_RANGES: &[PriceRange] = &[
    PriceRange { label: "Under ₹20,000", min: 0, max: Some(20_000) },
    PriceRange { label: "₹20,000 - ₹40,000", min: 20_000, max: Some(40_000) },
    PriceRange { label: "₹40,000 - ₹60,000", min: 40_000, max: Some(60_000) },
    PriceRange { label: "₹60,000 - ₹80,000", min: 60_000, max: Some(80_000) },
    PriceRange { label: "Over ₹80,000", min: 80_000, max: None },
];

/// Raw browse query string. List values are comma-separated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowseQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub sizes: Option<String>,
    pub conditions: Option<String>,
    pub eras: Option<String>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
}

/// Parsed browse filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilter {
    /// `None` means All.
    pub category: Option<String>,
    pub query: Option<String>,
    pub sizes: Vec<String>,
    pub conditions: Vec<Condition>,
    pub eras: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl From<BrowseQuery> for BrowseFilter {
    fn from(query: BrowseQuery) -> Self {
        let category = query
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
            .map(|c| c.parse::<Category>().map_or(c, |known| known.name().to_string()));

        Self {
            category,
            query: query
                .q
                .map(|q| q.trim().to_lowercase())
                .filter(|q| !q.is_empty()),
            sizes: split_list(query.sizes.as_deref()),
            conditions: split_list(query.conditions.as_deref())
                .iter()
                .filter_map(|c| c.parse().ok())
                .collect(),
            eras: split_list(query.eras.as_deref()),
            min_price: query.min,
            max_price: query.max,
        }
    }
}

impl BrowseFilter {
    /// Whether any facet beyond the category is set.
    #[must_use]
    pub fn has_facets(&self) -> bool {
        self.query.is_some()
            || !self.sizes.is_empty()
            || !self.conditions.is_empty()
            || !self.eras.is_empty()
            || self.min_price.is_some()
            || self.max_price.is_some()
    }

    /// Whether a product passes every set facet.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category
            && product.category != *category
        {
            return false;
        }

        if let Some(query) = &self.query {
            let hit = product.title.to_lowercase().contains(query)
                || product.brand.to_lowercase().contains(query)
                || product.tags.iter().any(|t| t.to_lowercase().contains(query));
            if !hit {
                return false;
            }
        }

        if !self.sizes.is_empty() && !self.sizes.iter().any(|s| s.eq_ignore_ascii_case(&product.size)) {
            return false;
        }

        if !self.conditions.is_empty() && !self.conditions.contains(&product.condition) {
            return false;
        }

        if !self.eras.is_empty() && !self.eras.iter().any(|era| era_matches(era, product.era.as_deref())) {
            return false;
        }

        let amount = product.price.amount;
        if self.min_price.is_some_and(|min| amount < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| amount > max) {
            return false;
        }

        true
    }

    /// Products passing the filter, order preserved.
    #[must_use]
    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

fn era_matches(selected: &str, era: Option<&str>) -> bool {
    match era {
        Some(era) if selected == "Older" => !ERAS.contains(&era),
        Some(era) => era == selected,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use thryft_core::{Condition, Price};

    use super::*;
    use crate::catalog::tests::product;

    #[test]
    fn test_all_category_means_no_filter() {
        let filter = BrowseFilter::from(BrowseQuery {
            category: Some("All".to_string()),
            ..Default::default()
        });
        assert_eq!(filter.category, None);
        assert!(!filter.has_facets());
    }

    #[test]
    fn test_category_slug_normalized() {
        let filter = BrowseFilter::from(BrowseQuery {
            category: Some("macbook".to_string()),
            ..Default::default()
        });
        assert_eq!(filter.category.as_deref(), Some("MacBook"));
    }

    #[test]
    fn test_text_query_matches_title_brand_tags() {
        let mut p = product("iPhone", 30_000);
        p.tags = vec!["Unlocked".to_string()];
        let filter = |q: &str| BrowseFilter {
            query: Some(q.to_string()),
            ..Default::default()
        };
        assert!(filter("iphone").matches(&p));
        assert!(filter("apple").matches(&p));
        assert!(filter("unlocked").matches(&p));
        assert!(!filter("pixel").matches(&p));
    }

    #[test]
    fn test_facets_combine() {
        let mut p = product("iPhone", 30_000);
        p.size = "128GB".to_string();
        p.condition = Condition::Worn;
        p.era = Some("2019".to_string());

        let filter = BrowseFilter::from(BrowseQuery {
            sizes: Some("64GB, 128GB".to_string()),
            conditions: Some("worn,Like new".to_string()),
            eras: Some("Older".to_string()),
            min: Some(Decimal::from(20_000)),
            max: Some(Decimal::from(40_000)),
            ..Default::default()
        });
        assert!(filter.matches(&p));

        p.price = Price::inr(Decimal::from(45_000));
        assert!(!filter.matches(&p));
    }

    #[test]
    fn test_era_without_value_never_matches() {
        assert!(!era_matches("Older", None));
        assert!(era_matches("2021", Some("2021")));
        assert!(!era_matches("Older", Some("2021")));
    }
}
