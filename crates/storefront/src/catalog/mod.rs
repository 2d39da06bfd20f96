//! Product catalog: read-side service over the backend client.
//!
//! Every read degrades to an empty result on failure. Pages render with no
//! products rather than an error when the backend is unreachable.

mod filter;

pub use filter::{BrowseFilter, BrowseQuery, ERAS, PRICE_RANGES, PriceRange};

use thryft_core::{Category, Product, ProductId};
use tracing::instrument;

use crate::backend::BackendClient;

/// Number of related products shown on a detail page.
pub const RELATED_LIMIT: usize = 4;

/// Product count for one category tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub name: String,
    pub slug: String,
    pub count: usize,
}

/// Read access to products.
#[derive(Clone)]
pub struct Catalog {
    backend: BackendClient,
}

impl Catalog {
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    /// All products, newest first. Empty on failure.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Vec<Product> {
        match self.backend.products().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load products");
                Vec::new()
            }
        }
    }

    /// A single product. `None` when missing or on failure.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Option<Product> {
        match self.backend.product(id).await {
            Ok(product) => product,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load product");
                None
            }
        }
    }
}

/// Counts for All and each known category.
#[must_use]
pub fn category_counts(products: &[Product]) -> Vec<CategoryCount> {
    let mut counts = vec![CategoryCount {
        name: "All".to_string(),
        slug: "all".to_string(),
        count: products.len(),
    }];
    counts.extend(Category::ALL.into_iter().map(|category| CategoryCount {
        name: category.name().to_string(),
        slug: category.slug().to_string(),
        count: products
            .iter()
            .filter(|p| p.category == category.name())
            .count(),
    }));
    counts
}

/// Up to [`RELATED_LIMIT`] other products in the same category.
#[must_use]
pub fn related<'a>(product: &Product, products: &'a [Product]) -> Vec<&'a Product> {
    products
        .iter()
        .filter(|p| p.id != product.id && p.category == product.category)
        .take(RELATED_LIMIT)
        .collect()
}
