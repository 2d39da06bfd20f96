//! Cache types for hosted data API responses.

use thryft_core::{Product, ProductId};

/// Cache key for product reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// The full feed, newest first.
    Products,
    /// A single product, `None` cached as a miss.
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Vec<Product>),
    Product(Option<Box<Product>>),
}
