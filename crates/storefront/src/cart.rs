//! Session cart.
//!
//! The cart is a list of product snapshots with quantities, stored in the
//! visitor's session. It is never persisted remotely and disappears with the
//! session. Totals are always derived, never stored.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use thryft_core::{CurrencyCode, Price, Product, ProductId, ProductStatus};

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Only live products can be bought.
    #[error("This item is {} and can't be added to the cart", .0.label().to_lowercase())]
    NotPurchasable(ProductStatus),

    #[error("Item is not in the cart")]
    NotInCart(ProductId),

    /// The change would push a total past what a price can hold.
    #[error("That quantity is too large")]
    TotalOutOfRange,
}

/// The slice of a product the cart needs, captured when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub shipping_cost: Price,
    pub image: Option<String>,
    pub size: String,
    pub seller_name: String,
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            shipping_cost: product.shipping_cost,
            image: product.cover_image().map(String::from),
            size: product.size.clone(),
            seller_name: product.seller.name.clone(),
        }
    }
}

/// One cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: CartProduct,
    pub quantity: u32,
}

impl CartItem {
    #[must_use]
    pub fn line_price(&self) -> Option<Price> {
        self.product.price.times(self.quantity)
    }

    #[must_use]
    pub fn line_shipping(&self) -> Option<Price> {
        self.product.shipping_cost.times(self.quantity)
    }
}

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Σ price × quantity
    pub subtotal: Price,
    /// Σ shipping cost × quantity
    pub shipping: Price,
    /// subtotal + shipping
    pub total: Price,
    /// Σ quantity
    pub item_count: u32,
}

/// A visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a product is already in the cart.
    #[must_use]
    pub fn contains(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.product.id == id)
    }

    /// Add a product, or bump its quantity when already present.
    ///
    /// A quantity of zero is treated as one.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), CartError> {
        if !product.is_purchasable() {
            return Err(CartError::NotPurchasable(product.status));
        }
        let quantity = quantity.max(1);

        let mut next = self.clone();
        match next.items.iter_mut().find(|item| item.product.id == product.id) {
            Some(item) => item.quantity = item.quantity.saturating_add(quantity),
            None => next.items.push(CartItem {
                product: CartProduct::from(product),
                quantity,
            }),
        }
        self.replace_with(next)
    }

    /// Commit a changed cart only if its totals are computable.
    fn replace_with(&mut self, next: Self) -> Result<(), CartError> {
        if next.totals().is_none() {
            return Err(CartError::TotalOutOfRange);
        }
        *self = next;
        Ok(())
    }

    /// Remove a line. Returns whether anything was removed.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.product.id != id);
        self.items.len() != before
    }

    /// Set a line's quantity. Zero removes the line.
    pub fn set_quantity(&mut self, id: ProductId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return if self.remove(id) {
                Ok(())
            } else {
                Err(CartError::NotInCart(id))
            };
        }

        let mut next = self.clone();
        let item = next
            .items
            .iter_mut()
            .find(|item| item.product.id == id)
            .ok_or(CartError::NotInCart(id))?;
        item.quantity = quantity;
        self.replace_with(next)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Σ quantity.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Derived totals. `None` if any sum overflows, which `add` and
    /// `set_quantity` never let a cart reach.
    #[must_use]
    pub fn totals(&self) -> Option<CartTotals> {
        let currency = self
            .items
            .first()
            .map_or(CurrencyCode::INR, |item| item.product.price.currency_code);
        let lines = |line: fn(&CartItem) -> Option<Price>| {
            self.items
                .iter()
                .map(line)
                .collect::<Option<Vec<_>>>()
                .and_then(|prices| Price::sum(currency, prices))
        };
        let subtotal = lines(CartItem::line_price)?;
        let shipping = lines(CartItem::line_shipping)?;

        Some(CartTotals {
            subtotal,
            shipping,
            total: subtotal.checked_add(shipping)?,
            item_count: self.item_count(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::catalog::tests::product;

    fn priced(price: i64, shipping: i64) -> Product {
        let mut p = product("Accessories", price);
        p.shipping_cost = Price::inr(Decimal::from(shipping));
        p
    }

    fn inr(v: i64) -> Price {
        Price::inr(Decimal::from(v))
    }

    #[test]
    fn test_totals() {
        let a = priced(100, 10);
        let b = priced(50, 0);
        let mut cart = Cart::new();
        cart.add(&a, 2).unwrap();
        cart.add(&b, 1).unwrap();

        let totals = cart.totals().unwrap();
        assert_eq!(totals.subtotal, inr(250));
        assert_eq!(totals.shipping, inr(20));
        assert_eq!(totals.total, inr(270));
        assert_eq!(totals.item_count, 3);
    }

    #[test]
    fn test_add_existing_increments() {
        let a = priced(100, 0);
        let mut cart = Cart::new();
        cart.add(&a, 1).unwrap();
        cart.add(&a, 0).unwrap();
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_only_live_products() {
        let mut held = priced(100, 0);
        held.status = ProductStatus::Hold;
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(&held, 1),
            Err(CartError::NotPurchasable(ProductStatus::Hold))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let a = priced(100, 0);
        let mut cart = Cart::new();
        cart.add(&a, 3).unwrap();
        cart.set_quantity(a.id, 5).unwrap();
        assert_eq!(cart.item_count(), 5);
        cart.set_quantity(a.id, 0).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.set_quantity(a.id, 1), Err(CartError::NotInCart(a.id)));
    }

    #[test]
    fn test_remove_and_clear() {
        let a = priced(100, 0);
        let b = priced(200, 0);
        let mut cart = Cart::new();
        cart.add(&a, 1).unwrap();
        cart.add(&b, 1).unwrap();
        assert!(cart.remove(a.id));
        assert!(!cart.remove(a.id));
        assert!(cart.contains(b.id));
        cart.clear();
        assert_eq!(cart.totals().unwrap().total, inr(0));
    }

    #[test]
    fn test_overflowing_quantity_is_rejected() {
        let mut pricey = priced(0, 0);
        pricey.price = Price::inr(Decimal::MAX / Decimal::from(2));
        let mut cart = Cart::new();
        cart.add(&pricey, 1).unwrap();

        assert_eq!(cart.add(&pricey, 5), Err(CartError::TotalOutOfRange));
        assert_eq!(
            cart.set_quantity(pricey.id, 3),
            Err(CartError::TotalOutOfRange)
        );
        assert_eq!(cart.item_count(), 1);
        assert!(cart.totals().is_some());
    }

    #[test]
    fn test_not_purchasable_message() {
        let err = CartError::NotPurchasable(ProductStatus::Sold);
        assert_eq!(err.to_string(), "This item is sold and can't be added to the cart");
    }
}
