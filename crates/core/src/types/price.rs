//! Type-safe price representation using decimal arithmetic.
//!
//! Listings are priced in whole rupees but the type keeps full decimal
//! precision so shipping and fee arithmetic never goes through floats.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (rupees, not paise).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in Indian rupees.
    #[must_use]
    pub const fn inr(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::INR)
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Multiply by a line quantity. `None` on overflow.
    #[must_use]
    pub fn times(self, quantity: u32) -> Option<Self> {
        self.amount
            .checked_mul(Decimal::from(quantity))
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Add another price in the same currency. `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        debug_assert_eq!(self.currency_code, rhs.currency_code, "currency mismatch");
        self.amount
            .checked_add(rhs.amount)
            .map(|amount| Self::new(amount, self.currency_code))
    }

    /// Sum prices, starting from zero in `currency_code`. `None` on overflow.
    pub fn sum<I>(currency_code: CurrencyCode, prices: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        prices
            .into_iter()
            .try_fold(Self::zero(currency_code), Self::checked_add)
    }

    /// Percentage discount relative to an original (compare-at) price.
    ///
    /// Computed as `round((original - self) / original * 100)` with halves
    /// rounded away from zero. Returns `None` unless the original price is
    /// strictly higher than this one.
    ///
    /// ```
    /// use rust_decimal::Decimal;
    /// use thryft_core::Price;
    ///
    /// let price = Price::inr(Decimal::from(699));
    /// let original = Price::inr(Decimal::from(2999));
    /// assert_eq!(price.discount_percent(&original), Some(77));
    /// ```
    #[must_use]
    pub fn discount_percent(&self, original: &Self) -> Option<u32> {
        if original.amount <= self.amount || original.amount <= Decimal::ZERO {
            return None;
        }
        let ratio = (original.amount - self.amount) / original.amount * Decimal::ONE_HUNDRED;
        let rounded = ratio.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        rounded.to_u32()
    }

    /// Fraction of this price, rounded to a whole unit (half away from zero).
    ///
    /// `percent` is expressed in percent, e.g. `7` for 7%. `None` on overflow.
    #[must_use]
    pub fn whole_percent(&self, percent: Decimal) -> Option<Self> {
        let value = self
            .amount
            .checked_mul(percent)?
            .checked_div(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Some(Self::new(value, self.currency_code))
    }

    /// Amount in minor units (paise for INR), rounded half away from zero.
    ///
    /// Returns `None` if the value overflows or does not fit in an `i64`.
    #[must_use]
    pub fn minor_units(&self) -> Option<i64> {
        self.amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
    }

    /// Format for display, e.g. `₹2999` or `₹149.50`.
    #[must_use]
    pub fn display(&self) -> String {
        let amount = self.amount.round_dp(2).normalize();
        if amount.scale() == 0 {
            format!("{}{amount}", self.currency_code.symbol())
        } else {
            format!("{}{:.2}", self.currency_code.symbol(), amount)
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum CurrencyCode {
    #[default]
    INR,
    USD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::INR => "₹",
            Self::USD => "$",
        }
    }

    /// Three-letter code as sent to payment providers.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::INR => "INR",
            Self::USD => "USD",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inr(v: i64) -> Price {
        Price::inr(Decimal::from(v))
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(inr(699).discount_percent(&inr(2999)), Some(77));
        assert_eq!(inr(50).discount_percent(&inr(100)), Some(50));
        // 1/8 = 12.5% rounds away from zero
        assert_eq!(inr(700).discount_percent(&inr(800)), Some(13));
    }

    #[test]
    fn test_no_discount_when_original_not_higher() {
        assert_eq!(inr(100).discount_percent(&inr(100)), None);
        assert_eq!(inr(150).discount_percent(&inr(100)), None);
        assert_eq!(inr(0).discount_percent(&inr(0)), None);
    }

    #[test]
    fn test_times_and_sum() {
        let doubled = inr(100).times(2);
        assert_eq!(doubled, Some(inr(200)));
        let total = Price::sum(CurrencyCode::INR, doubled.into_iter().chain([inr(50)]));
        assert_eq!(total, Some(inr(250)));
        assert_eq!(Price::sum(CurrencyCode::INR, []), Some(inr(0)));
    }

    #[test]
    fn test_whole_percent() {
        assert_eq!(inr(1000).whole_percent(Decimal::from(7)), Some(inr(70)));
        // 7% of 150 = 10.5 -> 11
        assert_eq!(inr(150).whole_percent(Decimal::from(7)), Some(inr(11)));
        assert_eq!(inr(150).whole_percent(Decimal::from(93)), Some(inr(140)));
    }

    #[test]
    fn test_minor_units() {
        assert_eq!(inr(270).minor_units(), Some(27_000));
        assert_eq!(
            Price::inr(Decimal::new(14_955, 2)).minor_units(),
            Some(14_955)
        );
    }

    #[test]
    fn test_overflow_is_none_not_panic() {
        let huge = Price::inr(Decimal::MAX);
        assert_eq!(huge.times(2), None);
        assert_eq!(huge.whole_percent(Decimal::from(93)), None);
        assert_eq!(huge.minor_units(), None);
        assert_eq!(huge.checked_add(inr(1)), None);
        assert_eq!(Price::sum(CurrencyCode::INR, [huge, huge]), None);

        // Fits in Decimal but not in i64 paise
        let large = Price::inr(Decimal::from_i128_with_scale(10_i128.pow(27), 0));
        assert_eq!(large.minor_units(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(inr(2999).display(), "₹2999");
        assert_eq!(Price::inr(Decimal::new(1495, 1)).display(), "₹149.50");
        assert_eq!(Price::inr(Decimal::new(50000, 2)).to_string(), "₹500");
    }
}
