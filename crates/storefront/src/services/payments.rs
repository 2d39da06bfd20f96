//! Razorpay standard checkout handoff.
//!
//! The server builds the widget options the browser opens and verifies the
//! signature the widget hands back on success. Order creation stays with the
//! widget; there is no server-to-server payment API call.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use thryft_core::{Email, Price};

use crate::cart::Cart;
use crate::config::PaymentConfig;

type HmacSha256 = Hmac<Sha256>;

/// Widget script loaded on the checkout page.
pub const CHECKOUT_SCRIPT_URL: &str = "https://checkout.razorpay.com/v1/checkout.js";

const CURRENCY: &str = "INR";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    #[error("payment key not configured")]
    NotConfigured,

    #[error("Payment cancelled")]
    Cancelled,

    #[error("payment signature does not match")]
    InvalidSignature,

    #[error("amount cannot be charged")]
    AmountOutOfRange,

    #[error("cart is empty")]
    EmptyCart,
}

/// Buyer details collected on the checkout page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutContact {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Options passed to `new Razorpay(options)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutOptions {
    pub key: String,
    /// Amount in paise.
    pub amount: u64,
    pub currency: &'static str,
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// What the widget resolves with.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentResult {
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
}

/// Payment handoff service.
#[derive(Clone)]
pub struct Payments {
    key_id: Option<String>,
    key_secret: Option<SecretString>,
    merchant_name: String,
}

impl Payments {
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            merchant_name: config.merchant_name.clone(),
        }
    }

    /// Whether a publishable key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.key_id.is_some()
    }

    /// Build widget options for a cart.
    pub fn checkout_options(
        &self,
        cart: &Cart,
        contact: &CheckoutContact,
        email: &Email,
    ) -> Result<CheckoutOptions, PaymentError> {
        let key = self.key_id.clone().ok_or(PaymentError::NotConfigured)?;
        if cart.is_empty() {
            return Err(PaymentError::EmptyCart);
        }

        Ok(CheckoutOptions {
            key,
            amount: amount_in_paise(
                cart.totals()
                    .ok_or(PaymentError::AmountOutOfRange)?
                    .total,
            )?,
            currency: CURRENCY,
            name: self.merchant_name.clone(),
            description: describe(cart),
            prefill: Prefill {
                name: contact.name.trim().to_string(),
                email: email.as_str().to_string(),
                contact: contact.phone.trim().to_string(),
            },
        })
    }

    /// Check a widget result.
    ///
    /// The signature is verified only when an order id, a signature and a key
    /// secret are all present.
    pub fn verify(&self, result: &PaymentResult) -> Result<(), PaymentError> {
        if result.razorpay_payment_id.trim().is_empty() {
            return Err(PaymentError::Cancelled);
        }

        let (Some(order_id), Some(signature), Some(secret)) = (
            present(result.razorpay_order_id.as_ref()),
            present(result.razorpay_signature.as_ref()),
            self.key_secret.as_ref(),
        ) else {
            return Ok(());
        };

        verify_signature(
            secret.expose_secret(),
            order_id,
            &result.razorpay_payment_id,
            signature,
        )
    }
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.trim().is_empty())
}

/// `round(total × 100)` as whole paise.
pub fn amount_in_paise(total: Price) -> Result<u64, PaymentError> {
    total
        .minor_units()
        .and_then(|paise| u64::try_from(paise).ok())
        .filter(|paise| *paise > 0)
        .ok_or(PaymentError::AmountOutOfRange)
}

/// Product title for a single line, otherwise the item count.
fn describe(cart: &Cart) -> String {
    match cart.items() {
        [only] if only.quantity == 1 => only.product.title.clone(),
        _ => format!("{} items", cart.item_count()),
    }
}

/// HMAC-SHA256 over `order_id|payment_id`, hex encoded.
pub fn verify_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<(), PaymentError> {
    let expected = hex::decode(signature.trim()).map_err(|_| PaymentError::InvalidSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| PaymentError::InvalidSignature)?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| PaymentError::InvalidSignature)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use thryft_core::{CurrencyCode, Product};

    use super::*;
    use crate::catalog::tests::product;

    fn payments() -> Payments {
        Payments::new(&PaymentConfig {
            key_id: Some("rzp_test_key".to_string()),
            key_secret: Some(SecretString::from("payment_secret")),
            merchant_name: "Thryft".to_string(),
        })
    }

    fn sign(secret: &str, message: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    fn cart_with(products: &[(Product, u32)]) -> Cart {
        let mut cart = Cart::new();
        for (p, qty) in products {
            cart.add(p, *qty).unwrap();
        }
        cart
    }

    #[test]
    fn test_options_for_single_item() {
        let mut phone = product("iPhone", 42_999);
        phone.title = "iPhone 14".to_string();
        let cart = cart_with(&[(phone, 1)]);
        let email = Email::parse("buyer@example.com").unwrap();
        let contact = CheckoutContact {
            name: " Meera ".to_string(),
            phone: "9876543210".to_string(),
            ..Default::default()
        };

        let options = payments().checkout_options(&cart, &contact, &email).unwrap();
        assert_eq!(options.amount, 4_299_900);
        assert_eq!(options.currency, "INR");
        assert_eq!(options.description, "iPhone 14");
        assert_eq!(options.prefill.name, "Meera");
        assert_eq!(options.prefill.email, "buyer@example.com");
    }

    #[test]
    fn test_options_describe_item_count() {
        let cart = cart_with(&[(product("iPad", 100), 2), (product("Watch", 50), 1)]);
        let email = Email::parse("buyer@example.com").unwrap();
        let options = payments()
            .checkout_options(&cart, &CheckoutContact::default(), &email)
            .unwrap();
        assert_eq!(options.description, "3 items");
    }

    #[test]
    fn test_missing_key_is_reported() {
        let payments = Payments::new(&PaymentConfig::default());
        let cart = cart_with(&[(product("iPad", 100), 1)]);
        let email = Email::parse("buyer@example.com").unwrap();
        let err = payments
            .checkout_options(&cart, &CheckoutContact::default(), &email)
            .unwrap_err();
        assert_eq!(err, PaymentError::NotConfigured);
        assert_eq!(err.to_string(), "payment key not configured");
    }

    #[test]
    fn test_paise_rounding() {
        let total = Price::inr(Decimal::new(1_005, 3));
        assert_eq!(amount_in_paise(total).unwrap(), 101);
        assert_eq!(
            amount_in_paise(Price::zero(CurrencyCode::INR)),
            Err(PaymentError::AmountOutOfRange)
        );
    }

    #[test]
    fn test_unchargeable_amounts_are_errors() {
        let too_many_paise = Price::inr(Decimal::from_i128_with_scale(10_i128.pow(27), 0));
        assert_eq!(
            amount_in_paise(too_many_paise),
            Err(PaymentError::AmountOutOfRange)
        );
        assert_eq!(
            amount_in_paise(Price::inr(Decimal::MAX)),
            Err(PaymentError::AmountOutOfRange)
        );

        let mut gold = product("Watch", 0);
        gold.price = too_many_paise;
        let cart = cart_with(&[(gold, 1)]);
        let email = Email::parse("buyer@example.com").unwrap();
        assert_eq!(
            payments()
                .checkout_options(&cart, &CheckoutContact::default(), &email)
                .unwrap_err(),
            PaymentError::AmountOutOfRange
        );
    }

    #[test]
    fn test_signature_verification() {
        let signature = sign("payment_secret", "order_1|pay_1");
        assert!(verify_signature("payment_secret", "order_1", "pay_1", &signature).is_ok());
        assert_eq!(
            verify_signature("payment_secret", "order_1", "pay_2", &signature),
            Err(PaymentError::InvalidSignature)
        );
        assert_eq!(
            verify_signature("payment_secret", "order_1", "pay_1", "not-hex"),
            Err(PaymentError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_skips_signature_without_order() {
        let result = PaymentResult {
            razorpay_payment_id: "pay_1".to_string(),
            razorpay_order_id: None,
            razorpay_signature: Some("bogus".to_string()),
        };
        assert!(payments().verify(&result).is_ok());

        let tampered = PaymentResult {
            razorpay_order_id: Some("order_1".to_string()),
            ..result
        };
        assert_eq!(
            payments().verify(&tampered),
            Err(PaymentError::InvalidSignature)
        );
    }
}
