//! Cart totals through to payment verification.

#![allow(clippy::unwrap_used)]

use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use secrecy::SecretString;
use sha2::Sha256;
use thryft_core::{Email, Price, ProductStatus};
use thryft_integration_tests::product;
use thryft_storefront::cart::{Cart, CartError};
use thryft_storefront::config::PaymentConfig;
use thryft_storefront::services::payments::{CheckoutContact, PaymentResult};
use thryft_storefront::services::{PaymentError, Payments};

const SECRET: &str = "rzp_test_secret";

fn inr(v: i64) -> Price {
    Price::inr(Decimal::from(v))
}

fn payments() -> Payments {
    Payments::new(&PaymentConfig {
        key_id: Some("rzp_test_key".to_string()),
        key_secret: Some(SecretString::from(SECRET)),
        merchant_name: "Thryft".to_string(),
    })
}

fn sign(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(format!("{order_id}|{payment_id}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn result(payment_id: &str, order_id: Option<&str>, signature: Option<String>) -> PaymentResult {
    PaymentResult {
        razorpay_payment_id: payment_id.to_string(),
        razorpay_order_id: order_id.map(String::from),
        razorpay_signature: signature,
    }
}

fn contact() -> CheckoutContact {
    CheckoutContact {
        name: " Rohan Mehta ".to_string(),
        email: String::new(),
        phone: "9876543210".to_string(),
        address: "12 MG Road, Pune".to_string(),
    }
}

#[test]
fn test_totals_include_shipping_per_unit() {
    let phone = product("iPhone", 45_000, 150);
    let case = product("Accessories", 1_200, 0);

    let mut cart = Cart::new();
    cart.add(&phone, 1).unwrap();
    cart.add(&case, 2).unwrap();
    cart.add(&case, 1).unwrap();

    let totals = cart.totals().unwrap();
    assert_eq!(totals.item_count, 4);
    assert_eq!(totals.subtotal, inr(48_600));
    assert_eq!(totals.shipping, inr(150));
    assert_eq!(totals.total, inr(48_750));
}

#[test]
fn test_quantity_that_overflows_totals_is_rejected() {
    let mut watch = product("Watch", 0, 0);
    watch.price = Price::inr(Decimal::MAX);

    let mut cart = Cart::new();
    cart.add(&watch, 1).unwrap();
    assert_eq!(cart.add(&watch, 2), Err(CartError::TotalOutOfRange));
    assert_eq!(cart.item_count(), 1);

    let email = Email::parse("rohan@example.com").unwrap();
    assert_eq!(
        payments()
            .checkout_options(&cart, &contact(), &email)
            .unwrap_err(),
        PaymentError::AmountOutOfRange
    );
}

#[test]
fn test_zero_quantity_removes_line() {
    let watch = product("Watch", 18_000, 99);
    let mut cart = Cart::new();
    cart.add(&watch, 2).unwrap();

    cart.set_quantity(watch.id, 0).unwrap();
    assert!(cart.is_empty());
    assert_eq!(
        cart.set_quantity(watch.id, 1),
        Err(CartError::NotInCart(watch.id))
    );
}

#[test]
fn test_only_live_products_can_be_added() {
    let mut sold = product("MacBook", 90_000, 0);
    sold.status = ProductStatus::Sold;
    let mut held = product("iPad", 30_000, 0);
    held.status = ProductStatus::Hold;

    let mut cart = Cart::new();
    assert_eq!(
        cart.add(&sold, 1),
        Err(CartError::NotPurchasable(ProductStatus::Sold))
    );
    assert_eq!(
        cart.add(&held, 1),
        Err(CartError::NotPurchasable(ProductStatus::Hold))
    );
    assert!(cart.is_empty());
}

#[test]
fn test_checkout_options_charge_total_in_paise() {
    let mut cart = Cart::new();
    cart.add(&product("iPhone", 45_000, 150), 1).unwrap();
    let email = Email::parse("rohan@example.com").unwrap();

    let options = payments()
        .checkout_options(&cart, &contact(), &email)
        .unwrap();
    assert_eq!(options.amount, 4_515_000);
    assert_eq!(options.currency, "INR");
    assert_eq!(options.key, "rzp_test_key");
    assert_eq!(options.prefill.name, "Rohan Mehta");
    assert_eq!(options.prefill.email, "rohan@example.com");
    assert_eq!(options.description, "iPhone in great shape");
}

#[test]
fn test_empty_cart_cannot_check_out() {
    let email = Email::parse("rohan@example.com").unwrap();
    assert_eq!(
        payments()
            .checkout_options(&Cart::new(), &contact(), &email)
            .unwrap_err(),
        PaymentError::EmptyCart
    );
}

#[test]
fn test_missing_payment_id_is_cancelled() {
    assert_eq!(
        payments().verify(&result("  ", None, None)),
        Err(PaymentError::Cancelled)
    );
}

#[test]
fn test_signed_result_verifies() {
    let signature = sign("order_9A33XWu170gUtm", "pay_29QQoUBi66xm2f");
    assert_eq!(
        payments().verify(&result(
            "pay_29QQoUBi66xm2f",
            Some("order_9A33XWu170gUtm"),
            Some(signature)
        )),
        Ok(())
    );
}

#[test]
fn test_tampered_signature_is_rejected() {
    let signature = sign("order_9A33XWu170gUtm", "pay_someone_else");
    assert_eq!(
        payments().verify(&result(
            "pay_29QQoUBi66xm2f",
            Some("order_9A33XWu170gUtm"),
            Some(signature)
        )),
        Err(PaymentError::InvalidSignature)
    );
}

#[test]
fn test_unsigned_result_is_accepted() {
    // Widget without an order: nothing to verify
    assert_eq!(payments().verify(&result("pay_29QQoUBi66xm2f", None, None)), Ok(()));
}
