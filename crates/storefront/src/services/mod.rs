//! External services the storefront hands off to.
//!
//! # Services
//!
//! - [`payments`] - Razorpay checkout options and signature verification
//! - [`geocoding`] - Reverse geocoding for profile locations

pub mod geocoding;
pub mod payments;

pub use geocoding::Geocoder;
pub use payments::{PaymentError, Payments};
