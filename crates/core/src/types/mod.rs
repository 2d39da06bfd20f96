//! Core types for the Thryft marketplace.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod category;
pub mod email;
pub mod id;
pub mod price;
pub mod product;
pub mod status;

pub use category::{Category, CategorySchema, ExtraField};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use product::{MeasurementUnit, Measurements, Product, Seller, UserProfile};
pub use status::*;
