//! Thryft Core - Shared marketplace types.
//!
//! This crate provides the types the storefront and its tests share:
//! products, sellers, prices, categories, statuses and typed IDs.
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Rows from the hosted backend are converted into these types at
//! the edge, in the storefront's backend module.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, statuses, categories and products

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
