//! Cardapio Core - Catalog, cart and order types.
//!
//! This crate provides the domain types shared by the Cardapio components:
//! - `storefront` - Public-facing menu site with cart and order handoff
//! - `integration-tests` - Router-level tests for the storefront
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. Everything here is deterministic and can be
//! tested without a runtime.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs and prices
//! - [`catalog`] - Products, category derivation, search and category filters
//! - [`cart`] - The cart aggregate and its line identity rules
//! - [`order`] - Order message serialization and the messaging handoff link

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod order;
pub mod types;

pub use cart::{Cart, CartError, CartLine, CartTotals, LineKey, QuantityChange};
pub use catalog::{
    ALL_CATEGORIES, Catalog, Product, ProductFilter, ProductOptions, derive_categories,
};
pub use order::{
    Destination, HandoffLink, OrderError, OrderRequest, PaymentMethod, build_order_message,
};
pub use types::*;
