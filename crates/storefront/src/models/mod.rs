//! Session-held models for storefront.

pub mod session;

pub use session::{clear_cart, load_cart, store_cart};
