//! Promo Engine
//!
//! Promotion evaluation for a storefront: condition matching, cart-level discount and gift
//! aggregation, and the quantity-agnostic price preview shown on product listings.

pub mod aggregate;
pub mod cart;
pub mod config;
pub mod discounts;
pub mod fixtures;
pub mod gifts;
pub mod prelude;
pub mod preview;
pub mod products;
pub mod promotions;
pub mod summary;
pub mod utils;
