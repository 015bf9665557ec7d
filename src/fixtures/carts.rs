//! Cart Fixtures

use serde::Deserialize;

/// Wrapper for cart lines in YAML
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Lines in cart order
    pub lines: Vec<CartLineFixture>,
}

/// One cart line, referencing a product by its fixture key
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CartLineFixture {
    /// Product key
    pub product: String,

    /// Units in the cart
    pub quantity: u32,
}
