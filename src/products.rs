//! Products

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

/// Product identifier, as issued by the host catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Price fields for a single product, resolved by the host before evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductPrices<'a> {
    /// Undiscounted unit price
    pub reference_price: Money<'a, Currency>,

    /// Optional product-level discounted unit price
    pub discount_price: Option<Money<'a, Currency>>,
}

impl<'a> ProductPrices<'a> {
    /// Prices with no product-level discount.
    pub fn new(reference_price: Money<'a, Currency>) -> Self {
        Self {
            reference_price,
            discount_price: None,
        }
    }

    /// Prices with a product-level discount price.
    pub fn with_discount(
        reference_price: Money<'a, Currency>,
        discount_price: Money<'a, Currency>,
    ) -> Self {
        Self {
            reference_price,
            discount_price: Some(discount_price),
        }
    }

    /// Unit price actually charged before promotions.
    ///
    /// The discount price wins only when it is positive and either undercuts the reference price
    /// or the reference price is zero. Anything else falls back to the reference price.
    pub fn effective_price(&self) -> Money<'a, Currency> {
        let reference = self.reference_price.to_minor_units();

        match self.discount_price {
            Some(discount)
                if discount.currency() == self.reference_price.currency()
                    && discount.to_minor_units() > 0
                    && (reference == 0 || discount.to_minor_units() < reference) =>
            {
                discount
            }
            _ => self.reference_price,
        }
    }
}

/// Catalog product as the host knows it.
#[derive(Debug, Clone, PartialEq)]
pub struct Product<'a> {
    /// Product identifier
    pub id: ProductId,

    /// Display name
    pub name: String,

    /// Price fields
    pub prices: ProductPrices<'a>,
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{USD, VND};

    use super::*;

    #[test]
    fn effective_price_without_discount_is_reference() {
        let prices = ProductPrices::new(Money::from_minor(150_000, VND));

        assert_eq!(prices.effective_price(), Money::from_minor(150_000, VND));
    }

    #[test]
    fn effective_price_prefers_lower_discount_price() {
        let prices = ProductPrices::with_discount(
            Money::from_minor(150_000, VND),
            Money::from_minor(120_000, VND),
        );

        assert_eq!(prices.effective_price(), Money::from_minor(120_000, VND));
    }

    #[test]
    fn effective_price_ignores_discount_above_reference() {
        let prices = ProductPrices::with_discount(
            Money::from_minor(150_000, VND),
            Money::from_minor(180_000, VND),
        );

        assert_eq!(prices.effective_price(), Money::from_minor(150_000, VND));
    }

    #[test]
    fn effective_price_ignores_zero_discount() {
        let prices = ProductPrices::with_discount(
            Money::from_minor(150_000, VND),
            Money::from_minor(0, VND),
        );

        assert_eq!(prices.effective_price(), Money::from_minor(150_000, VND));
    }

    #[test]
    fn effective_price_uses_discount_when_reference_is_zero() {
        let prices =
            ProductPrices::with_discount(Money::from_minor(0, VND), Money::from_minor(9_000, VND));

        assert_eq!(prices.effective_price(), Money::from_minor(9_000, VND));
    }

    #[test]
    fn effective_price_ignores_discount_in_other_currency() {
        let prices =
            ProductPrices::with_discount(Money::from_minor(500, USD), Money::from_minor(100, VND));

        assert_eq!(prices.effective_price(), Money::from_minor(500, USD));
    }

    #[test]
    fn product_id_displays_inner_value() {
        assert_eq!(ProductId(42).to_string(), "42");
    }

    #[test]
    fn product_id_converts_from_host_integer() {
        assert_eq!(ProductId::from(7_u64), ProductId(7));
    }
}
