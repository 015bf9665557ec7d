//! Product Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD, VND},
};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    products::{Product, ProductId, ProductPrices},
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product key -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductFixture {
    /// Host product id
    pub id: u64,

    /// Product name
    pub name: String,

    /// Reference price (e.g., "45000 VND")
    pub price: String,

    /// Optional product-level discount price
    #[serde(default)]
    pub discount_price: Option<String>,
}

impl TryFrom<ProductFixture> for Product<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let reference_price = parse_money(&fixture.price)?;

        let prices = match fixture.discount_price.as_deref() {
            Some(discount) => {
                let discount_price = parse_money(discount)?;

                if discount_price.currency() != reference_price.currency() {
                    return Err(FixtureError::CurrencyMismatch(
                        reference_price.currency().iso_alpha_code.to_string(),
                        discount_price.currency().iso_alpha_code.to_string(),
                    ));
                }

                ProductPrices::with_discount(reference_price, discount_price)
            }
            None => ProductPrices::new(reference_price),
        };

        Ok(Product {
            id: ProductId::from(fixture.id),
            name: fixture.name,
            prices,
        })
    }
}

/// Parse a price string into `Money`.
///
/// # Errors
///
/// Returns an error if [`parse_price`] rejects the string.
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "2.99 GBP" or "45000 VND") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    // Minor units per major unit
    let (currency, scale) = match *currency_code {
        "GBP" => (GBP, 100),
        "USD" => (USD, 100),
        "EUR" => (EUR, 100),
        "VND" => (VND, 1),
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    let minor_units = amount
        .checked_mul(Decimal::new(scale, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_price_scales_by_currency() -> TestResult {
        let (gbp_minor, gbp) = parse_price("2.99 GBP")?;
        let (vnd_minor, vnd) = parse_price("45000 VND")?;

        assert_eq!(gbp_minor, 299);
        assert_eq!(gbp, GBP);
        assert_eq!(vnd_minor, 45_000);
        assert_eq!(vnd, VND);

        Ok(())
    }

    #[test]
    fn product_fixture_keeps_discount_price() -> TestResult {
        let fixture = ProductFixture {
            id: 3,
            name: "Oolong".to_string(),
            price: "60000 VND".to_string(),
            discount_price: Some("55000 VND".to_string()),
        };

        let product = Product::try_from(fixture)?;

        assert_eq!(product.id, ProductId(3));
        assert_eq!(product.prices.effective_price(), Money::from_minor(55_000, VND));

        Ok(())
    }

    #[test]
    fn product_fixture_rejects_mixed_currencies() {
        let fixture = ProductFixture {
            id: 3,
            name: "Oolong".to_string(),
            price: "60000 VND".to_string(),
            discount_price: Some("2.00 USD".to_string()),
        };

        let result = Product::try_from(fixture);

        assert!(matches!(result, Err(FixtureError::CurrencyMismatch(_, _))));
    }
}
