//! Cart
//!
//! A read-only cart snapshot: one line per distinct product, merged before evaluation.

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::products::{ProductId, ProductPrices};

/// Product id to cart quantity, the only cart view promotion conditions look at.
pub type CartQuantities = FxHashMap<ProductId, u32>;

/// Errors related to cart construction or totals.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (product, line currency, cart currency).
    #[error("Product {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),

    /// A line was added with a zero quantity.
    #[error("Product {0} has a zero quantity")]
    ZeroQuantity(ProductId),

    /// No price was supplied for a product in the cart.
    #[error("No price found for product {0}")]
    MissingPrice(ProductId),

    /// A line total or subtotal does not fit in minor units.
    #[error("Cart totals overflowed")]
    Overflow,
}

/// One cart line per distinct product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartLine<'a> {
    /// Product in this line
    pub product_id: ProductId,

    /// Units of the product in the cart
    pub quantity: u32,

    /// Undiscounted unit price
    pub reference_price: Money<'a, Currency>,

    /// Unit price after any product-level discount
    pub effective_price: Money<'a, Currency>,
}

impl<'a> CartLine<'a> {
    /// Create a cart line from resolved product prices.
    pub fn new(product_id: ProductId, quantity: u32, prices: &ProductPrices<'a>) -> Self {
        Self {
            product_id,
            quantity,
            reference_price: prices.reference_price,
            effective_price: prices.effective_price(),
        }
    }

    /// Reference price times quantity, in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the total does not fit in minor units.
    pub fn reference_total_minor(&self) -> Result<i64, CartError> {
        self.reference_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::Overflow)
    }

    /// Effective price times quantity, in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the total does not fit in minor units.
    pub fn effective_total_minor(&self) -> Result<i64, CartError> {
        self.effective_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(CartError::Overflow)
    }
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    lines: Vec<CartLine<'a>>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Cart {
            lines: Vec::new(),
            currency,
        }
    }

    /// Create a cart from lines, merging lines that share a product.
    ///
    /// Merged lines sum their quantities and keep the prices of the first line seen.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if a line has a zero quantity, a foreign currency, or if merged
    /// quantities overflow.
    pub fn with_lines(
        lines: impl IntoIterator<Item = CartLine<'a>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let mut merged: Vec<CartLine<'a>> = Vec::new();
        let mut positions: FxHashMap<ProductId, usize> = FxHashMap::default();

        for line in lines {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity(line.product_id));
            }

            for price in [line.reference_price, line.effective_price] {
                if price.currency() != currency {
                    return Err(CartError::CurrencyMismatch(
                        line.product_id,
                        price.currency().iso_alpha_code,
                        currency.iso_alpha_code,
                    ));
                }
            }

            if let Some(existing) = positions
                .get(&line.product_id)
                .and_then(|&idx| merged.get_mut(idx))
            {
                existing.quantity = existing
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or(CartError::Overflow)?;
            } else {
                positions.insert(line.product_id, merged.len());
                merged.push(line);
            }
        }

        Ok(Cart {
            lines: merged,
            currency,
        })
    }

    /// Create a cart from `(product, quantity)` pairs and a price lookup.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::MissingPrice`] when a product has no price, or any error from
    /// [`Cart::with_lines`].
    pub fn from_priced_lines(
        entries: impl IntoIterator<Item = (ProductId, u32)>,
        prices: &FxHashMap<ProductId, ProductPrices<'a>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let lines = entries
            .into_iter()
            .map(|(product_id, quantity)| {
                prices
                    .get(&product_id)
                    .map(|product_prices| CartLine::new(product_id, quantity, product_prices))
                    .ok_or(CartError::MissingPrice(product_id))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_lines(lines, currency)
    }

    /// Product id to quantity map used by condition evaluation.
    pub fn quantities(&self) -> CartQuantities {
        self.lines
            .iter()
            .map(|line| (line.product_id, line.quantity))
            .collect()
    }

    /// Sum of reference prices, before any discount.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the subtotal does not fit in minor units.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let minor = self.sum_minor(CartLine::reference_total_minor)?;

        Ok(Money::from_minor(minor, self.currency))
    }

    /// Sum of effective prices, after product-level discounts but before promotions.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the subtotal does not fit in minor units.
    pub fn discounted_subtotal(&self) -> Result<Money<'a, Currency>, CartError> {
        let minor = self.sum_minor(CartLine::effective_total_minor)?;

        Ok(Money::from_minor(minor, self.currency))
    }

    /// Savings from product-level discounts alone.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Overflow`] if the savings do not fit in minor units.
    pub fn line_savings(&self) -> Result<Money<'a, Currency>, CartError> {
        let minor = self.sum_minor(|line| {
            let per_unit = line
                .reference_price
                .to_minor_units()
                .saturating_sub(line.effective_price.to_minor_units())
                .max(0);

            per_unit
                .checked_mul(i64::from(line.quantity))
                .ok_or(CartError::Overflow)
        })?;

        Ok(Money::from_minor(minor, self.currency))
    }

    fn sum_minor(
        &self,
        line_total: impl Fn(&CartLine<'a>) -> Result<i64, CartError>,
    ) -> Result<i64, CartError> {
        self.lines.iter().try_fold(0_i64, |acc, line| {
            acc.checked_add(line_total(line)?)
                .ok_or(CartError::Overflow)
        })
    }

    /// Look up the line for a product.
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine<'a>> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Iterate over the lines in the cart.
    pub fn iter(&self) -> impl Iterator<Item = &CartLine<'a>> {
        self.lines.iter()
    }

    /// Get the number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Get the currency of the cart.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{USD, VND};
    use testresult::TestResult;

    use super::*;

    fn line(id: u64, quantity: u32, price: i64) -> CartLine<'static> {
        CartLine::new(
            ProductId(id),
            quantity,
            &ProductPrices::new(Money::from_minor(price, VND)),
        )
    }

    #[test]
    fn with_lines_merges_duplicate_products() -> TestResult {
        let cart = Cart::with_lines([line(1, 2, 100), line(2, 1, 50), line(1, 3, 999)], VND)?;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantities().get(&ProductId(1)), Some(&5));
        assert_eq!(
            cart.line(ProductId(1)).map(|l| l.reference_price),
            Some(Money::from_minor(100, VND))
        );

        Ok(())
    }

    #[test]
    fn with_lines_rejects_zero_quantity() {
        let result = Cart::with_lines([line(7, 0, 100)], VND);

        assert!(matches!(result, Err(CartError::ZeroQuantity(ProductId(7)))));
    }

    #[test]
    fn with_lines_rejects_foreign_currency() {
        let foreign = CartLine::new(
            ProductId(3),
            1,
            &ProductPrices::new(Money::from_minor(100, USD)),
        );

        let result = Cart::with_lines([line(1, 1, 100), foreign], VND);

        assert_eq!(
            result.err(),
            Some(CartError::CurrencyMismatch(
                ProductId(3),
                USD.iso_alpha_code,
                VND.iso_alpha_code
            ))
        );
    }

    #[test]
    fn subtotals_use_reference_and_effective_prices() -> TestResult {
        let discounted = CartLine::new(
            ProductId(2),
            2,
            &ProductPrices::with_discount(
                Money::from_minor(1_000, VND),
                Money::from_minor(800, VND),
            ),
        );

        let cart = Cart::with_lines([line(1, 3, 500), discounted], VND)?;

        assert_eq!(cart.subtotal()?, Money::from_minor(3_500, VND));
        assert_eq!(cart.discounted_subtotal()?, Money::from_minor(3_100, VND));
        assert_eq!(cart.line_savings()?, Money::from_minor(400, VND));

        Ok(())
    }

    #[test]
    fn empty_cart_has_zero_subtotal() -> TestResult {
        let cart = Cart::new(VND);

        assert!(cart.is_empty());
        assert_eq!(cart.subtotal()?, Money::from_minor(0, VND));

        Ok(())
    }

    #[test]
    fn from_priced_lines_requires_prices() {
        let prices = FxHashMap::default();

        let result = Cart::from_priced_lines([(ProductId(4), 1)], &prices, VND);

        assert_eq!(result.err(), Some(CartError::MissingPrice(ProductId(4))));
    }

    #[test]
    fn from_priced_lines_resolves_effective_price() -> TestResult {
        let mut prices = FxHashMap::default();
        prices.insert(
            ProductId(4),
            ProductPrices::with_discount(Money::from_minor(200, VND), Money::from_minor(150, VND)),
        );

        let cart = Cart::from_priced_lines([(ProductId(4), 2)], &prices, VND)?;

        assert_eq!(cart.discounted_subtotal()?, Money::from_minor(300, VND));

        Ok(())
    }

    #[test]
    fn subtotal_overflow_is_reported() -> TestResult {
        let cart = Cart::with_lines([line(1, u32::MAX, i64::MAX)], VND)?;

        assert_eq!(cart.subtotal().err(), Some(CartError::Overflow));

        Ok(())
    }
}
