//! Checkout Summary
//!
//! Terminal rendering of an evaluated cart: cart lines, applied promotions, granted gifts and
//! the checkout totals.

use std::{collections::HashMap, hash::BuildHasher, io};

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    Table,
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    aggregate::{AggregateResult, AppliedPromotion, CheckoutTotals},
    cart::{Cart, CartError, CartLine},
    gifts::GrantedGift,
    products::ProductId,
    promotions::DiscountType,
};

/// Errors that can occur when writing a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Cart totals could not be calculated.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Cart line refers to a product with no display name.
    #[error("Missing product name for product {0}")]
    MissingProduct(ProductId),

    /// Error writing to the output.
    #[error("Failed to write summary: {0}")]
    Io(#[from] io::Error),
}

/// Write the summary for `cart` and its aggregate `result`.
///
/// # Errors
///
/// Returns an error if a cart line has no name in `product_names`, if the cart totals cannot be
/// calculated, or if writing fails.
pub fn write_summary<S: BuildHasher>(
    mut out: impl io::Write,
    cart: &Cart<'_>,
    result: &AggregateResult<'_>,
    product_names: &HashMap<ProductId, String, S>,
) -> Result<(), SummaryError> {
    let totals = CheckoutTotals::new(cart, result.total_discount)?;

    writeln!(out, "\n{}", cart_table(cart, product_names)?)?;

    if result.applied_promotions.is_empty() {
        writeln!(out, "No promotions applied")?;
    } else {
        writeln!(out, "{}", promotions_table(&result.applied_promotions))?;
    }

    if !result.gifts.is_empty() {
        writeln!(out, "{}", gifts_table(&result.gifts, product_names))?;
    }

    writeln!(out, "{}", totals_table(&totals))?;

    Ok(())
}

fn cart_table<S: BuildHasher>(
    cart: &Cart<'_>,
    product_names: &HashMap<ProductId, String, S>,
) -> Result<Table, SummaryError> {
    let mut builder = Builder::default();

    builder.push_record(["Item", "Qty", "Unit Price", "Was", "Line Total"]);

    for line in cart.iter() {
        let name = product_names
            .get(&line.product_id)
            .ok_or(SummaryError::MissingProduct(line.product_id))?;

        builder.push_record([
            name.clone(),
            line.quantity.to_string(),
            line.effective_price.to_string(),
            was_price(line),
            Money::from_minor(line.effective_total_minor()?, cart.currency()).to_string(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..5), Alignment::right());

    Ok(table)
}

/// Reference price, shown only when a product-level discount is in effect.
fn was_price(line: &CartLine<'_>) -> String {
    if line.effective_price == line.reference_price {
        String::new()
    } else {
        line.reference_price.to_string()
    }
}

fn promotions_table(applied: &[AppliedPromotion<'_>]) -> Table {
    let mut builder = Builder::default();

    builder.push_record(["Promotion", "Times", "Discount", "Note"]);

    for promotion in applied {
        let discount = match promotion.discount_type {
            DiscountType::DiscountAmount => format!("-{}", promotion.amount),
            DiscountType::Gift => String::new(),
        };

        builder.push_record([
            promotion.name.clone(),
            promotion.times_applied.to_string(),
            discount,
            promotion.note.clone().unwrap_or_default(),
        ]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..3), Alignment::right());
    table.modify(Columns::new(2..3), Color::FG_GREEN);

    table
}

fn gifts_table<S: BuildHasher>(
    gifts: &[GrantedGift],
    product_names: &HashMap<ProductId, String, S>,
) -> Table {
    let mut builder = Builder::default();

    builder.push_record(["Free Gift", "Qty"]);

    for gift in gifts {
        let name = gift
            .product_name
            .clone()
            .or_else(|| product_names.get(&gift.product_id).cloned())
            .unwrap_or_else(|| format!("product #{}", gift.product_id));

        builder.push_record([name, gift.quantity.to_string()]);
    }

    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(1..2), Alignment::right());

    table
}

fn totals_table(totals: &CheckoutTotals<'_>) -> Table {
    let mut builder = Builder::default();

    builder.push_record(["Subtotal:".to_string(), totals.subtotal.to_string()]);
    builder.push_record(["Product discounts:".to_string(), negated(totals.line_savings)]);
    builder.push_record(["Promotions:".to_string(), negated(totals.promotion_discount)]);
    builder.push_record(["Total:".to_string(), totals.final_total.to_string()]);
    builder.push_record([
        "Savings:".to_string(),
        format!(
            "({:.2}%) {}",
            percent_points(totals.savings_percent()),
            totals.total_savings
        ),
    ]);

    let mut table = builder.build();

    table.with(Style::blank());
    table.modify(Columns::first(), Alignment::right());
    table.modify(Columns::new(1..2), Alignment::right());
    table.modify(Rows::new(3..4), Color::BOLD);

    table
}

fn negated(amount: Money<'_, Currency>) -> String {
    if amount.to_minor_units() == 0 {
        amount.to_string()
    } else {
        format!("-{amount}")
    }
}

/// `Percentage` is a fraction (0.25), displayed as percent points (25.00).
fn percent_points(percentage: Percentage) -> Decimal {
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}
