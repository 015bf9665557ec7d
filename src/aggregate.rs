//! Cart Promotion Aggregation
//!
//! Runs every live promotion in a catalog against one cart snapshot and folds the outcomes into a
//! single result. This is the authoritative checkout path; previews never feed into it.

use chrono::{DateTime, Utc};
use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    cart::{Cart, CartError},
    config::EngineConfig,
    discounts::DiscountAggregator,
    gifts::{GiftGrant, GiftResolver, GrantedGift},
    promotions::{
        DiscountType, PromotionDefinition, PromotionId, catalog::PromotionCatalog,
        conditions::GroupEvaluation,
    },
};

/// How monetary promotions combine when several qualify.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountStacking {
    /// Every qualifying promotion applies and amounts add up.
    #[default]
    Additive,

    /// Only the largest qualifying amount applies. Gift promotions still all apply.
    BestOnly,
}

/// One promotion line in the checkout breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromotion<'a> {
    /// Promotion identifier
    pub promotion_id: PromotionId,

    /// Display name
    pub name: String,

    /// Discount type of the promotion
    pub discount_type: DiscountType,

    /// Monetary discount; zero for gift promotions
    pub amount: Money<'a, Currency>,

    /// How many times the promotion fired
    pub times_applied: u32,

    /// Human readable note, set for gift-only promotions
    pub note: Option<String>,

    /// Per-group condition outcomes
    pub details: Vec<GroupEvaluation>,
}

/// Result of evaluating a catalog against a cart.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult<'a> {
    /// Sum of applied amounts, clamped to the cart's discounted subtotal
    pub total_discount: Money<'a, Currency>,

    /// Applied promotions, in catalog order
    pub applied_promotions: Vec<AppliedPromotion<'a>>,

    /// Free lines to add to the order, in catalog order
    pub gifts: Vec<GrantedGift>,
}

impl<'a> AggregateResult<'a> {
    /// An empty result in the given currency.
    pub fn empty(currency: &'a Currency) -> Self {
        Self {
            total_discount: Money::from_minor(0, currency),
            applied_promotions: Vec::new(),
            gifts: Vec::new(),
        }
    }

    /// Checkout totals for the cart this result was computed from.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart subtotals cannot be calculated.
    pub fn checkout_totals(&self, cart: &Cart<'a>) -> Result<CheckoutTotals<'a>, CartError> {
        CheckoutTotals::new(cart, self.total_discount)
    }
}

/// Order summary figures, as shown on a checkout page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckoutTotals<'a> {
    /// Sum of reference prices
    pub subtotal: Money<'a, Currency>,

    /// Sum of effective prices, before promotions
    pub discounted_subtotal: Money<'a, Currency>,

    /// Savings from product-level discounts
    pub line_savings: Money<'a, Currency>,

    /// Promotion discount actually taken off
    pub promotion_discount: Money<'a, Currency>,

    /// Line savings plus promotion discount
    pub total_savings: Money<'a, Currency>,

    /// Amount charged, never negative
    pub final_total: Money<'a, Currency>,
}

impl<'a> CheckoutTotals<'a> {
    /// Compute totals for a cart and a promotion discount.
    ///
    /// The discount is clamped so the final total never drops below zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart subtotals cannot be calculated.
    pub fn new(
        cart: &Cart<'a>,
        promotion_discount: Money<'a, Currency>,
    ) -> Result<Self, CartError> {
        let currency = cart.currency();
        let subtotal = cart.subtotal()?;
        let discounted_subtotal = cart.discounted_subtotal()?;
        let line_savings = cart.line_savings()?;

        let discount_minor =
            clamp_discount(promotion_discount.to_minor_units(), discounted_subtotal);
        let final_minor = discounted_subtotal
            .to_minor_units()
            .saturating_sub(discount_minor)
            .max(0);
        let total_savings_minor = line_savings
            .to_minor_units()
            .checked_add(discount_minor)
            .ok_or(CartError::Overflow)?;

        Ok(Self {
            subtotal,
            discounted_subtotal,
            line_savings,
            promotion_discount: Money::from_minor(discount_minor, currency),
            total_savings: Money::from_minor(total_savings_minor, currency),
            final_total: Money::from_minor(final_minor, currency),
        })
    }

    /// Total savings relative to the undiscounted subtotal.
    pub fn savings_percent(&self) -> Percentage {
        let subtotal_minor = self.subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Percentage::from(0.0);
        }

        let savings = Decimal::from(self.total_savings.to_minor_units());
        let subtotal = Decimal::from(subtotal_minor);

        Percentage::from(savings / subtotal)
    }
}

/// Clamp a discount into `0..=subtotal`.
fn clamp_discount(discount_minor: i64, discounted_subtotal: Money<'_, Currency>) -> i64 {
    discount_minor.clamp(0, discounted_subtotal.to_minor_units().max(0))
}

/// Orchestrates discount and gift evaluation over a whole catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartPromotionAggregator {
    discounts: DiscountAggregator,
    gifts: GiftResolver,
    stacking: DiscountStacking,
}

impl CartPromotionAggregator {
    /// Create an aggregator from engine policies.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            discounts: DiscountAggregator::new(config.group_combination),
            gifts: GiftResolver::new(config.group_combination, config.gift_scaling),
            stacking: config.stacking,
        }
    }

    /// Evaluate every promotion live at `at` against the cart.
    ///
    /// Inactive, out-of-window and malformed promotions contribute nothing. The result depends on
    /// the arguments only.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the cart's discounted subtotal cannot be calculated.
    pub fn evaluate<'a>(
        &self,
        catalog: &PromotionCatalog<'a>,
        cart: &Cart<'a>,
        at: DateTime<Utc>,
    ) -> Result<AggregateResult<'a>, CartError> {
        let currency = cart.currency();
        let quantities = cart.quantities();
        let discounted_subtotal = cart.discounted_subtotal()?;

        let mut applied = Vec::new();
        let mut gifts = Vec::new();

        for promotion in catalog.live_at(at) {
            match promotion.discount_type {
                DiscountType::DiscountAmount => {
                    let contribution = self.discounts.evaluate(promotion, &quantities, currency);

                    if contribution.is_applied() {
                        applied.push(AppliedPromotion {
                            promotion_id: promotion.id,
                            name: promotion.name.clone(),
                            discount_type: DiscountType::DiscountAmount,
                            amount: contribution.amount,
                            times_applied: contribution.times_applied,
                            note: None,
                            details: contribution.conditions.groups,
                        });
                    }
                }
                DiscountType::Gift => {
                    let grant = self.gifts.resolve(promotion, &quantities);

                    if grant.is_applied() {
                        applied.push(gift_line(promotion, &grant, currency));
                        gifts.extend(grant.gifts);
                    }
                }
            }
        }

        if self.stacking == DiscountStacking::BestOnly {
            keep_best_discount(&mut applied);
        }

        let raw_total = applied.iter().fold(0_i64, |acc, promotion| {
            acc.saturating_add(promotion.amount.to_minor_units())
        });
        let total_minor = clamp_discount(raw_total, discounted_subtotal);

        debug!(
            promotions = catalog.len(),
            applied = applied.len(),
            gifts = gifts.len(),
            raw_total,
            total_discount = total_minor,
            combination = ?self.discounts.combination(),
            scaling = ?self.gifts.scaling(),
            stacking = ?self.stacking,
            "evaluated cart promotions"
        );

        Ok(AggregateResult {
            total_discount: Money::from_minor(total_minor, currency),
            applied_promotions: applied,
            gifts,
        })
    }
}

/// Breakdown line for a gift promotion, with a note naming the granted items.
fn gift_line<'a>(
    promotion: &PromotionDefinition<'a>,
    grant: &GiftGrant,
    currency: &'a Currency,
) -> AppliedPromotion<'a> {
    let items = grant
        .gifts
        .iter()
        .map(|gift| match &gift.product_name {
            Some(name) => format!("{} x {name}", gift.quantity),
            None => format!("{} x product #{}", gift.quantity, gift.product_id),
        })
        .collect::<Vec<_>>()
        .join(", ");

    AppliedPromotion {
        promotion_id: promotion.id,
        name: promotion.name.clone(),
        discount_type: DiscountType::Gift,
        amount: Money::from_minor(0, currency),
        times_applied: grant.times_applied,
        note: Some(format!("Free gift: {items}")),
        details: grant.conditions.groups.clone(),
    }
}

/// Drop every monetary line except the largest; the first one wins ties.
fn keep_best_discount(applied: &mut Vec<AppliedPromotion<'_>>) {
    let best = applied
        .iter()
        .filter(|line| line.discount_type == DiscountType::DiscountAmount)
        .fold(None::<(PromotionId, i64)>, |best, line| {
            let amount = line.amount.to_minor_units();

            match best {
                Some((_, best_amount)) if best_amount >= amount => best,
                _ => Some((line.promotion_id, amount)),
            }
        })
        .map(|(id, _)| id);

    applied.retain(|line| {
        line.discount_type == DiscountType::Gift || Some(line.promotion_id) == best
    });
}
