//! Discounts
//!
//! Turns a fixed amount promotion's conditions into a "times applied" count and a monetary
//! contribution. Malformed promotions contribute nothing; they never fail the evaluation.

use rusty_money::{Money, iso::Currency};
use tracing::{debug, warn};

use crate::{
    cart::CartQuantities,
    promotions::{
        DiscountType, PromotionDefinition,
        conditions::{ConditionsEvaluation, GroupCombination},
    },
};

/// Monetary outcome of one fixed amount promotion.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountContribution<'a> {
    /// How many times the promotion's conditions hold
    pub times_applied: u32,

    /// Discount amount times `times_applied`, zero when malformed or unsatisfied
    pub amount: Money<'a, Currency>,

    /// Per-group outcomes behind `times_applied`
    pub conditions: ConditionsEvaluation,
}

impl DiscountContribution<'_> {
    /// Whether the promotion contributes a positive amount.
    pub fn is_applied(&self) -> bool {
        self.times_applied > 0 && self.amount.to_minor_units() > 0
    }
}

/// Evaluates fixed amount promotions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscountAggregator {
    combination: GroupCombination,
}

impl DiscountAggregator {
    /// Create an aggregator folding condition groups with `combination`.
    pub fn new(combination: GroupCombination) -> Self {
        Self { combination }
    }

    /// Group combination policy in use.
    pub fn combination(&self) -> GroupCombination {
        self.combination
    }

    /// Evaluate one promotion against cart quantities, in the cart's `currency`.
    ///
    /// Gift promotions, missing or non-positive amounts, foreign currencies and overflowing
    /// products all contribute zero.
    pub fn evaluate<'a>(
        &self,
        promotion: &PromotionDefinition<'a>,
        quantities: &CartQuantities,
        currency: &'a Currency,
    ) -> DiscountContribution<'a> {
        let conditions = promotion.evaluate_conditions(self.combination, quantities);
        let times_applied = conditions.times_applied;
        let zero = Money::from_minor(0, currency);

        if promotion.discount_type != DiscountType::DiscountAmount {
            return DiscountContribution {
                times_applied,
                amount: zero,
                conditions,
            };
        }

        let amount = match discount_minor(promotion, times_applied, currency) {
            Some(minor) => Money::from_minor(minor, currency),
            None => zero,
        };

        debug!(
            promotion_id = %promotion.id,
            times_applied,
            amount = amount.to_minor_units(),
            "evaluated discount promotion"
        );

        DiscountContribution {
            times_applied,
            amount,
            conditions,
        }
    }
}

/// Discount in minor units, or `None` when the promotion cannot contribute.
///
/// Unsatisfied promotions are zero without their amount being inspected.
fn discount_minor(
    promotion: &PromotionDefinition<'_>,
    times_applied: u32,
    currency: &Currency,
) -> Option<i64> {
    if times_applied == 0 {
        return Some(0);
    }

    let Some(per_application) = promotion.usable_discount_amount() else {
        warn!(promotion_id = %promotion.id, "discount promotion has no positive amount");
        return None;
    };

    if per_application.currency() != currency {
        warn!(
            promotion_id = %promotion.id,
            promotion_currency = per_application.currency().iso_alpha_code,
            cart_currency = currency.iso_alpha_code,
            "discount promotion currency does not match cart"
        );
        return None;
    }

    let scaled = per_application
        .to_minor_units()
        .checked_mul(i64::from(times_applied));

    if scaled.is_none() {
        warn!(promotion_id = %promotion.id, times_applied, "discount amount overflowed");
    }

    scaled
}
