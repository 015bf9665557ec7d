//! Price Preview
//!
//! Approximate single-product pricing for listing cards. The first live promotion that mentions
//! the product (or has no conditions) is shown, without looking at quantities or stacking.
//! Checkout totals always come from [`crate::aggregate::CartPromotionAggregator`].

use chrono::{DateTime, Utc};
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use tracing::debug;

use crate::{
    products::ProductId,
    promotions::{DiscountType, PromotionDefinition, PromotionId, catalog::PromotionCatalog},
};

/// Displayed price for one product card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewResult<'a> {
    /// Promotion shown on the card, if any
    pub promotion_id: Option<PromotionId>,

    /// Price to display
    pub final_price: Money<'a, Currency>,

    /// Whole percent off the original price, when the price dropped
    pub discount_percent: Option<u32>,

    /// Whether the card should be tagged as gift-eligible
    pub is_gift_eligible: bool,
}

impl<'a> PreviewResult<'a> {
    /// A preview with no promotion.
    pub fn unchanged(original_price: Money<'a, Currency>) -> Self {
        Self {
            promotion_id: None,
            final_price: original_price,
            discount_percent: None,
            is_gift_eligible: false,
        }
    }
}

/// Quantity-agnostic preview strategy for listing surfaces, bound to one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PricePreviewCalculator<'c, 'a> {
    catalog: &'c PromotionCatalog<'a>,
}

impl<'c, 'a> PricePreviewCalculator<'c, 'a> {
    /// Create a calculator over a catalog snapshot.
    pub fn new(catalog: &'c PromotionCatalog<'a>) -> Self {
        Self { catalog }
    }

    /// First live promotion, in catalog order, whose conditions are empty or mention the product.
    pub fn select(
        &self,
        product_id: ProductId,
        at: DateTime<Utc>,
    ) -> Option<&'c PromotionDefinition<'a>> {
        self.catalog.live_at(at).find(|promotion| {
            promotion.conditions.is_empty() || promotion.references_product(product_id)
        })
    }

    /// Compute the displayed price for one product.
    pub fn preview(
        &self,
        product_id: ProductId,
        original_price: Money<'a, Currency>,
        at: DateTime<Utc>,
    ) -> PreviewResult<'a> {
        let Some(promotion) = self.select(product_id, at) else {
            return PreviewResult::unchanged(original_price);
        };

        debug!(%product_id, promotion_id = %promotion.id, "previewing promotion");

        match promotion.discount_type {
            DiscountType::Gift => PreviewResult {
                promotion_id: Some(promotion.id),
                final_price: original_price,
                discount_percent: None,
                is_gift_eligible: true,
            },
            DiscountType::DiscountAmount => {
                let final_price = promotion
                    .usable_discount_amount()
                    .filter(|amount| amount.currency() == original_price.currency())
                    .map_or(original_price, |amount| {
                        let final_minor = original_price
                            .to_minor_units()
                            .saturating_sub(amount.to_minor_units())
                            .max(0);

                        Money::from_minor(final_minor, original_price.currency())
                    });

                PreviewResult {
                    promotion_id: Some(promotion.id),
                    final_price,
                    discount_percent: discount_percent(original_price, final_price),
                    is_gift_eligible: false,
                }
            }
        }
    }
}

/// Rounded percent off, or `None` when the price did not drop.
fn discount_percent(original: Money<'_, Currency>, discounted: Money<'_, Currency>) -> Option<u32> {
    let original_minor = original.to_minor_units();
    let discounted_minor = discounted.to_minor_units();

    if original_minor <= 0 || discounted_minor >= original_minor {
        return None;
    }

    let off = Decimal::from_i64(original_minor.checked_sub(discounted_minor)?)?;
    let base = Decimal::from_i64(original_minor)?;

    off.checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(base)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}
