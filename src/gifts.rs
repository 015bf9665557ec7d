//! Gifts
//!
//! Resolves which free lines a `GIFT` promotion grants once its conditions hold.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{
    cart::CartQuantities,
    products::ProductId,
    promotions::{
        DiscountType, PromotionDefinition, PromotionId,
        conditions::{ConditionsEvaluation, GroupCombination},
    },
};

/// How gift quantities relate to the number of times a promotion fires.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftScaling {
    /// Each gift's quantity is multiplied by the times applied.
    #[default]
    Scaled,

    /// Each gift's quantity is granted once, however many times the promotion fires.
    Flat,
}

impl GiftScaling {
    /// Units granted for a gift quantity at a given times-applied count.
    ///
    /// Saturates rather than overflowing.
    pub fn granted_units(self, units_per_application: u32, times_applied: u32) -> u32 {
        if times_applied == 0 {
            return 0;
        }

        match self {
            GiftScaling::Scaled => units_per_application.saturating_mul(times_applied),
            GiftScaling::Flat => units_per_application,
        }
    }
}

/// Free line granted by a gift promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedGift {
    /// Promotion that granted the gift
    pub promotion_id: PromotionId,

    /// Gift product
    pub product_id: ProductId,

    /// Display name, if known
    pub product_name: Option<String>,

    /// Units granted
    pub quantity: u32,
}

/// Outcome of one gift promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftGrant {
    /// How many times the promotion's conditions hold
    pub times_applied: u32,

    /// Granted lines, in the promotion's gift order. Empty when unsatisfied.
    pub gifts: SmallVec<[GrantedGift; 2]>,

    /// Per-group outcomes behind `times_applied`
    pub conditions: ConditionsEvaluation,
}

impl GiftGrant {
    /// Whether any gift line was granted.
    pub fn is_applied(&self) -> bool {
        !self.gifts.is_empty()
    }
}

/// Evaluates gift promotions.
#[derive(Debug, Clone, Copy, Default)]
pub struct GiftResolver {
    combination: GroupCombination,
    scaling: GiftScaling,
}

impl GiftResolver {
    /// Create a resolver with the given policies.
    pub fn new(combination: GroupCombination, scaling: GiftScaling) -> Self {
        Self {
            combination,
            scaling,
        }
    }

    /// Gift scaling policy in use.
    pub fn scaling(&self) -> GiftScaling {
        self.scaling
    }

    /// Resolve the gifts one promotion grants for the given cart quantities.
    pub fn resolve(
        &self,
        promotion: &PromotionDefinition<'_>,
        quantities: &CartQuantities,
    ) -> GiftGrant {
        let conditions = promotion.evaluate_conditions(self.combination, quantities);
        let times_applied = conditions.times_applied;

        if promotion.discount_type != DiscountType::Gift || times_applied == 0 {
            return GiftGrant {
                times_applied,
                gifts: SmallVec::new(),
                conditions,
            };
        }

        if promotion.gift_items.is_empty() {
            warn!(promotion_id = %promotion.id, "gift promotion has no gift items");
        }

        let gifts: SmallVec<[GrantedGift; 2]> = promotion
            .gift_items
            .iter()
            .map(|item| GrantedGift {
                promotion_id: promotion.id,
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: self
                    .scaling
                    .granted_units(item.units_per_application(), times_applied),
            })
            .collect();

        debug!(
            promotion_id = %promotion.id,
            times_applied,
            gifts = gifts.len(),
            scaling = ?self.scaling,
            "resolved gift promotion"
        );

        GiftGrant {
            times_applied,
            gifts,
            conditions,
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::VND};

    use crate::promotions::{
        GiftItem,
        conditions::{ConditionDetail, ConditionGroup},
    };

    use super::*;

    fn quantities(entries: &[(u64, u32)]) -> CartQuantities {
        entries
            .iter()
            .map(|&(id, quantity)| (ProductId(id), quantity))
            .collect()
    }

    fn gift_promotion() -> PromotionDefinition<'static> {
        PromotionDefinition::gift(
            PromotionId(5),
            "Buy 2 get a mug",
            [ConditionGroup::all([ConditionDetail::new(ProductId(1), 2)])],
            [GiftItem::new(ProductId(9), 1).named("Mug")],
        )
    }

    fn quantities_of(grant: &GiftGrant) -> Vec<(ProductId, u32)> {
        grant
            .gifts
            .iter()
            .map(|gift| (gift.product_id, gift.quantity))
            .collect()
    }

    #[test]
    fn scaled_policy_multiplies_gift_quantity() {
        let resolver = GiftResolver::new(GroupCombination::OperatorAware, GiftScaling::Scaled);

        let grant = resolver.resolve(&gift_promotion(), &quantities(&[(1, 6)]));

        assert_eq!(grant.times_applied, 3);
        assert_eq!(quantities_of(&grant), vec![(ProductId(9), 3)]);
    }

    #[test]
    fn flat_policy_grants_once() {
        let resolver = GiftResolver::new(GroupCombination::OperatorAware, GiftScaling::Flat);

        assert_eq!(resolver.scaling(), GiftScaling::Flat);

        let grant = resolver.resolve(&gift_promotion(), &quantities(&[(1, 6)]));

        assert_eq!(grant.times_applied, 3);
        assert_eq!(quantities_of(&grant), vec![(ProductId(9), 1)]);
    }

    #[test]
    fn unsatisfied_conditions_grant_nothing() {
        let grant = GiftResolver::default().resolve(&gift_promotion(), &quantities(&[(1, 1)]));

        assert_eq!(grant.times_applied, 0);
        assert!(!grant.is_applied());
    }

    #[test]
    fn empty_conditions_grant_nothing() {
        let promotion = PromotionDefinition::gift(
            PromotionId(6),
            "Everyone gets a gift",
            [],
            [GiftItem::new(ProductId(9), 1)],
        );

        let grant = GiftResolver::default().resolve(&promotion, &quantities(&[(1, 10)]));

        assert!(!grant.is_applied());
    }

    #[test]
    fn discount_promotions_grant_no_gifts() {
        let mut promotion = PromotionDefinition::discount_amount(
            PromotionId(7),
            "Money off",
            Money::from_minor(1_000, VND),
            [ConditionGroup::all([ConditionDetail::new(ProductId(1), 1)])],
        );
        promotion.gift_items.push(GiftItem::new(ProductId(9), 1));

        let grant = GiftResolver::default().resolve(&promotion, &quantities(&[(1, 1)]));

        assert!(!grant.is_applied());
    }

    #[test]
    fn zero_quantity_gift_grants_one_per_application() {
        let promotion = PromotionDefinition::gift(
            PromotionId(8),
            "Sticker",
            [ConditionGroup::all([ConditionDetail::new(ProductId(1), 1)])],
            [GiftItem::new(ProductId(3), 0)],
        );

        let grant = GiftResolver::default().resolve(&promotion, &quantities(&[(1, 2)]));

        assert_eq!(quantities_of(&grant), vec![(ProductId(3), 2)]);
    }

    #[test]
    fn granted_units_saturates() {
        assert_eq!(GiftScaling::Scaled.granted_units(u32::MAX, 2), u32::MAX);
        assert_eq!(GiftScaling::Flat.granted_units(4, 0), 0);
    }
}
