//! Promotions
//!
//! Read-only promotion definitions, rebuilt from the host's latest data on every evaluation pass.

use std::fmt;

use chrono::{DateTime, Utc};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    cart::CartQuantities,
    products::ProductId,
    promotions::conditions::{ConditionGroup, ConditionsEvaluation, GroupCombination},
};

pub mod catalog;
pub mod conditions;

/// Promotion identifier, as issued by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionId(pub u64);

impl fmt::Display for PromotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a promotion grants once its conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// Fixed monetary amount off the order, per application
    DiscountAmount,

    /// Free gift lines
    Gift,
}

/// Inclusive validity window. Open bounds are unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    /// First instant the promotion is valid
    pub starts_at: Option<DateTime<Utc>>,

    /// Last instant the promotion is valid
    pub ends_at: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// A window with no bounds.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            starts_at: None,
            ends_at: None,
        }
    }

    /// A window between two optional bounds.
    #[must_use]
    pub const fn between(starts_at: Option<DateTime<Utc>>, ends_at: Option<DateTime<Utc>>) -> Self {
        Self { starts_at, ends_at }
    }

    /// Whether `at` falls inside the window.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.starts_at.is_none_or(|start| at >= start) && self.ends_at.is_none_or(|end| at <= end)
    }
}

/// Free product granted by a `GIFT` promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftItem {
    /// Gift product
    pub product_id: ProductId,

    /// Units granted per qualifying application. Zero is read as one.
    pub quantity: u32,

    /// Display-only product name
    pub product_name: Option<String>,
}

impl GiftItem {
    /// Create a gift item.
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            product_name: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// Units granted per application, defaulting an unset quantity to one.
    pub fn units_per_application(&self) -> u32 {
        self.quantity.max(1)
    }
}

/// Immutable promotion snapshot used for one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionDefinition<'a> {
    /// Promotion identifier
    pub id: PromotionId,

    /// Display name
    pub name: String,

    /// Discount or gift
    pub discount_type: DiscountType,

    /// Amount off per application, only meaningful for [`DiscountType::DiscountAmount`]
    pub discount_amount: Option<Money<'a, Currency>>,

    /// Inactive promotions are never evaluated
    pub is_active: bool,

    /// Period during which the promotion may fire
    pub validity: ValidityWindow,

    /// Condition groups, `AND`ed together. Empty means display-only.
    pub conditions: SmallVec<[ConditionGroup<'a>; 2]>,

    /// Gift lines, only meaningful for [`DiscountType::Gift`]
    pub gift_items: SmallVec<[GiftItem; 2]>,
}

impl<'a> PromotionDefinition<'a> {
    /// Create an active, always-valid fixed amount promotion.
    pub fn discount_amount(
        id: PromotionId,
        name: impl Into<String>,
        amount: Money<'a, Currency>,
        conditions: impl IntoIterator<Item = ConditionGroup<'a>>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            discount_type: DiscountType::DiscountAmount,
            discount_amount: Some(amount),
            is_active: true,
            validity: ValidityWindow::always(),
            conditions: conditions.into_iter().collect(),
            gift_items: SmallVec::new(),
        }
    }

    /// Create an active, always-valid gift promotion.
    pub fn gift(
        id: PromotionId,
        name: impl Into<String>,
        conditions: impl IntoIterator<Item = ConditionGroup<'a>>,
        gift_items: impl IntoIterator<Item = GiftItem>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            discount_type: DiscountType::Gift,
            discount_amount: None,
            is_active: true,
            validity: ValidityWindow::always(),
            conditions: conditions.into_iter().collect(),
            gift_items: gift_items.into_iter().collect(),
        }
    }

    /// Replace the validity window.
    #[must_use]
    pub fn with_validity(mut self, validity: ValidityWindow) -> Self {
        self.validity = validity;
        self
    }

    /// Mark the promotion active or inactive.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Whether the promotion is active and inside its validity window at `at`.
    pub fn is_live(&self, at: DateTime<Utc>) -> bool {
        self.is_active && self.validity.contains(at)
    }

    /// The discount amount, if this is a fixed amount promotion with a positive amount.
    pub fn usable_discount_amount(&self) -> Option<Money<'a, Currency>> {
        match self.discount_type {
            DiscountType::DiscountAmount => self
                .discount_amount
                .filter(|amount| amount.to_minor_units() > 0),
            DiscountType::Gift => None,
        }
    }

    /// Whether any condition detail names the product. Quantities are not consulted.
    pub fn references_product(&self, product_id: ProductId) -> bool {
        self.conditions
            .iter()
            .any(|group| group.references(product_id))
    }

    /// Evaluate this promotion's conditions against cart quantities.
    pub fn evaluate_conditions(
        &self,
        combination: GroupCombination,
        quantities: &CartQuantities,
    ) -> ConditionsEvaluation {
        combination.evaluate(&self.conditions, quantities)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::VND;
    use testresult::TestResult;

    use crate::promotions::conditions::ConditionDetail;

    use super::*;

    fn instant(day: u32) -> TestResult<DateTime<Utc>> {
        let parsed = DateTime::parse_from_rfc3339(&format!("2025-06-{day:02}T12:00:00Z"))?;

        Ok(parsed.with_timezone(&Utc))
    }

    #[test]
    fn validity_window_is_inclusive() -> TestResult {
        let window = ValidityWindow::between(Some(instant(10)?), Some(instant(20)?));

        assert!(!window.contains(instant(9)?));
        assert!(window.contains(instant(10)?));
        assert!(window.contains(instant(20)?));
        assert!(!window.contains(instant(21)?));

        Ok(())
    }

    #[test]
    fn open_window_always_contains() -> TestResult {
        assert!(ValidityWindow::always().contains(instant(1)?));
        assert!(ValidityWindow::between(None, Some(instant(5)?)).contains(instant(1)?));

        Ok(())
    }

    #[test]
    fn inactive_promotion_is_not_live() -> TestResult {
        let promotion = PromotionDefinition::discount_amount(
            PromotionId(1),
            "Off",
            Money::from_minor(1_000, VND),
            [],
        )
        .with_active(false);

        assert!(!promotion.is_live(instant(1)?));

        Ok(())
    }

    #[test]
    fn usable_discount_amount_rejects_non_positive_amounts() {
        let zero = PromotionDefinition::discount_amount(
            PromotionId(1),
            "Zero",
            Money::from_minor(0, VND),
            [],
        );
        let negative = PromotionDefinition::discount_amount(
            PromotionId(2),
            "Negative",
            Money::from_minor(-5, VND),
            [],
        );
        let positive = PromotionDefinition::discount_amount(
            PromotionId(3),
            "Positive",
            Money::from_minor(5, VND),
            [],
        );

        assert_eq!(zero.usable_discount_amount(), None);
        assert_eq!(negative.usable_discount_amount(), None);
        assert_eq!(
            positive.usable_discount_amount(),
            Some(Money::from_minor(5, VND))
        );
    }

    #[test]
    fn gift_promotion_has_no_discount_amount() {
        let mut promotion = PromotionDefinition::gift(PromotionId(1), "Gift", [], []);
        promotion.discount_amount = Some(Money::from_minor(5, VND));

        assert_eq!(promotion.usable_discount_amount(), None);
    }

    #[test]
    fn references_product_scans_every_group() {
        let promotion = PromotionDefinition::gift(
            PromotionId(1),
            "Gift",
            [
                ConditionGroup::all([ConditionDetail::new(ProductId(1), 1)]),
                ConditionGroup::any([ConditionDetail::new(ProductId(2), 5)]),
            ],
            [GiftItem::new(ProductId(9), 1)],
        );

        assert!(promotion.references_product(ProductId(2)));
        assert!(!promotion.references_product(ProductId(9)));
    }

    #[test]
    fn gift_item_zero_quantity_grants_one() {
        assert_eq!(GiftItem::new(ProductId(1), 0).units_per_application(), 1);
        assert_eq!(GiftItem::new(ProductId(1), 3).units_per_application(), 3);
    }
}
