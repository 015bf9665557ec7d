//! Promotion Catalog
//!
//! The host fetches active promotions and hands the engine a catalog value on every call.

use chrono::{DateTime, Utc};

use crate::promotions::{PromotionDefinition, PromotionId};

/// Ordered list of promotion definitions. Catalog order is significant for previews.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromotionCatalog<'a> {
    promotions: Vec<PromotionDefinition<'a>>,
}

impl<'a> PromotionCatalog<'a> {
    /// Create a catalog from definitions, keeping their order.
    pub fn new(promotions: impl Into<Vec<PromotionDefinition<'a>>>) -> Self {
        Self {
            promotions: promotions.into(),
        }
    }

    /// Every definition, in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &PromotionDefinition<'a>> {
        self.promotions.iter()
    }

    /// Definitions that are active and inside their validity window at `at`, in catalog order.
    pub fn live_at(&self, at: DateTime<Utc>) -> impl Iterator<Item = &PromotionDefinition<'a>> {
        self.promotions
            .iter()
            .filter(move |promotion| promotion.is_live(at))
    }

    /// Look up a definition by id.
    pub fn get(&self, id: PromotionId) -> Option<&PromotionDefinition<'a>> {
        self.promotions.iter().find(|promotion| promotion.id == id)
    }

    /// Number of definitions in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.promotions.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.promotions.is_empty()
    }
}

impl<'a> FromIterator<PromotionDefinition<'a>> for PromotionCatalog<'a> {
    fn from_iter<I: IntoIterator<Item = PromotionDefinition<'a>>>(iter: I) -> Self {
        Self {
            promotions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::VND};

    use super::*;

    #[test]
    fn live_at_skips_inactive_promotions() {
        let catalog: PromotionCatalog<'_> = [
            PromotionDefinition::discount_amount(
                PromotionId(1),
                "Live",
                Money::from_minor(100, VND),
                [],
            ),
            PromotionDefinition::discount_amount(
                PromotionId(2),
                "Paused",
                Money::from_minor(100, VND),
                [],
            )
            .with_active(false),
        ]
        .into_iter()
        .collect();

        let live: Vec<PromotionId> = catalog.live_at(Utc::now()).map(|p| p.id).collect();

        assert_eq!(catalog.len(), 2);
        assert_eq!(live, vec![PromotionId(1)]);
    }

    #[test]
    fn get_finds_by_id() {
        let catalog = PromotionCatalog::new(vec![PromotionDefinition::gift(
            PromotionId(7),
            "Gift",
            [],
            [],
        )]);

        assert_eq!(catalog.get(PromotionId(7)).map(|p| p.name.as_str()), Some("Gift"));
        assert!(catalog.get(PromotionId(8)).is_none());
    }
}
