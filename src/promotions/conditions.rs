//! Promotion Conditions
//!
//! Per-product quantity thresholds, grouped and combined with `ALL`/`ANY` operators.
//!
//! Every count here is "how many times is this satisfied": a detail counts once for every
//! whole multiple of its required quantity present in the cart.

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::{cart::CartQuantities, products::ProductId};

/// Boolean operator used to combine the details of one condition group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionOperator {
    /// Every detail must qualify; the group counts the minimum.
    All,

    /// Any detail may qualify; the group counts the maximum.
    Any,
}

/// Single per-product quantity threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDetail<'a> {
    /// Target product. `None` is malformed and never satisfied.
    pub product_id: Option<ProductId>,

    /// Units needed per application. Values `<= 0` are malformed and never satisfied.
    pub required_quantity: i64,

    /// Display-only product name
    pub product_name: Option<String>,

    /// Display-only product price
    pub product_price: Option<Money<'a, Currency>>,
}

impl ConditionDetail<'_> {
    /// Create a detail requiring `required_quantity` units of `product_id`.
    pub fn new(product_id: ProductId, required_quantity: i64) -> Self {
        Self {
            product_id: Some(product_id),
            required_quantity,
            product_name: None,
            product_price: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// Cart quantity of the target product, zero when absent.
    pub fn available_quantity(&self, quantities: &CartQuantities) -> u32 {
        self.product_id
            .and_then(|product_id| quantities.get(&product_id).copied())
            .unwrap_or(0)
    }

    /// How many whole multiples of the required quantity the cart holds.
    pub fn satisfied_count(&self, quantities: &CartQuantities) -> u32 {
        let Ok(required) = u32::try_from(self.required_quantity) else {
            return 0;
        };

        if required == 0 {
            return 0;
        }

        self.available_quantity(quantities) / required
    }

    /// Whether this detail names the given product.
    pub fn references(&self, product_id: ProductId) -> bool {
        self.product_id == Some(product_id)
    }
}

/// Set of details combined by one operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup<'a> {
    /// How `details` are combined
    pub operator: ConditionOperator,

    /// Thresholds in this group. An empty list is never satisfied.
    pub details: SmallVec<[ConditionDetail<'a>; 2]>,
}

/// Outcome of one detail, kept for display breakdowns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEvaluation {
    /// Target product
    pub product_id: Option<ProductId>,

    /// Display name, if known
    pub product_name: Option<String>,

    /// Units needed per application
    pub required_quantity: i64,

    /// Units present in the cart
    pub available_quantity: u32,

    /// Whole multiples of the requirement present in the cart
    pub satisfied_count: u32,
}

/// Outcome of one condition group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEvaluation {
    /// Operator the group was combined with
    pub operator: ConditionOperator,

    /// Group satisfaction count
    pub count: u32,

    /// Per-detail outcomes, in definition order
    pub details: SmallVec<[DetailEvaluation; 2]>,
}

impl<'a> ConditionGroup<'a> {
    /// Create a group from an operator and its details.
    pub fn new(
        operator: ConditionOperator,
        details: impl IntoIterator<Item = ConditionDetail<'a>>,
    ) -> Self {
        Self {
            operator,
            details: details.into_iter().collect(),
        }
    }

    /// Group requiring every detail.
    pub fn all(details: impl IntoIterator<Item = ConditionDetail<'a>>) -> Self {
        Self::new(ConditionOperator::All, details)
    }

    /// Group requiring any one detail.
    pub fn any(details: impl IntoIterator<Item = ConditionDetail<'a>>) -> Self {
        Self::new(ConditionOperator::Any, details)
    }

    /// How many times this group is satisfied by the cart.
    pub fn satisfaction_count(&self, quantities: &CartQuantities) -> u32 {
        let counts = self
            .details
            .iter()
            .map(|detail| detail.satisfied_count(quantities));

        let combined = match self.operator {
            ConditionOperator::All => counts.min(),
            ConditionOperator::Any => counts.max(),
        };

        combined.unwrap_or(0)
    }

    /// Evaluate the group, keeping per-detail outcomes.
    pub fn evaluate(&self, quantities: &CartQuantities) -> GroupEvaluation {
        let details = self
            .details
            .iter()
            .map(|detail| DetailEvaluation {
                product_id: detail.product_id,
                product_name: detail.product_name.clone(),
                required_quantity: detail.required_quantity,
                available_quantity: detail.available_quantity(quantities),
                satisfied_count: detail.satisfied_count(quantities),
            })
            .collect();

        let count = self.satisfaction_count(quantities);

        trace!(operator = ?self.operator, count, "evaluated condition group");

        GroupEvaluation {
            operator: self.operator,
            count,
            details,
        }
    }

    /// Whether any detail names the given product.
    pub fn references(&self, product_id: ProductId) -> bool {
        self.details.iter().any(|detail| detail.references(product_id))
    }
}

/// How the condition groups of one promotion are folded into a "times applied" count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupCombination {
    /// Each group honours its own operator; groups are then `AND`ed (minimum across groups).
    #[default]
    OperatorAware,

    /// Every detail of every group feeds one global minimum, ignoring group operators.
    LegacyFlatten,
}

/// Outcome of folding every group of one promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionsEvaluation {
    /// How many times the promotion fires
    pub times_applied: u32,

    /// Per-group outcomes, in definition order
    pub groups: Vec<GroupEvaluation>,
}

impl GroupCombination {
    /// Fold a promotion's groups into a "times applied" count.
    ///
    /// No groups means no product-quantity gating, which never auto-applies.
    pub fn times_applied(self, groups: &[ConditionGroup<'_>], quantities: &CartQuantities) -> u32 {
        match self {
            GroupCombination::OperatorAware => groups
                .iter()
                .map(|group| group.satisfaction_count(quantities))
                .min()
                .unwrap_or(0),
            GroupCombination::LegacyFlatten => {
                if groups.iter().any(|group| group.details.is_empty()) {
                    return 0;
                }

                groups
                    .iter()
                    .flat_map(|group| group.details.iter())
                    .map(|detail| detail.satisfied_count(quantities))
                    .min()
                    .unwrap_or(0)
            }
        }
    }

    /// Fold a promotion's groups, keeping per-group outcomes.
    pub fn evaluate(
        self,
        groups: &[ConditionGroup<'_>],
        quantities: &CartQuantities,
    ) -> ConditionsEvaluation {
        ConditionsEvaluation {
            times_applied: self.times_applied(groups, quantities),
            groups: groups.iter().map(|group| group.evaluate(quantities)).collect(),
        }
    }
}
