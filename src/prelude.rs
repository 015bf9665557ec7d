//! Promo Engine prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    aggregate::{
        AggregateResult, AppliedPromotion, CartPromotionAggregator, CheckoutTotals,
        DiscountStacking,
    },
    cart::{Cart, CartError, CartLine, CartQuantities},
    config::{ConfigError, EngineConfig},
    discounts::{DiscountAggregator, DiscountContribution},
    gifts::{GiftGrant, GiftResolver, GiftScaling, GrantedGift},
    preview::{PricePreviewCalculator, PreviewResult},
    products::{Product, ProductId, ProductPrices},
    promotions::{
        DiscountType, GiftItem, PromotionDefinition, PromotionId, ValidityWindow,
        catalog::PromotionCatalog,
        conditions::{
            ConditionDetail, ConditionGroup, ConditionOperator, ConditionsEvaluation,
            GroupCombination, GroupEvaluation,
        },
    },
    summary::{SummaryError, write_summary},
};
