//! Promotion Fixtures

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    fixtures::{FixtureError, products::parse_money},
    products::Product,
    promotions::{
        DiscountType, GiftItem, PromotionDefinition, PromotionId, ValidityWindow,
        conditions::{ConditionDetail, ConditionGroup, ConditionOperator},
    },
};

/// Wrapper for promotions in YAML, in catalog order
#[derive(Debug, Deserialize)]
pub struct PromotionsFixture {
    /// Promotion fixtures
    pub promotions: Vec<PromotionFixture>,
}

/// Promotion fixture from YAML
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromotionFixture {
    /// Promotion id
    pub id: u64,

    /// Promotion name
    pub name: String,

    /// `DISCOUNT_AMOUNT` or `GIFT`
    pub discount_type: DiscountType,

    /// Fixed amount per application (e.g., "5000 VND")
    #[serde(default)]
    pub discount_amount: Option<String>,

    /// Whether the promotion is switched on
    #[serde(default = "default_active")]
    pub is_active: bool,

    /// Inclusive start of the validity window
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,

    /// Inclusive end of the validity window
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,

    /// Condition groups
    #[serde(default)]
    pub conditions: Vec<ConditionGroupFixture>,

    /// Gift lines
    #[serde(default)]
    pub gift_items: Vec<GiftItemFixture>,
}

fn default_active() -> bool {
    true
}

/// Condition group fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionGroupFixture {
    /// `ALL` or `ANY`
    pub operator: ConditionOperator,

    /// Product thresholds
    #[serde(default)]
    pub details: Vec<ConditionDetailFixture>,
}

/// Condition detail fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionDetailFixture {
    /// Product key; omitted to model a detail with no product
    #[serde(default)]
    pub product: Option<String>,

    /// Units needed per application
    pub required_quantity: i64,
}

/// Gift item fixture
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GiftItemFixture {
    /// Product key
    pub product: String,

    /// Units per application; zero means one
    #[serde(default)]
    pub quantity: u32,
}

impl PromotionFixture {
    /// Convert to a `PromotionDefinition`, resolving product keys against loaded products.
    ///
    /// # Errors
    ///
    /// Returns an error if a product key is unknown or the discount amount is not a price.
    pub fn try_into_promotion<'a>(
        self,
        products: &FxHashMap<String, Product<'a>>,
    ) -> Result<PromotionDefinition<'a>, FixtureError> {
        let discount_amount = self
            .discount_amount
            .as_deref()
            .map(parse_money)
            .transpose()?;

        let conditions = self
            .conditions
            .into_iter()
            .map(|group| group.try_into_group(products))
            .collect::<Result<_, _>>()?;

        let gift_items = self
            .gift_items
            .into_iter()
            .map(|gift| {
                let product = lookup(products, &gift.product)?;

                Ok(GiftItem::new(product.id, gift.quantity).named(product.name.clone()))
            })
            .collect::<Result<_, FixtureError>>()?;

        Ok(PromotionDefinition {
            id: PromotionId(self.id),
            name: self.name,
            discount_type: self.discount_type,
            discount_amount,
            is_active: self.is_active,
            validity: ValidityWindow::between(self.starts_at, self.ends_at),
            conditions,
            gift_items,
        })
    }
}

impl ConditionGroupFixture {
    fn try_into_group<'a>(
        self,
        products: &FxHashMap<String, Product<'a>>,
    ) -> Result<ConditionGroup<'a>, FixtureError> {
        let details = self
            .details
            .into_iter()
            .map(|detail| match detail.product {
                Some(key) => {
                    let product = lookup(products, &key)?;

                    Ok(ConditionDetail {
                        product_id: Some(product.id),
                        required_quantity: detail.required_quantity,
                        product_name: Some(product.name.clone()),
                        product_price: Some(product.prices.reference_price),
                    })
                }
                None => Ok(ConditionDetail {
                    product_id: None,
                    required_quantity: detail.required_quantity,
                    product_name: None,
                    product_price: None,
                }),
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        Ok(ConditionGroup::new(self.operator, details))
    }
}

fn lookup<'p, 'a>(
    products: &'p FxHashMap<String, Product<'a>>,
    key: &str,
) -> Result<&'p Product<'a>, FixtureError> {
    products
        .get(key)
        .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::VND};
    use testresult::TestResult;

    use crate::products::{ProductId, ProductPrices};

    use super::*;

    fn products() -> FxHashMap<String, Product<'static>> {
        let mut products = FxHashMap::default();

        products.insert(
            "tea".to_string(),
            Product {
                id: ProductId(1),
                name: "Green Tea".to_string(),
                prices: ProductPrices::new(Money::from_minor(45_000, VND)),
            },
        );

        products
    }

    #[test]
    fn converts_discount_promotion() -> TestResult {
        let fixture: PromotionsFixture = serde_norway::from_str(
            r"
promotions:
  - id: 7
    name: Tea bundle
    discount_type: DISCOUNT_AMOUNT
    discount_amount: 5000 VND
    starts_at: 2025-06-01T00:00:00Z
    conditions:
      - operator: ALL
        details:
          - product: tea
            required_quantity: 3
",
        )?;

        let promotion = fixture
            .promotions
            .into_iter()
            .next()
            .ok_or("missing promotion")?
            .try_into_promotion(&products())?;

        assert_eq!(promotion.id, PromotionId(7));
        assert_eq!(promotion.discount_amount, Some(Money::from_minor(5_000, VND)));
        assert!(promotion.is_active);
        assert!(promotion.validity.starts_at.is_some());
        assert!(promotion.references_product(ProductId(1)));

        let detail = promotion
            .conditions
            .first()
            .and_then(|group| group.details.first())
            .ok_or("missing detail")?;

        assert_eq!(detail.product_name.as_deref(), Some("Green Tea"));
        assert_eq!(detail.required_quantity, 3);

        Ok(())
    }

    #[test]
    fn unknown_product_key_is_rejected() -> TestResult {
        let fixture: PromotionFixture = serde_norway::from_str(
            r"
id: 1
name: Mystery
discount_type: GIFT
gift_items:
  - product: mug
",
        )?;

        let result = fixture.try_into_promotion(&products());

        assert!(matches!(result, Err(FixtureError::ProductNotFound(key)) if key == "mug"));

        Ok(())
    }

    #[test]
    fn unknown_discount_type_fails_to_parse() {
        let result: Result<PromotionFixture, _> = serde_norway::from_str(
            "id: 1\nname: Odd\ndiscount_type: PERCENTAGE\n",
        );

        assert!(result.is_err());
    }
}
