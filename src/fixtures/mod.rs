//! Fixtures
//!
//! Named YAML fixture sets under `fixtures/{products,carts,promotions}/<name>.yml`.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    fixtures::{carts::CartFixture, products::ProductsFixture, promotions::PromotionsFixture},
    products::{Product, ProductId, ProductPrices},
    promotions::{PromotionDefinition, catalog::PromotionCatalog},
};

pub mod carts;
pub mod products;
pub mod promotions;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Two products share an id
    #[error("Duplicate product id: {0}")]
    DuplicateProductId(ProductId),

    /// Currency mismatch between products
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Product key -> product
    products: FxHashMap<String, Product<'a>>,

    /// Cart lines as `(product, quantity)`, in file order
    cart_lines: Vec<(ProductId, u32)>,

    /// Promotions in catalog order
    promotions: Vec<PromotionDefinition<'a>>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: FxHashMap::default(),
            cart_lines: Vec::new(),
            promotions: Vec::new(),
            currency: None,
        }
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if product ids repeat, or if
    /// products mix currencies.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = serde_norway::from_str(&self.read("products", name)?)?;

        for (key, product_fixture) in fixture.products {
            // Parse to get currency first (before creating Product)
            let (_minor_units, currency) = products::parse_price(&product_fixture.price)?;

            if let Some(existing) = self.currency {
                if existing != currency {
                    return Err(FixtureError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        currency.iso_alpha_code.to_string(),
                    ));
                }
            } else {
                self.currency = Some(currency);
            }

            let product: Product<'a> = product_fixture.try_into()?;

            if self.products.values().any(|existing| existing.id == product.id) {
                return Err(FixtureError::DuplicateProductId(product.id));
            }

            self.products.insert(key, product);
        }

        Ok(self)
    }

    /// Load cart lines from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if referenced products don't exist.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: CartFixture = serde_norway::from_str(&self.read("carts", name)?)?;

        for line in fixture.lines {
            let product_id = self.product(&line.product)?.id;

            self.cart_lines.push((product_id, line.quantity));
        }

        Ok(self)
    }

    /// Load promotions from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if referenced products don't exist.
    pub fn load_promotions(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: PromotionsFixture = serde_norway::from_str(&self.read("promotions", name)?)?;

        for promotion_fixture in fixture.promotions {
            let promotion = promotion_fixture.try_into_promotion(&self.products)?;

            self.promotions.push(promotion);
        }

        Ok(self)
    }

    /// Load a complete fixture set (products, cart, and promotions with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_products(name)?
            .load_cart(name)?
            .load_promotions(name)?;

        Ok(fixture)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, FixtureError> {
        self.products
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get a product id by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product_id(&self, key: &str) -> Result<ProductId, FixtureError> {
        Ok(self.product(key)?.id)
    }

    /// Display names by product id
    pub fn product_names(&self) -> FxHashMap<ProductId, String> {
        self.products
            .values()
            .map(|product| (product.id, product.name.clone()))
            .collect()
    }

    /// Prices by product id
    pub fn prices(&self) -> FxHashMap<ProductId, ProductPrices<'a>> {
        self.products
            .values()
            .map(|product| (product.id, product.prices))
            .collect()
    }

    /// Get all promotions
    pub fn promotions(&self) -> &[PromotionDefinition<'a>] {
        &self.promotions
    }

    /// Build a catalog snapshot of the loaded promotions
    pub fn catalog(&self) -> PromotionCatalog<'a> {
        self.promotions.iter().cloned().collect()
    }

    /// Create a cart from the loaded cart lines
    ///
    /// # Errors
    ///
    /// Returns an error if no products are loaded or if cart creation fails.
    pub fn cart(&self) -> Result<Cart<'a>, FixtureError> {
        let currency = self.currency()?;

        Ok(Cart::from_priced_lines(
            self.cart_lines.iter().copied(),
            &self.prices(),
            currency,
        )?)
    }

    /// Get the currency
    ///
    /// # Errors
    ///
    /// Returns an error if no products have been loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        self.currency.ok_or(FixtureError::NoCurrency)
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
