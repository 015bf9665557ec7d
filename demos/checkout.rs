//! Checkout Example
//!
//! Evaluates a fixture cart against its promotion catalog and prints the checkout summary,
//! followed by listing-card previews for any requested products.
//!
//! Use `-f` to load a fixture set by name
//! Use `-c` to load an engine configuration file
//! Use `-a` to evaluate at a given RFC 3339 instant
//! Use `-p` (repeatable) to preview a product by fixture key
//!
//! Set `RUST_LOG=promo_engine=debug` to see per-promotion evaluation logs.

use std::io;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use promo_engine::{
    aggregate::CartPromotionAggregator, config::EngineConfig, fixtures::Fixture,
    preview::PricePreviewCalculator, summary::write_summary, utils::CheckoutArgs,
};
use tracing_subscriber::EnvFilter;

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = CheckoutArgs::parse();
    let at = args.evaluation_instant(Utc::now());

    let config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let fixture = Fixture::from_set(&args.fixture)?;
    let catalog = fixture.catalog();
    let cart = fixture.cart()?;

    let result = CartPromotionAggregator::new(&config).evaluate(&catalog, &cart, at)?;

    write_summary(io::stdout(), &cart, &result, &fixture.product_names())?;

    let calculator = PricePreviewCalculator::new(&catalog);

    for key in &args.preview {
        let product = fixture.product(key)?;
        let preview = calculator.preview(product.id, product.prices.effective_price(), at);

        let badge = match (preview.discount_percent, preview.is_gift_eligible) {
            (Some(percent), _) => format!(" (-{percent}%)"),
            (None, true) => " (free gift)".to_string(),
            (None, false) => String::new(),
        };

        println!("{}: {}{badge}", product.name, preview.final_price);
    }

    Ok(())
}
