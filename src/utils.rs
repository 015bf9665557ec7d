//! Utils

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

/// Arguments for the checkout demo
#[derive(Debug, Parser)]
pub struct CheckoutArgs {
    /// Fixture set to use for the products, cart & promotions
    #[clap(short, long, default_value = "tea_shop")]
    pub fixture: String,

    /// Engine configuration file (YAML); defaults apply when omitted
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Evaluation instant (RFC 3339); defaults to now
    #[clap(short, long)]
    pub at: Option<DateTime<Utc>>,

    /// Products to preview as listing cards, by fixture key
    #[clap(short, long)]
    pub preview: Vec<String>,
}

impl CheckoutArgs {
    /// Evaluation instant, falling back to `now`.
    pub fn evaluation_instant(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.at.unwrap_or(now)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults_to_tea_shop_fixture() -> TestResult {
        let args = CheckoutArgs::try_parse_from(["checkout"])?;

        assert_eq!(args.fixture, "tea_shop");
        assert!(args.config.is_none());
        assert!(args.preview.is_empty());

        Ok(())
    }

    #[test]
    fn parses_instant_and_previews() -> TestResult {
        let args = CheckoutArgs::try_parse_from([
            "checkout",
            "--at",
            "2025-06-01T12:00:00Z",
            "-p",
            "tea",
            "-p",
            "cake",
        ])?;

        let at = DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")?.with_timezone(&Utc);

        assert_eq!(args.evaluation_instant(Utc::now()), at);
        assert_eq!(args.preview, vec!["tea".to_string(), "cake".to_string()]);

        Ok(())
    }
}
