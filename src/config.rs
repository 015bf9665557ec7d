//! Engine Configuration
//!
//! Policy switches for the points where evaluation behaviour is a product decision rather than a
//! fixed rule. Defaults follow the operator-aware, scaled, additive behaviour.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    aggregate::DiscountStacking, gifts::GiftScaling, promotions::conditions::GroupCombination,
};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading a configuration file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),
}

/// Evaluation policies shared by every engine entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// How a promotion's condition groups fold into a times-applied count
    pub group_combination: GroupCombination,

    /// Whether gift quantities scale with times applied
    pub gift_scaling: GiftScaling,

    /// How several qualifying monetary promotions combine
    pub stacking: DiscountStacking,
}

impl EngineConfig {
    /// Parse a configuration from YAML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the document is not a valid configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Read and parse a YAML configuration file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use testresult::TestResult;

    use super::*;

    #[test]
    fn defaults_are_operator_aware_scaled_additive() {
        let config = EngineConfig::default();

        assert_eq!(config.group_combination, GroupCombination::OperatorAware);
        assert_eq!(config.gift_scaling, GiftScaling::Scaled);
        assert_eq!(config.stacking, DiscountStacking::Additive);
    }

    #[test]
    fn parses_partial_yaml() -> TestResult {
        let config = EngineConfig::from_yaml_str("gift_scaling: flat\n")?;

        assert_eq!(config.gift_scaling, GiftScaling::Flat);
        assert_eq!(config.group_combination, GroupCombination::OperatorAware);

        Ok(())
    }

    #[test]
    fn parses_every_policy() -> TestResult {
        let config = EngineConfig::from_yaml_str(
            "group_combination: legacy_flatten\ngift_scaling: scaled\nstacking: best_only\n",
        )?;

        assert_eq!(
            config,
            EngineConfig {
                group_combination: GroupCombination::LegacyFlatten,
                gift_scaling: GiftScaling::Scaled,
                stacking: DiscountStacking::BestOnly,
            }
        );

        Ok(())
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = EngineConfig::from_yaml_str("stackng: best_only\n");

        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn loads_from_file() -> TestResult {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "stacking: best_only")?;

        let config = EngineConfig::from_path(file.path())?;

        assert_eq!(config.stacking, DiscountStacking::BestOnly);

        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = EngineConfig::from_path("/definitely/not/here.yml");

        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
