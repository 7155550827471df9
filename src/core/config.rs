//! Enrichment configuration with documented defaults
//!
//! Every tunable of the enrichment layer lives here. A config file only needs
//! the keys it wants to change; everything else falls back to `Default`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::command::filter::FilterSpec;
use crate::core::error::{EnrichError, Result};
use crate::core::types::Timestamp;

/// Default correlation window after a construction (one minute)
pub const DEFAULT_CORRELATION_WINDOW_MS: Timestamp = 60_000;

/// Upper bound on the correlation window; beyond this every unit of the
/// match starts correlating with every building
pub const MAX_CORRELATION_WINDOW_MS: Timestamp = 10 * 60_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("correlation_window_ms must be greater than zero")]
    ZeroWindow,

    #[error("correlation_window_ms ({0}) exceeds the maximum of 600000")]
    WindowTooLarge(Timestamp),

    #[error("locale must not be empty")]
    EmptyLocale,
}

/// Configuration for one enrichment run
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    /// How long after a construction command a produced unit still counts as
    /// evidence for the new building's type (milliseconds)
    ///
    /// Production queues empty quickly once a building completes, so a short
    /// window keeps false correlations down.
    pub correlation_window_ms: Timestamp,

    /// Whether construction commands fall back to production-based inference
    /// when neither their own identifier nor the index correlation resolves
    pub entity_tracking: bool,

    /// Locale code of the string table (`locales/<locale>-locstring.json`)
    pub locale: String,

    /// Which command kinds appear in the filtered build-order view
    pub filter: FilterSpec,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            correlation_window_ms: DEFAULT_CORRELATION_WINDOW_MS,
            entity_tracking: true,
            locale: "en".to_string(),
            filter: FilterSpec::default(),
        }
    }
}

impl EnrichConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EnrichConfig = toml::from_str(content)?;
        config.validate()?;
        // Reject malformed filter specs here rather than at enrichment time
        config.filter.build()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EnrichError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.correlation_window_ms == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.correlation_window_ms > MAX_CORRELATION_WINDOW_MS {
            return Err(ConfigError::WindowTooLarge(self.correlation_window_ms));
        }
        if self.locale.trim().is_empty() {
            return Err(ConfigError::EmptyLocale);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandKind, FilterError};

    #[test]
    fn test_defaults_are_valid() {
        let config = EnrichConfig::default();
        assert_eq!(config.correlation_window_ms, 60_000);
        assert!(config.entity_tracking);
        assert_eq!(config.locale, "en");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EnrichConfig::from_toml_str("entity_tracking = false\n").unwrap();
        assert!(!config.entity_tracking);
        assert_eq!(config.correlation_window_ms, DEFAULT_CORRELATION_WINDOW_MS);
    }

    #[test]
    fn test_filter_section() {
        let toml = r#"
correlation_window_ms = 30000

[filter]
presets = ["combat"]
kinds = ["build_squad"]
"#;
        let config = EnrichConfig::from_toml_str(toml).unwrap();
        let filter = config.filter.build().unwrap();
        assert!(filter.includes(CommandKind::UseAbility));
        assert!(filter.includes(CommandKind::BuildSquad));
        assert!(!filter.includes(CommandKind::ConstructEntity));
    }

    #[test]
    fn test_custom_filter_presets() {
        let toml = r#"
[filter]
presets = ["openers"]

[[filter.custom]]
name = "openers"
description = "First squads and buildings"
kinds = ["build_squad", "construct_entity"]
"#;
        let config = EnrichConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.filter.custom[0].description, "First squads and buildings");
        let filter = config.filter.build().unwrap();
        assert_eq!(
            filter.included_kinds(),
            vec![CommandKind::BuildSquad, CommandKind::ConstructEntity]
        );

        let bad = "[[filter.custom]]\nname = \"tanks\"\nkinds = [\"build_tank\"]\n";
        assert!(matches!(
            EnrichConfig::from_toml_str(bad),
            Err(EnrichError::Filter(FilterError::UnknownKind(_)))
        ));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            EnrichConfig::from_toml_str("correlation_window_ms = 0"),
            Err(EnrichError::Config(ConfigError::ZeroWindow))
        ));
        assert!(matches!(
            EnrichConfig::from_toml_str("correlation_window_ms = 9999999"),
            Err(EnrichError::Config(ConfigError::WindowTooLarge(_)))
        ));
        assert!(matches!(
            EnrichConfig::from_toml_str("locale = \"  \""),
            Err(EnrichError::Config(ConfigError::EmptyLocale))
        ));
    }

    #[test]
    fn test_rejects_malformed_filter() {
        let result = EnrichConfig::from_toml_str("[filter]\npresets = [\"everything\"]\n");
        assert!(matches!(result, Err(EnrichError::Filter(_))));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            EnrichConfig::from_toml_str("windw = 3"),
            Err(EnrichError::ConfigParse(_))
        ));
    }
}
