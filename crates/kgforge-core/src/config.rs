//! Pipeline configuration

use crate::error::Error;
use crate::error::Result;
use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

/// Configuration for one extraction pipeline
///
/// The existing-entity caps bound how much prior-graph context gets
/// rendered into prompts; tune them per deployment if prompts run long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Maximum acceptable orphan rate, in [0, 1]
    pub orphan_threshold: f64,
    /// Bound on the relationship retry loop
    pub max_retries: u32,
    /// Maximum existing-entity references listed per type in prompts
    pub max_existing_per_type: usize,
    /// Maximum existing-entity references listed in total in prompts
    pub max_existing_total: usize,
    /// Character cap on existing-entity descriptions in prompts
    pub existing_description_limit: usize,
    /// Character cap on candidate-entity descriptions in prompts
    pub entity_description_limit: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            orphan_threshold: 0.3,
            max_retries: 3,
            max_existing_per_type: 10,
            max_existing_total: 50,
            existing_description_limit: 100,
            entity_description_limit: 80,
        }
    }
}

impl ExtractionConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.orphan_threshold) {
            return Err(Error::configuration(format!(
                "orphan_threshold must be in [0, 1], got {}",
                self.orphan_threshold
            )));
        }
        if self.max_retries == 0 {
            return Err(Error::configuration("max_retries must be at least 1"));
        }
        if self.max_existing_per_type == 0 || self.max_existing_total == 0 {
            return Err(Error::configuration(
                "existing-entity prompt caps must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Update configuration from `KGFORGE_*` environment variables
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env(&mut self) {
        apply_env("KGFORGE_ORPHAN_THRESHOLD", &mut self.orphan_threshold);
        apply_env("KGFORGE_MAX_RETRIES", &mut self.max_retries);
        apply_env(
            "KGFORGE_MAX_EXISTING_PER_TYPE",
            &mut self.max_existing_per_type,
        );
        apply_env("KGFORGE_MAX_EXISTING_TOTAL", &mut self.max_existing_total);
    }
}

fn apply_env<T>(key: &str, slot: &mut T)
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = std::env::var(key) {
        match raw.parse::<T>() {
            Ok(value) => *slot = value,
            Err(e) => warn!("Ignoring unparseable {}={}: {}", key, raw, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.orphan_threshold, 0.3);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_existing_per_type, 10);
        assert_eq!(config.max_existing_total, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_threshold() {
        let config = ExtractionConfig {
            orphan_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ExtractionConfig {
            orphan_threshold: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_retries() {
        let config = ExtractionConfig {
            max_retries: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("KGFORGE_ORPHAN_THRESHOLD", "0.5");
        std::env::set_var("KGFORGE_MAX_RETRIES", "not-a-number");

        let mut config = ExtractionConfig::default();
        config.from_env();

        assert_eq!(config.orphan_threshold, 0.5);
        // Bad value is ignored, default stands
        assert_eq!(config.max_retries, 3);

        std::env::remove_var("KGFORGE_ORPHAN_THRESHOLD");
        std::env::remove_var("KGFORGE_MAX_RETRIES");
    }
}
