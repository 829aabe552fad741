//! TOML configuration
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration. Unknown keys are rejected so that typos surface as
//! errors instead of silently falling back to defaults.
//!
//! Entrypoints: [`ForecastConfig::load_str`] and [`ForecastConfig::load_path`].

use crate::catalog::{default_symbols, find_symbol};
use crate::data::Lookback;
use crate::error::{ForecastError, Result};
use crate::models::additive::AdditiveConfig;
use crate::models::{Horizon, SeasonalityOptions};
use crate::series::DEFAULT_MIN_OBSERVATIONS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// Directory holding `<SYMBOL>.csv` files
    pub data_dir: PathBuf,
    /// History window in calendar days
    pub lookback_days: u32,
    /// Horizon used when none is given on the command line
    pub default_horizon: i64,
    /// Fewest usable observations accepted for a fit
    pub min_observations: usize,
    /// Symbols a forecast may be requested for
    pub symbols: Vec<String>,
    pub seasonality: SeasonalityOptions,
    pub model: AdditiveConfig,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            lookback_days: Lookback::default().days,
            default_horizon: 30,
            min_observations: DEFAULT_MIN_OBSERVATIONS,
            symbols: default_symbols(),
            seasonality: SeasonalityOptions::default(),
            model: AdditiveConfig::default(),
        }
    }
}

impl ForecastConfig {
    /// Parse and validate a TOML string
    pub fn load_str(s: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::load_str(&text)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(ForecastError::InvalidParameter(
                "lookback_days must be at least 1".to_string(),
            ));
        }
        if self.min_observations < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "min_observations must be at least 2, got {}",
                self.min_observations
            )));
        }
        if self.symbols.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "symbols must not be empty".to_string(),
            ));
        }
        Horizon::new(self.default_horizon)?;
        self.seasonality.daily()?;
        self.model.validate()
    }

    pub fn lookback(&self) -> Lookback {
        Lookback::days(self.lookback_days)
    }

    /// Resolve `symbol` against the configured catalog
    pub fn resolve_symbol(&self, symbol: &str) -> Result<String> {
        find_symbol(&self.symbols, symbol)
            .map(str::to_string)
            .ok_or_else(|| {
                ForecastError::DataSourceError(format!("'{}' is not in the symbol catalog", symbol))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = ForecastConfig::load_str("").unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.lookback_days, 1461);
        assert_eq!(config.symbols.len(), 50);
    }

    #[test]
    fn test_resolve_symbol() {
        let config = ForecastConfig::default();
        assert_eq!(config.resolve_symbol("akbnk.is").unwrap(), "AKBNK.IS");
        assert!(matches!(
            config.resolve_symbol("MSFT"),
            Err(ForecastError::DataSourceError(_))
        ));
    }
}
