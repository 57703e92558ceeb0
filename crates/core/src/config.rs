//! Configuration structures for the cLab minute-factor engine.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instrument configuration.
    pub instrument: InstrumentConfig,
    /// Canonical dataset names.
    pub datasets: DatasetNames,
    /// Factor evaluation defaults.
    pub evaluation: EvaluationConfig,
}

impl Config {
    /// Parse a JSON document. Missing sections fall back to defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.instrument.symbol.trim().is_empty() {
            return Err(Error::config("instrument.symbol must not be empty"));
        }
        self.evaluation.validate()
    }
}

/// Instrument-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Trading symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// Exchange name.
    pub exchange: String,
    /// Bucket interval label.
    pub interval: String,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            exchange: "binance".to_string(),
            interval: "1m".to_string(),
        }
    }
}

/// Dataset names used by the storage layout. Keep these stable; add new
/// ones instead of renaming.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetNames {
    pub ticker_price: String,
    pub aggtrades_raw: String,
    pub trade_features_1m: String,
    pub bars_1m: String,
}

impl Default for DatasetNames {
    fn default() -> Self {
        Self {
            ticker_price: "ticker_price".to_string(),
            aggtrades_raw: "aggtrades_raw".to_string(),
            trade_features_1m: "trade_features_1m".to_string(),
            bars_1m: "bars_1m".to_string(),
        }
    }
}

/// Factor evaluation defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Price column used for forward returns.
    pub price_col: String,
    /// Look-ahead in minute buckets.
    pub horizon: usize,
    /// Requested number of quantile buckets.
    pub n_quantiles: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            price_col: "close".to_string(),
            horizon: 60,
            n_quantiles: 5,
        }
    }
}

impl EvaluationConfig {
    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.price_col.trim().is_empty() {
            return Err(Error::config("evaluation.price_col must not be empty"));
        }
        if self.horizon == 0 {
            return Err(Error::config("evaluation.horizon must be > 0"));
        }
        if self.n_quantiles == 0 {
            return Err(Error::config("evaluation.n_quantiles must be > 0"));
        }
        Ok(())
    }
}
