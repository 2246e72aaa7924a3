//! Search configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [data]
//! symbol = "GDX.AX"
//! period = "90d"
//! interval = "1h"
//!
//! [search]
//! trials = 50000
//! top_k = 10
//! seed = 42            # omit for an entropy-drawn seed
//! workers = 0          # 0 = one per logical CPU
//! task_timeout_ms = 5000
//!
//! [ranges]
//! lookback = { min = 2, max = 200 }
//! sensitivity = { min = 0.5, max = 3.0 }
//!
//! [strategy]
//! atr_period = 14
//!
//! [strategy.regime]
//! fast_period = 20
//! slow_period = 50
//! min_atr_fraction = 0.001
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::data::FetchRequest;
use regimelab_core::engine::EngineConfig;
use regimelab_core::sampler::ParameterRanges;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid range for {field}: [{min}, {max}]")]
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Where bars come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub symbol: String,
    /// Trailing window, e.g. `"90d"`.
    pub period: String,
    /// Bar size, e.g. `"1h"`.
    pub interval: String,
    /// Read bars from this CSV file instead of the network.
    pub csv: Option<PathBuf>,
    /// Fall back to synthetic bars when real data cannot be loaded.
    pub synthetic_fallback: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            symbol: "GDX.AX".into(),
            period: "90d".into(),
            interval: "1h".into(),
            csv: None,
            synthetic_fallback: false,
        }
    }
}

impl DataConfig {
    pub fn request(&self) -> FetchRequest {
        FetchRequest::new(&self.symbol, &self.period, &self.interval)
    }
}

/// Search budget and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Number of parameter sets to draw and evaluate.
    pub trials: usize,
    /// How many ranked results to keep.
    pub top_k: usize,
    /// Sampler seed. `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// Worker threads; 0 means one per logical CPU.
    pub workers: usize,
    /// Wall-time budget per back-test; exceeding it discards that result.
    pub task_timeout_ms: Option<u64>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            trials: 50_000,
            top_k: 10,
            seed: None,
            workers: 0,
            task_timeout_ms: None,
        }
    }
}

/// Complete configuration for one search run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub data: DataConfig,
    pub search: SearchSettings,
    pub ranges: ParameterRanges,
    pub strategy: EngineConfig,
}

impl SearchConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Reject empty ranges, bounds outside a parameter's domain, and
    /// zero-length windows, so that every sampled set is valid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let r = &self.ranges;

        for (field, range) in [("lookback", r.lookback), ("ma_length", r.ma_length)] {
            if range.is_empty() || range.min < 2 {
                return Err(ConfigError::InvalidRange {
                    field,
                    min: range.min as f64,
                    max: range.max as f64,
                });
            }
        }

        let float_ranges = [
            ("sensitivity", r.sensitivity, r.sensitivity.min > 0.0),
            (
                "stop_loss_pct",
                r.stop_loss_pct,
                r.stop_loss_pct.min > 0.0 && r.stop_loss_pct.max < 1.0,
            ),
            ("risk_reward", r.risk_reward, r.risk_reward.min > 0.0),
        ];
        for (field, range, in_domain) in float_ranges {
            if range.is_empty() || !in_domain {
                return Err(ConfigError::InvalidRange {
                    field,
                    min: range.min,
                    max: range.max,
                });
            }
        }

        if self.search.top_k == 0 {
            return Err(invalid("search.top_k", "must be at least 1"));
        }

        let s = &self.strategy;
        if s.atr_period == 0 {
            return Err(invalid("strategy.atr_period", "must be at least 1"));
        }
        if s.regime.fast_period == 0 || s.regime.slow_period == 0 {
            return Err(invalid("strategy.regime", "SMA periods must be at least 1"));
        }
        if s.regime.trend_period == Some(0) {
            return Err(invalid("strategy.regime.trend_period", "must be at least 1"));
        }
        if !(s.regime.min_atr_fraction.is_finite() && s.regime.min_atr_fraction >= 0.0) {
            return Err(invalid(
                "strategy.regime.min_atr_fraction",
                "must be finite and non-negative",
            ));
        }

        if self.data.csv.is_none() && self.data.symbol.trim().is_empty() {
            return Err(invalid("data.symbol", "must not be empty"));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
