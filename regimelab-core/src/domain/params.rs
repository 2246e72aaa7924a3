//! ParameterSet — one candidate configuration of the breakout rule.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A parameter value outside its domain.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid parameter {field} = {value}: {reason}")]
pub struct ParameterError {
    pub field: &'static str,
    pub value: f64,
    pub reason: &'static str,
}

/// Parameters for a single back-test run.
///
/// Value object: created by the sampler, never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Lowest-low window. Must be >= 2.
    pub lookback: usize,
    /// ATR multiplier for the dynamic support line. Must be > 0.
    pub sensitivity: f64,
    /// Entry SMA window. Must be >= 2.
    pub ma_length: usize,
    /// Stop distance as a fraction of the entry price, in (0, 1).
    pub stop_loss_pct: f64,
    /// Target distance as a multiple of the stop distance. Must be > 0.
    pub risk_reward: f64,
}

impl ParameterSet {
    /// Check every field against its domain.
    pub fn validate(&self) -> Result<(), ParameterError> {
        if self.lookback < 2 {
            return Err(ParameterError {
                field: "lookback",
                value: self.lookback as f64,
                reason: "must be >= 2",
            });
        }
        if !(self.sensitivity.is_finite() && self.sensitivity > 0.0) {
            return Err(ParameterError {
                field: "sensitivity",
                value: self.sensitivity,
                reason: "must be finite and > 0",
            });
        }
        if self.ma_length < 2 {
            return Err(ParameterError {
                field: "ma_length",
                value: self.ma_length as f64,
                reason: "must be >= 2",
            });
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return Err(ParameterError {
                field: "stop_loss_pct",
                value: self.stop_loss_pct,
                reason: "must lie in (0, 1)",
            });
        }
        if !(self.risk_reward.is_finite() && self.risk_reward > 0.0) {
            return Err(ParameterError {
                field: "risk_reward",
                value: self.risk_reward,
                reason: "must be finite and > 0",
            });
        }
        Ok(())
    }

    /// Number of leading bars needed before every parameter-driven
    /// indicator is defined.
    pub fn warmup_bars(&self, atr_period: usize) -> usize {
        self.lookback.max(self.ma_length).max(atr_period)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lookback={}, sens={:.3}, ma={}, SL={:.3}, RR={:.3}",
            self.lookback, self.sensitivity, self.ma_length, self.stop_loss_pct, self.risk_reward
        )
    }
}
