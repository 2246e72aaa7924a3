//! Indicator engine.
//!
//! Every indicator is a pure function of the bar history that produces one
//! value per bar. Undefined (warm-up) values are `f64::NAN`; readers go
//! through [`IndicatorSeries`] accessors, which turn NaN into `None`.
//! All series are computed incrementally in O(n).

pub mod atr;
pub mod lowest_low;
pub mod sma;

pub use atr::Atr;
pub use lowest_low::LowestLow;
pub use sma::Sma;

use crate::domain::{ParameterSet, PriceBar};
use crate::engine::EngineConfig;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars for which the output is undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`; the first
    /// `lookback()` values are `f64::NAN`. If `bars` is shorter than the
    /// window, every value is `f64::NAN`.
    fn compute(&self, bars: &[PriceBar]) -> Vec<f64>;
}

/// Per-bar indicator arrays for one parameter set, aligned with the bars.
#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    /// Regime fast SMA.
    pub sma_fast: Vec<f64>,
    /// Regime slow (reference) SMA.
    pub sma_slow: Vec<f64>,
    /// Optional long-term trend SMA used by the regime filter.
    pub sma_trend: Option<Vec<f64>>,
    /// Entry SMA over `ma_length` closes.
    pub sma_entry: Vec<f64>,
    pub atr: Vec<f64>,
    /// Lowest low over `lookback` bars.
    pub lowest_low: Vec<f64>,
}

impl IndicatorSeries {
    /// Compute every series needed to simulate `params` under `config`.
    pub fn compute(bars: &[PriceBar], params: &ParameterSet, config: &EngineConfig) -> Self {
        let regime = &config.regime;
        Self {
            sma_fast: Sma::new(regime.fast_period).compute(bars),
            sma_slow: Sma::new(regime.slow_period).compute(bars),
            sma_trend: regime.trend_period.map(|p| Sma::new(p).compute(bars)),
            sma_entry: Sma::new(params.ma_length).compute(bars),
            atr: Atr::new(config.atr_period).compute(bars),
            lowest_low: LowestLow::new(params.lookback).compute(bars),
        }
    }

    pub fn len(&self) -> usize {
        self.sma_entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma_entry.is_empty()
    }

    pub fn sma_fast(&self, i: usize) -> Option<f64> {
        defined(&self.sma_fast, i)
    }

    pub fn sma_slow(&self, i: usize) -> Option<f64> {
        defined(&self.sma_slow, i)
    }

    pub fn sma_trend(&self, i: usize) -> Option<f64> {
        self.sma_trend.as_deref().and_then(|s| defined(s, i))
    }

    pub fn sma_entry(&self, i: usize) -> Option<f64> {
        defined(&self.sma_entry, i)
    }

    pub fn atr(&self, i: usize) -> Option<f64> {
        defined(&self.atr, i)
    }

    pub fn lowest_low(&self, i: usize) -> Option<f64> {
        defined(&self.lowest_low, i)
    }

    /// Dynamic ATR support: `lowest_low + atr * sensitivity`.
    pub fn support(&self, i: usize, sensitivity: f64) -> Option<f64> {
        Some(self.lowest_low(i)? + self.atr(i)? * sensitivity)
    }
}

fn defined(series: &[f64], i: usize) -> Option<f64> {
    series.get(i).copied().filter(|v| !v.is_nan())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
/// Bars are one hour apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            PriceBar {
                timestamp: base + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Create bars from explicit (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<PriceBar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PriceBar {
            timestamp: base + chrono::Duration::hours(i as i64),
            open,
            high,
            low,
            close,
            volume: 1000,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
