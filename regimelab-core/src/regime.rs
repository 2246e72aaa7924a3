//! Regime classifier — per-bar "trending" flag gating entries.
//!
//! A bar is trending when the fast SMA is above the slow reference SMA and
//! ATR exceeds a volatility floor expressed as a fraction of the close.
//! Two optional refinements tighten the regime further:
//! - `trend_period`: the close must also sit above a long-term SMA.
//! - `atr_expansion_lag`: ATR must exceed its own value `lag` bars earlier.
//!
//! Undefined indicator values classify as not trending.

use serde::{Deserialize, Serialize};

use crate::domain::PriceBar;
use crate::indicators::IndicatorSeries;

/// Named regime thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Fast SMA window.
    pub fast_period: usize,
    /// Slow (reference) SMA window.
    pub slow_period: usize,
    /// Volatility floor: ATR must be strictly above `min_atr_fraction * close`.
    pub min_atr_fraction: f64,
    /// Long-term SMA the close must be above, if set.
    pub trend_period: Option<usize>,
    /// ATR must exceed ATR from this many bars earlier, if set.
    pub atr_expansion_lag: Option<usize>,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            fast_period: 20,
            slow_period: 50,
            min_atr_fraction: 0.001,
            trend_period: None,
            atr_expansion_lag: None,
        }
    }
}

impl RegimeConfig {
    /// Classify a single bar.
    pub fn is_trending(&self, bars: &[PriceBar], series: &IndicatorSeries, i: usize) -> bool {
        let Some(bar) = bars.get(i) else {
            return false;
        };
        let (Some(fast), Some(slow), Some(atr)) =
            (series.sma_fast(i), series.sma_slow(i), series.atr(i))
        else {
            return false;
        };

        if fast <= slow || atr <= self.min_atr_fraction * bar.close {
            return false;
        }

        if self.trend_period.is_some() {
            match series.sma_trend(i) {
                Some(trend) if bar.close > trend => {}
                _ => return false,
            }
        }

        if let Some(lag) = self.atr_expansion_lag {
            let prior = i.checked_sub(lag).and_then(|j| series.atr(j));
            match prior {
                Some(prev) if atr > prev => {}
                _ => return false,
            }
        }

        true
    }

    /// Classify every bar. Output is aligned with `bars`.
    pub fn classify(&self, bars: &[PriceBar], series: &IndicatorSeries) -> Vec<bool> {
        (0..bars.len())
            .map(|i| self.is_trending(bars, series, i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series_with(
        fast: Vec<f64>,
        slow: Vec<f64>,
        atr: Vec<f64>,
        trend: Option<Vec<f64>>,
    ) -> IndicatorSeries {
        let n = fast.len();
        IndicatorSeries {
            sma_fast: fast,
            sma_slow: slow,
            sma_trend: trend,
            sma_entry: vec![f64::NAN; n],
            atr,
            lowest_low: vec![f64::NAN; n],
        }
    }

    #[test]
    fn trending_when_fast_above_slow_and_atr_above_floor() {
        let bars = make_bars(&[100.0, 100.0]);
        let series = series_with(vec![101.0, 99.0], vec![100.0, 100.0], vec![0.5, 0.5], None);
        let flags = RegimeConfig::default().classify(&bars, &series);
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn volatility_floor_blocks_dead_market() {
        let bars = make_bars(&[100.0, 100.0]);
        // floor = 0.001 * 100 = 0.1
        let series = series_with(vec![101.0, 101.0], vec![100.0, 100.0], vec![0.1, 0.11], None);
        let flags = RegimeConfig::default().classify(&bars, &series);
        assert_eq!(flags, vec![false, true]);
    }

    #[test]
    fn undefined_indicators_are_not_trending() {
        let bars = make_bars(&[100.0]);
        let series = series_with(vec![f64::NAN], vec![100.0], vec![1.0], None);
        assert!(!RegimeConfig::default().is_trending(&bars, &series, 0));
    }

    #[test]
    fn trend_filter_requires_close_above_long_sma() {
        let bars = make_bars(&[100.0, 100.0]);
        let series = series_with(
            vec![101.0, 101.0],
            vec![100.0, 100.0],
            vec![1.0, 1.0],
            Some(vec![99.0, 100.5]),
        );
        let config = RegimeConfig {
            trend_period: Some(200),
            ..RegimeConfig::default()
        };
        assert_eq!(config.classify(&bars, &series), vec![true, false]);
    }

    #[test]
    fn atr_expansion_requires_rising_volatility() {
        let bars = make_bars(&[100.0, 100.0, 100.0, 100.0]);
        let series = series_with(
            vec![101.0; 4],
            vec![100.0; 4],
            vec![1.0, 1.2, 1.1, 1.3],
            None,
        );
        let config = RegimeConfig {
            atr_expansion_lag: Some(1),
            ..RegimeConfig::default()
        };
        // bar 0 has no prior ATR
        assert_eq!(config.classify(&bars, &series), vec![false, true, false, true]);
    }
}
