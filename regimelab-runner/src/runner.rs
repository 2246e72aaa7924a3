//! Back-test runner — wires together the engine and performance aggregation.
//!
//! One call is one unit of search work: `(bars, ParameterSet) -> BacktestResult`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::domain::{ParameterSet, Position, PriceBar, Trade};
use regimelab_core::engine::{run_simulation, EngineConfig, SimulationControl, SimulationError};

use crate::metrics::PerformanceMetrics;

/// Errors from a single back-test.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Complete result of a single back-test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(flatten)]
    pub metrics: PerformanceMetrics,
    pub parameters: ParameterSet,
    pub trades: Vec<Trade>,
    /// Position still open when the data ran out; excluded from metrics.
    pub open_position: Option<Position>,
    /// Closed-trade equity after every bar.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equity_curve: Vec<f64>,
}

impl BacktestResult {
    pub fn final_return(&self) -> f64 {
        self.metrics.final_return
    }

    pub fn max_drawdown_pct(&self) -> f64 {
        self.metrics.max_drawdown_pct
    }

    /// Drop the per-bar equity curve. Search results keep only trades.
    pub fn without_equity_curve(mut self) -> Self {
        self.equity_curve = Vec::new();
        self
    }
}

/// Run one back-test and aggregate its trades.
pub fn run_backtest(
    bars: &[PriceBar],
    params: &ParameterSet,
    config: &EngineConfig,
    control: &SimulationControl<'_>,
) -> Result<BacktestResult, RunError> {
    let run = run_simulation(bars, params, config, control)?;
    let metrics = PerformanceMetrics::compute(&run.trades);
    Ok(BacktestResult {
        metrics,
        parameters: *params,
        trades: run.trades,
        open_position: run.open_position,
        equity_curve: run.equity_curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn oscillating_uptrend(n: usize) -> Vec<PriceBar> {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + 0.05 * i as f64 + 2.0 * (i as f64 * 0.3).sin())
            .collect();
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

    fn params() -> ParameterSet {
        ParameterSet {
            lookback: 10,
            sensitivity: 1.0,
            ma_length: 5,
            stop_loss_pct: 0.02,
            risk_reward: 1.5,
        }
    }

    #[test]
    fn metrics_agree_with_trades_and_curve() {
        let bars = oscillating_uptrend(1000);
        let result = run_backtest(
            &bars,
            &params(),
            &EngineConfig::default(),
            &SimulationControl::unbounded(),
        )
        .unwrap();

        assert_eq!(result.metrics.trade_count, result.trades.len());
        assert!(result.metrics.trade_count > 0);
        let last = *result.equity_curve.last().unwrap();
        assert!((result.final_return() - last).abs() < 1e-9);
        let curve_dd = crate::metrics::max_drawdown_pct(&result.equity_curve);
        assert!((result.max_drawdown_pct() - curve_dd).abs() < 1e-9);
        assert_eq!(result.parameters, params());
    }

    #[test]
    fn insufficient_data_surfaces_as_run_error() {
        let bars = oscillating_uptrend(10);
        let err = run_backtest(
            &bars,
            &params(),
            &EngineConfig::default(),
            &SimulationControl::unbounded(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RunError::Simulation(SimulationError::DataInsufficient { .. })
        ));
    }

    #[test]
    fn serialized_result_has_flat_metrics() {
        let bars = oscillating_uptrend(300);
        let result = run_backtest(
            &bars,
            &params(),
            &EngineConfig::default(),
            &SimulationControl::unbounded(),
        )
        .unwrap()
        .without_equity_curve();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["final_return"].is_number());
        assert!(json["max_drawdown_pct"].is_number());
        assert_eq!(json["parameters"]["lookback"], 10);
        assert!(json.get("equity_curve").is_none());
    }
}
