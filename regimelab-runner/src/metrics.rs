//! Performance aggregation — pure functions from a trade log to summary statistics.
//!
//! Equity starts at 1.0 and compounds by `(1 + pnl_pct / 100)` per closed trade,
//! in exit order. Drawdown is measured on that closed-trade equity sequence.

use serde::{Deserialize, Serialize};
use regimelab_core::domain::Trade;

/// Summary statistics for one back-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Compounded growth multiplier; 1.0 means break-even.
    pub final_return: f64,
    /// Largest peak-to-trough decline of equity, in percent (>= 0).
    pub max_drawdown_pct: f64,
    /// Share of winning trades, in percent; 0 with no trades.
    pub win_rate_pct: f64,
    pub trade_count: usize,
    /// `(final_return - 1) * 100`.
    pub total_pnl_pct: f64,
}

impl PerformanceMetrics {
    pub fn compute(trades: &[Trade]) -> Self {
        let final_return = final_return(trades);
        Self {
            final_return,
            max_drawdown_pct: max_drawdown_pct(&equity_curve(trades)),
            win_rate_pct: win_rate_pct(trades),
            trade_count: trades.len(),
            total_pnl_pct: (final_return - 1.0) * 100.0,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Product of trade growth factors; exactly 1.0 for no trades.
pub fn final_return(trades: &[Trade]) -> f64 {
    trades.iter().map(Trade::growth_factor).product()
}

/// Equity after each closed trade, preceded by the starting 1.0.
pub fn equity_curve(trades: &[Trade]) -> Vec<f64> {
    let mut curve = Vec::with_capacity(trades.len() + 1);
    let mut equity = 1.0;
    curve.push(equity);
    for trade in trades {
        equity *= trade.growth_factor();
        curve.push(equity);
    }
    curve
}

/// Maximum peak-to-trough decline in percent.
pub fn max_drawdown_pct(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd * 100.0
}

pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let wins = trades.iter().filter(|t| t.is_winner()).count();
    100.0 * wins as f64 / trades.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use regimelab_core::domain::ExitReason;

    fn trade(pnl_pct: f64) -> Trade {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let exit = 100.0 * (1.0 + pnl_pct / 100.0);
        let reason = if pnl_pct > 0.0 {
            ExitReason::TakeProfit
        } else {
            ExitReason::StopLoss
        };
        Trade::close(0, t, 100.0, 1, t, exit, reason)
    }

    #[test]
    fn no_trades_is_break_even() {
        let m = PerformanceMetrics::compute(&[]);
        assert_eq!(m.final_return, 1.0);
        assert_eq!(m.max_drawdown_pct, 0.0);
        assert_eq!(m.win_rate_pct, 0.0);
        assert_eq!(m.trade_count, 0);
        assert_eq!(m.total_pnl_pct, 0.0);
    }

    #[test]
    fn compounding_and_drawdown() {
        // +10%, -5%, +2%
        let trades = [trade(10.0), trade(-5.0), trade(2.0)];
        let m = PerformanceMetrics::compute(&trades);
        let expected = 1.10 * 0.95 * 1.02;
        assert!((m.final_return - expected).abs() < 1e-12);
        assert!((m.total_pnl_pct - (expected - 1.0) * 100.0).abs() < 1e-9);
        assert!((m.max_drawdown_pct - 5.0).abs() < 1e-9);
        assert!((m.win_rate_pct - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.trade_count, 3);
    }

    #[test]
    fn drawdown_spans_consecutive_losses() {
        let trades = [trade(20.0), trade(-10.0), trade(-10.0), trade(50.0)];
        // peak 1.2, trough 1.2 * 0.81
        let dd = max_drawdown_pct(&equity_curve(&trades));
        assert!((dd - 19.0).abs() < 1e-9);
    }

    #[test]
    fn loss_from_start_counts_as_drawdown() {
        let dd = max_drawdown_pct(&equity_curve(&[trade(-3.0)]));
        assert!((dd - 3.0).abs() < 1e-9);
    }

    #[test]
    fn monotonic_gains_have_no_drawdown() {
        let dd = max_drawdown_pct(&equity_curve(&[trade(1.0), trade(2.0), trade(3.0)]));
        assert_eq!(dd, 0.0);
    }

    #[test]
    fn per_bar_curve_gives_same_drawdown() {
        // Flat stretches between exits do not change the drawdown.
        let per_bar = [1.0, 1.0, 1.2, 1.2, 1.08, 1.08, 1.08, 1.2];
        let per_trade = [1.0, 1.2, 1.08, 1.2];
        assert!((max_drawdown_pct(&per_bar) - max_drawdown_pct(&per_trade)).abs() < 1e-12);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn metrics_stay_in_bounds(pnls in prop::collection::vec(-20.0f64..40.0, 0..60)) {
                let trades: Vec<Trade> = pnls.iter().map(|&p| trade(p)).collect();
                let m = PerformanceMetrics::compute(&trades);
                let curve = equity_curve(&trades);

                prop_assert!((0.0..=100.0).contains(&m.win_rate_pct));
                prop_assert!(m.max_drawdown_pct >= 0.0 && m.max_drawdown_pct < 100.0);
                prop_assert!(m.final_return > 0.0);
                prop_assert_eq!(curve.len(), trades.len() + 1);
                let last = curve[curve.len() - 1];
                prop_assert!((m.final_return - last).abs() <= 1e-9 * last.max(1.0));
            }
        }
    }
}
