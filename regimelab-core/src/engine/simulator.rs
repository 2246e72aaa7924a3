//! Per-bar FLAT/LONG state machine.
//!
//! While FLAT, a bar may only open a position; while LONG, a bar may only
//! close one. A position can therefore never close on its entry bar, and a
//! new entry cannot happen on the bar that closed the previous trade.
//!
//! Entry: the entry SMA crosses above the dynamic support
//! (`sma[i-1] <= support[i-1]` and `sma[i] > support[i]`) on a trending bar.
//! Fill at that bar's close.
//!
//! Exit: stop is checked before target. A bar whose low touches the stop
//! closes at exactly the stop price, even if its high also reached the
//! target. Otherwise a high at or above the target closes at the target.

use crate::domain::{ExitReason, ParameterSet, Position, PriceBar, Trade};
use crate::indicators::IndicatorSeries;

use super::{SimulationControl, SimulationError};

/// Deadline and cancellation are polled once per this many bars.
const CONTROL_INTERVAL: usize = 256;

/// Simulator state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimState {
    Flat,
    Long(Position),
}

/// Output of one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRun {
    /// Closed trades in exit order.
    pub trades: Vec<Trade>,
    /// Closed-trade equity after each bar, starting from 1.0.
    pub equity_curve: Vec<f64>,
    /// Position still open after the last bar. Not counted as a trade.
    pub open_position: Option<Position>,
}

/// Run the state machine over precomputed indicator and regime series.
///
/// `trending` must be aligned with `bars`; indices past its end count as
/// not trending.
pub fn simulate(
    bars: &[PriceBar],
    series: &IndicatorSeries,
    trending: &[bool],
    params: &ParameterSet,
    control: &SimulationControl<'_>,
) -> Result<SimulationRun, SimulationError> {
    let mut state = SimState::Flat;
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut equity = 1.0;

    for (i, bar) in bars.iter().enumerate() {
        if i % CONTROL_INTERVAL == 0 {
            control.check()?;
        }

        state = match state {
            SimState::Long(pos) => match check_exit(&pos, bar) {
                Some((exit_price, reason)) => {
                    let entry_bar = &bars[pos.entry_index];
                    let trade = Trade::close(
                        pos.entry_index,
                        entry_bar.timestamp,
                        pos.entry_price,
                        i,
                        bar.timestamp,
                        exit_price,
                        reason,
                    );
                    equity *= trade.growth_factor();
                    trades.push(trade);
                    SimState::Flat
                }
                None => SimState::Long(pos),
            },
            SimState::Flat => {
                if entry_signal(series, trending, params.sensitivity, i) {
                    SimState::Long(Position::open(
                        i,
                        bar.close,
                        params.stop_loss_pct,
                        params.risk_reward,
                    ))
                } else {
                    SimState::Flat
                }
            }
        };

        equity_curve.push(equity);
    }

    let open_position = match state {
        SimState::Long(pos) => Some(pos),
        SimState::Flat => None,
    };

    Ok(SimulationRun {
        trades,
        equity_curve,
        open_position,
    })
}

/// Bullish crossover of the entry SMA over support on a trending bar.
pub fn entry_signal(
    series: &IndicatorSeries,
    trending: &[bool],
    sensitivity: f64,
    i: usize,
) -> bool {
    if i == 0 || !trending.get(i).copied().unwrap_or(false) {
        return false;
    }
    let prev = (series.sma_entry(i - 1), series.support(i - 1, sensitivity));
    let curr = (series.sma_entry(i), series.support(i, sensitivity));
    match (prev, curr) {
        ((Some(sma_prev), Some(sup_prev)), (Some(sma), Some(sup))) => {
            sma_prev <= sup_prev && sma > sup
        }
        _ => false,
    }
}

/// Stop first, then target.
pub fn check_exit(pos: &Position, bar: &PriceBar) -> Option<(f64, ExitReason)> {
    if bar.low <= pos.stop_price {
        Some((pos.stop_price, ExitReason::StopLoss))
    } else if bar.high >= pos.target_price {
        Some((pos.target_price, ExitReason::TakeProfit))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Outcome;
    use crate::indicators::{assert_approx, make_ohlc_bars};

    /// Hand-built series: the entry SMA crosses support between bar 0 and 1.
    fn crossing_series(n: usize) -> IndicatorSeries {
        let mut sma_entry = vec![11.0; n];
        sma_entry[0] = 9.0;
        IndicatorSeries {
            sma_fast: vec![f64::NAN; n],
            sma_slow: vec![f64::NAN; n],
            sma_trend: None,
            sma_entry,
            atr: vec![1.0; n],
            lowest_low: vec![9.0; n],
        }
    }

    fn params(sl: f64, rr: f64) -> ParameterSet {
        ParameterSet {
            lookback: 2,
            sensitivity: 1.0,
            ma_length: 2,
            stop_loss_pct: sl,
            risk_reward: rr,
        }
    }

    #[test]
    fn entry_then_take_profit() {
        // Entry at bar 1 close 100; stop 98, target 106.
        let bars = make_ohlc_bars(&[
            (99.0, 100.0, 98.5, 99.5),
            (99.5, 100.5, 99.0, 100.0),
            (100.0, 103.0, 99.0, 102.0),
            (102.0, 107.0, 101.0, 105.0),
        ]);
        let series = crossing_series(bars.len());
        let run = simulate(
            &bars,
            &series,
            &[true; 4],
            &params(0.02, 3.0),
            &SimulationControl::unbounded(),
        )
        .unwrap();

        assert_eq!(run.trades.len(), 1);
        let t = &run.trades[0];
        assert_eq!(t.entry_index, 1);
        assert_eq!(t.exit_index, 3);
        assert_approx(t.exit_price, 106.0, 1e-9);
        assert_eq!(t.exit_reason, ExitReason::TakeProfit);
        assert_eq!(t.outcome, Outcome::Win);
        assert_approx(t.pnl_pct, 6.0, 1e-9);
        assert_approx(run.equity_curve[3], 1.06, 1e-12);
        assert!(run.open_position.is_none());
    }

    #[test]
    fn stop_wins_when_both_legs_touch() {
        let bars = make_ohlc_bars(&[
            (99.0, 100.0, 98.5, 99.5),
            (99.5, 100.5, 99.0, 100.0),
            (100.0, 110.0, 90.0, 100.0),
        ]);
        let series = crossing_series(bars.len());
        let run = simulate(
            &bars,
            &series,
            &[true; 3],
            &params(0.02, 3.0),
            &SimulationControl::unbounded(),
        )
        .unwrap();

        let t = &run.trades[0];
        assert_eq!(t.exit_reason, ExitReason::StopLoss);
        assert_approx(t.exit_price, 98.0, 1e-9);
        assert_approx(t.pnl_pct, -2.0, 1e-9);
        assert_eq!(t.outcome, Outcome::Loss);
    }

    #[test]
    fn entry_bar_range_cannot_close_the_trade() {
        // Bar 1 spans far beyond both legs but is the entry bar.
        let bars = make_ohlc_bars(&[
            (99.0, 100.0, 98.5, 99.5),
            (99.5, 120.0, 80.0, 100.0),
            (100.0, 101.0, 99.0, 100.5),
        ]);
        let series = crossing_series(bars.len());
        let run = simulate(
            &bars,
            &series,
            &[true; 3],
            &params(0.02, 3.0),
            &SimulationControl::unbounded(),
        )
        .unwrap();

        assert!(run.trades.is_empty());
        let pos = run.open_position.unwrap();
        assert_eq!(pos.entry_index, 1);
        assert_eq!(run.equity_curve, vec![1.0; 3]);
    }

    #[test]
    fn no_entry_outside_trending_regime() {
        let bars = make_ohlc_bars(&[(99.0, 100.0, 98.5, 99.5), (99.5, 100.5, 99.0, 100.0)]);
        let series = crossing_series(bars.len());
        let run = simulate(
            &bars,
            &series,
            &[true, false],
            &params(0.02, 3.0),
            &SimulationControl::unbounded(),
        )
        .unwrap();
        assert!(run.trades.is_empty());
        assert!(run.open_position.is_none());
    }

    #[test]
    fn crossover_requires_prior_bar_at_or_below_support() {
        let mut series = crossing_series(3);
        series.sma_entry = vec![11.0, 11.0, 11.0];
        assert!(!entry_signal(&series, &[true; 3], 1.0, 1));

        series.sma_entry = vec![10.0, 10.5, 11.0];
        // support is 10.0: bar 0 sits exactly on it
        assert!(entry_signal(&series, &[true; 3], 1.0, 1));
        assert!(!entry_signal(&series, &[true; 3], 1.0, 2));
    }

    #[test]
    fn undefined_support_blocks_entry() {
        let mut series = crossing_series(2);
        series.atr[0] = f64::NAN;
        assert!(!entry_signal(&series, &[true; 2], 1.0, 1));
    }

    #[test]
    fn check_exit_legs() {
        let pos = Position::open(0, 100.0, 0.05, 2.0);
        let quiet = make_ohlc_bars(&[(100.0, 101.0, 99.0, 100.0)]);
        assert_eq!(check_exit(&pos, &quiet[0]), None);

        let target = make_ohlc_bars(&[(100.0, 110.0, 99.0, 108.0)]);
        assert_eq!(
            check_exit(&pos, &target[0]),
            Some((pos.target_price, ExitReason::TakeProfit))
        );

        let stop = make_ohlc_bars(&[(100.0, 101.0, 95.0, 96.0)]);
        assert_eq!(
            check_exit(&pos, &stop[0]),
            Some((pos.stop_price, ExitReason::StopLoss))
        );
    }
}
