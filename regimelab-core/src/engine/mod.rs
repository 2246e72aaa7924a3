//! Back-test engine — indicators, regime and the per-bar trade state machine.
//!
//! One run is `bars → IndicatorSeries → regime flags → simulator`. Runs share
//! nothing mutable, so any number of them can execute concurrently over the
//! same bar slice.

pub mod simulator;

pub use simulator::{simulate, SimState, SimulationRun};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ParameterError, ParameterSet, PriceBar};
use crate::indicators::IndicatorSeries;
use crate::regime::RegimeConfig;

/// Errors local to a single simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("insufficient data: have {bars} bars, need at least {required}")]
    DataInsufficient { bars: usize, required: usize },

    #[error(transparent)]
    InvalidParameter(#[from] ParameterError),

    #[error("simulation exceeded its {budget_ms} ms budget")]
    TimedOut { budget_ms: u64 },

    #[error("simulation cancelled")]
    Cancelled,
}

/// Strategy constants shared by every parameter set in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ATR window used for both the support line and the regime floor.
    pub atr_period: usize,
    pub regime: RegimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            atr_period: 14,
            regime: RegimeConfig::default(),
        }
    }
}

/// Cooperative limits checked periodically inside the bar loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationControl<'a> {
    deadline: Option<(Instant, Duration)>,
    cancel: Option<&'a AtomicBool>,
}

impl<'a> SimulationControl<'a> {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Abort the run once `budget` has elapsed from now.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.deadline = Some((Instant::now() + budget, budget));
        self
    }

    /// Abort the run when `flag` becomes true.
    pub fn with_cancel(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn check(&self) -> Result<(), SimulationError> {
        if self.cancel.is_some_and(|f| f.load(Ordering::Relaxed)) {
            return Err(SimulationError::Cancelled);
        }
        if let Some((deadline, budget)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(SimulationError::TimedOut {
                    budget_ms: budget.as_millis() as u64,
                });
            }
        }
        Ok(())
    }
}

/// Validate, compute indicators and regime, then run the state machine.
///
/// Fails fast with `DataInsufficient` when the bar sequence is shorter than
/// the parameter set's warm-up window; no repair is attempted.
pub fn run_simulation(
    bars: &[PriceBar],
    params: &ParameterSet,
    config: &EngineConfig,
    control: &SimulationControl<'_>,
) -> Result<SimulationRun, SimulationError> {
    params.validate()?;

    let required = params.warmup_bars(config.atr_period);
    if bars.len() < required {
        return Err(SimulationError::DataInsufficient {
            bars: bars.len(),
            required,
        });
    }

    let series = IndicatorSeries::compute(bars, params, config);
    let trending = config.regime.classify(bars, &series);
    simulate(bars, &series, &trending, params, control)
}
