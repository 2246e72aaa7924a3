//! Random parameter search.
//!
//! Draws `trials` parameter sets from the configured ranges, back-tests each
//! one on a bounded rayon pool and keeps the top K. All draws come from the
//! caller's RNG, in sequence, before any work is dispatched; with a seeded
//! RNG the ranking is reproducible regardless of the worker count.
//!
//! Per-task failures never abort the search:
//! - data-insufficient sets are counted as infeasible and skipped,
//! - invalid sets (impossible once the config is validated) are counted,
//! - tasks over the wall-time budget are counted as timed out,
//! - results with a non-finite return are counted and never ranked.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use regimelab_core::domain::{ParameterSet, PriceBar};
use regimelab_core::engine::{SimulationControl, SimulationError};

use crate::config::{ConfigError, SearchConfig};
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::runner::{run_backtest, BacktestResult, RunError};

/// Errors from the search as a whole.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(
        "no valid results from {attempted} parameter sets \
         ({infeasible} infeasible, {invalid} invalid, {timed_out} timed out, \
         {non_finite} non-finite)"
    )]
    NoValidResults {
        attempted: usize,
        infeasible: usize,
        invalid: usize,
        timed_out: usize,
        non_finite: usize,
    },

    #[error("search cancelled")]
    Cancelled,
}

/// Progress update sent while the search runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchProgress {
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
}

/// Counters describing a finished search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub attempted: usize,
    pub succeeded: usize,
    /// Skipped for having fewer bars than the warm-up window.
    pub infeasible: usize,
    pub invalid: usize,
    pub timed_out: usize,
    /// Completed runs whose return was NaN or infinite.
    pub non_finite: usize,
    pub elapsed_secs: f64,
}

/// A result with its final rank (1-based).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub rank: usize,
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
}

/// Final output of a search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Best first; at most `top_k` entries.
    pub ranked: Vec<RankedResult>,
    pub stats: SearchStats,
}

impl SearchOutcome {
    pub fn best(&self) -> Option<&RankedResult> {
        self.ranked.first()
    }
}

/// Resolve the sampler seed: the configured one, or a fresh one from entropy.
pub fn resolve_seed(config: &SearchConfig) -> u64 {
    config.search.seed.unwrap_or_else(rand::random)
}

#[derive(Default)]
struct Counters {
    completed: AtomicUsize,
    succeeded: AtomicUsize,
    infeasible: AtomicUsize,
    invalid: AtomicUsize,
    timed_out: AtomicUsize,
    non_finite: AtomicUsize,
    cancelled: AtomicUsize,
}

impl Counters {
    fn failed(&self) -> usize {
        self.infeasible.load(Ordering::Relaxed)
            + self.invalid.load(Ordering::Relaxed)
            + self.timed_out.load(Ordering::Relaxed)
            + self.non_finite.load(Ordering::Relaxed)
            + self.cancelled.load(Ordering::Relaxed)
    }
}

/// Run the search over `bars`.
///
/// # Arguments
/// - `config`: validated before anything runs.
/// - `rng`: source of every parameter draw.
/// - `progress_cb`: optional callback, called from worker threads at most
///   about a thousand times over the run.
/// - `cancel`: optional flag to stop cooperatively; if any task was cut
///   short by it the search returns `SearchError::Cancelled`. A flag raised
///   after every task has finished leaves the ranking intact.
pub fn run_search<R: Rng + ?Sized>(
    bars: &[PriceBar],
    config: &SearchConfig,
    rng: &mut R,
    progress_cb: Option<&(dyn Fn(&SearchProgress) + Sync)>,
    cancel: Option<&AtomicBool>,
) -> Result<SearchOutcome, SearchError> {
    config.validate()?;

    let start_time = Instant::now();
    let total = config.search.trials;
    let candidates: Vec<ParameterSet> = config.ranges.sample_n(rng, total);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.search.workers)
        .build()?;

    info!(
        trials = total,
        top_k = config.search.top_k,
        workers = pool.current_num_threads(),
        bars = bars.len(),
        "starting parameter search"
    );

    let counters = Counters::default();
    let report_every = (total / 1000).max(1);
    let budget = config.search.task_timeout_ms.map(Duration::from_millis);
    let top_k = config.search.top_k;

    let board = pool.install(|| {
        candidates
            .par_iter()
            .enumerate()
            .fold(
                || Leaderboard::new(top_k),
                |mut board, (index, params)| {
                    let mut control = SimulationControl::unbounded();
                    if let Some(flag) = cancel {
                        control = control.with_cancel(flag);
                    }
                    if let Some(budget) = budget {
                        control = control.with_budget(budget);
                    }

                    match run_backtest(bars, params, &config.strategy, &control) {
                        Ok(result) => record_success(&counters, &mut board, index, result),
                        Err(err) => record_failure(&counters, index, params, &err),
                    }

                    let done = counters.completed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(cb) = progress_cb {
                        if done % report_every == 0 || done == total {
                            cb(&SearchProgress {
                                completed: done,
                                total,
                                succeeded: counters.succeeded.load(Ordering::Relaxed),
                                failed: counters.failed(),
                                elapsed_secs: start_time.elapsed().as_secs_f64(),
                            });
                        }
                    }
                    board
                },
            )
            .reduce(|| Leaderboard::new(top_k), Leaderboard::merge)
    });

    let stats = SearchStats {
        attempted: total,
        succeeded: counters.succeeded.load(Ordering::Relaxed),
        infeasible: counters.infeasible.load(Ordering::Relaxed),
        invalid: counters.invalid.load(Ordering::Relaxed),
        timed_out: counters.timed_out.load(Ordering::Relaxed),
        non_finite: counters.non_finite.load(Ordering::Relaxed),
        elapsed_secs: start_time.elapsed().as_secs_f64(),
    };

    if counters.cancelled.load(Ordering::Relaxed) > 0 {
        info!(completed = counters.completed.load(Ordering::Relaxed), "search cancelled");
        return Err(SearchError::Cancelled);
    }

    info!(
        succeeded = stats.succeeded,
        infeasible = stats.infeasible,
        invalid = stats.invalid,
        timed_out = stats.timed_out,
        non_finite = stats.non_finite,
        elapsed_secs = stats.elapsed_secs,
        "search finished"
    );

    if stats.succeeded == 0 || board.is_empty() {
        return Err(SearchError::NoValidResults {
            attempted: stats.attempted,
            infeasible: stats.infeasible,
            invalid: stats.invalid,
            timed_out: stats.timed_out,
            non_finite: stats.non_finite,
        });
    }

    let ranked = board
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(i, entry)| RankedResult { rank: i + 1, entry })
        .collect();

    Ok(SearchOutcome { ranked, stats })
}

fn record_success(
    counters: &Counters,
    board: &mut Leaderboard,
    index: usize,
    result: BacktestResult,
) {
    if !result.final_return().is_finite() {
        warn!(
            index,
            params = %result.parameters,
            "discarding result with non-finite return"
        );
        counters.non_finite.fetch_add(1, Ordering::Relaxed);
        return;
    }
    counters.succeeded.fetch_add(1, Ordering::Relaxed);
    board.insert(LeaderboardEntry {
        sample_index: index,
        result: result.without_equity_curve(),
    });
}

fn record_failure(counters: &Counters, index: usize, params: &ParameterSet, err: &RunError) {
    let RunError::Simulation(sim) = err;
    match sim {
        SimulationError::DataInsufficient { bars, required } => {
            debug!(index, bars, required, "skipping infeasible parameter set");
            counters.infeasible.fetch_add(1, Ordering::Relaxed);
        }
        SimulationError::InvalidParameter(e) => {
            error!(index, %params, error = %e, "sampler produced an invalid parameter set");
            debug_assert!(params.validate().is_ok(), "invalid parameter set: {e}");
            counters.invalid.fetch_add(1, Ordering::Relaxed);
        }
        SimulationError::TimedOut { budget_ms } => {
            debug!(index, budget_ms, "parameter set timed out");
            counters.timed_out.fetch_add(1, Ordering::Relaxed);
        }
        SimulationError::Cancelled => {
            counters.cancelled.fetch_add(1, Ordering::Relaxed);
        }
    }
}
