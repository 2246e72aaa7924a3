//! RegimeLab CLI — random parameter search for the regime breakout rule.
//!
//! One command, no required flags. Loads bars (CSV, Yahoo Finance, or
//! synthetic with `--synthetic`), samples parameter sets, back-tests them in
//! parallel and prints the ranked top results plus the best result's trades.
//!
//! Logs go to stderr; stdout carries only the report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use regimelab_core::data::{DataProvider, YahooProvider};
use regimelab_runner::{
    load_bars, resolve_seed, run_search, save_artifacts, LoadOptions, RunManifest, SearchConfig,
    SearchOutcome, SearchProgress,
};

/// Trades of the best result shown in the report.
const TRADES_SHOWN: usize = 10;

#[derive(Parser, Debug)]
#[command(
    name = "regimelab",
    version,
    about = "Random parameter search for a regime-filtered ATR-support breakout"
)]
struct Cli {
    /// Path to a TOML search config. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of parameter sets to evaluate.
    #[arg(long)]
    trials: Option<usize>,

    /// How many ranked results to print.
    #[arg(long)]
    top: Option<usize>,

    /// Sampler seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads (0 = one per logical CPU).
    #[arg(long)]
    workers: Option<usize>,

    /// Ticker symbol, e.g. GDX.AX.
    #[arg(long)]
    symbol: Option<String>,

    /// Trailing data window, e.g. 90d.
    #[arg(long)]
    period: Option<String>,

    /// Bar interval, e.g. 1h.
    #[arg(long)]
    interval: Option<String>,

    /// Read bars from a CSV file instead of the network.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Fall back to synthetic bars when real data cannot be loaded.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Write top_results.json and best_trades.csv to this directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "regimelab_runner=debug". Overrides RUST_LOG.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Apply flag overrides on top of the file (or default) configuration.
    fn into_config(self) -> Result<(SearchConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => SearchConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SearchConfig::default(),
        };

        if let Some(trials) = self.trials {
            config.search.trials = trials;
        }
        if let Some(top) = self.top {
            config.search.top_k = top;
        }
        if let Some(seed) = self.seed {
            config.search.seed = Some(seed);
        }
        if let Some(workers) = self.workers {
            config.search.workers = workers;
        }
        if let Some(symbol) = self.symbol {
            config.data.symbol = symbol;
        }
        if let Some(period) = self.period {
            config.data.period = period;
        }
        if let Some(interval) = self.interval {
            config.data.interval = interval;
        }
        if self.csv.is_some() {
            config.data.csv = self.csv;
        }
        if self.synthetic {
            config.data.synthetic_fallback = true;
        }

        config.validate()?;
        Ok((config, self.output))
    }
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let (config, output) = cli.into_config()?;

    // Data acquisition failure is fatal.
    let yahoo = if config.data.csv.is_none() {
        match YahooProvider::new() {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "network provider unavailable");
                None
            }
        }
    } else {
        None
    };
    let network = yahoo.as_ref().map(|p| p as &dyn DataProvider);
    let data = load_bars(&LoadOptions::from(&config.data), network)
        .context("data acquisition failed")?;

    let seed = resolve_seed(&config);
    info!(seed, "sampler seed (pass --seed {seed} to reproduce)");
    let mut rng = StdRng::seed_from_u64(seed);

    let pb = ProgressBar::new(config.search.trials as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec}] {msg}")
            .context("invalid progress bar template")?
            .progress_chars("█░ "),
    );
    let on_progress = |p: &SearchProgress| {
        pb.set_position(p.completed as u64);
        pb.set_message(format!("{} ok, {} skipped", p.succeeded, p.failed));
    };

    let outcome = run_search(&data.bars, &config, &mut rng, Some(&on_progress), None);
    pb.finish_and_clear();
    let outcome = outcome.context("search failed")?;

    let s = &outcome.stats;
    info!(
        attempted = s.attempted,
        succeeded = s.succeeded,
        infeasible = s.infeasible,
        timed_out = s.timed_out,
        non_finite = s.non_finite,
        elapsed_secs = s.elapsed_secs,
        "search complete"
    );

    print_report(&outcome, data.is_synthetic())?;

    if let Some(dir) = output {
        let manifest = RunManifest::new(&data, seed);
        let dir = save_artifacts(&outcome, &manifest, &dir)?;
        info!(dir = %dir.display(), "results exported");
    }

    Ok(())
}

fn print_report(outcome: &SearchOutcome, synthetic: bool) -> Result<()> {
    if synthetic {
        println!("WARNING: results are based on SYNTHETIC data");
        println!();
    }

    println!("Top {} parameter sets:", outcome.ranked.len());
    for r in &outcome.ranked {
        let m = &r.entry.result.metrics;
        println!(
            "{}. Return {:.4} | Drawdown {:.2}% | Win rate {:.2}% | Trades {} | PnL {:.2}% | {}",
            r.rank,
            m.final_return,
            m.max_drawdown_pct,
            m.win_rate_pct,
            m.trade_count,
            m.total_pnl_pct,
            r.entry.result.parameters,
        );
    }

    let Some(best) = outcome.best() else {
        return Ok(());
    };
    let trades = &best.entry.result.trades;
    println!();
    println!(
        "First {} trades of the best result:",
        trades.len().min(TRADES_SHOWN)
    );
    for t in trades.iter().take(TRADES_SHOWN) {
        let record = serde_json::json!({
            "entry_date": t.entry_date,
            "exit_date": t.exit_date,
            "entry_price": t.entry_price,
            "exit_price": t.exit_price,
            "pnl_pct": t.pnl_pct,
            "type": t.outcome,
        });
        println!("{}", serde_json::to_string(&record)?);
    }
    if let Some(pos) = &best.entry.result.open_position {
        println!(
            "Open position at end of data: entered at {:.4} (bar {}), stop {:.4}, target {:.4}",
            pos.entry_price, pos.entry_index, pos.stop_price, pos.target_price
        );
    }

    Ok(())
}
