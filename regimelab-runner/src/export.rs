//! Result export — JSON and CSV artifacts for a finished search.
//!
//! `save_artifacts` writes two files into the output directory:
//! - `top_results.json`: run manifest, search statistics and the ranked
//!   results with their trades
//! - `best_trades.csv`: the trade tape of the best-ranked result

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use regimelab_core::data::DataSource;
use regimelab_core::domain::Trade;

use crate::data_loader::LoadedData;
use crate::search::{RankedResult, SearchOutcome, SearchStats};

pub const RESULTS_FILE: &str = "top_results.json";
pub const TRADES_FILE: &str = "best_trades.csv";

/// Where the ranked results came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub symbol: String,
    pub source: DataSource,
    pub dataset_hash: String,
    pub bar_count: usize,
    /// Seed of the parameter sampler; rerunning with it reproduces the ranking.
    pub seed: u64,
    pub generated_at: DateTime<Utc>,
}

impl RunManifest {
    pub fn new(data: &LoadedData, seed: u64) -> Self {
        Self {
            symbol: data.symbol.clone(),
            source: data.source,
            dataset_hash: data.dataset_hash.clone(),
            bar_count: data.bars.len(),
            seed,
            generated_at: Utc::now(),
        }
    }
}

/// Contents of `top_results.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsDocument {
    pub manifest: RunManifest,
    pub stats: SearchStats,
    pub results: Vec<RankedResult>,
}

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize the ranked results to pretty JSON.
pub fn export_json(outcome: &SearchOutcome, manifest: &RunManifest) -> Result<String> {
    let doc = ResultsDocument {
        manifest: manifest.clone(),
        stats: outcome.stats,
        results: outcome.ranked.clone(),
    };
    serde_json::to_string_pretty(&doc).context("failed to serialize search results to JSON")
}

pub fn import_json(json: &str) -> Result<ResultsDocument> {
    serde_json::from_str(json).context("failed to deserialize search results from JSON")
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: entry_index, entry_date, entry_price, exit_index, exit_date,
/// exit_price, pnl_pct, type, exit_reason, bars_held
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "entry_index",
        "entry_date",
        "entry_price",
        "exit_index",
        "exit_date",
        "exit_price",
        "pnl_pct",
        "type",
        "exit_reason",
        "bars_held",
    ])?;

    for t in trades {
        wtr.write_record([
            t.entry_index.to_string(),
            t.entry_date.to_rfc3339(),
            format!("{:.6}", t.entry_price),
            t.exit_index.to_string(),
            t.exit_date.to_rfc3339(),
            format!("{:.6}", t.exit_price),
            format!("{:.4}", t.pnl_pct),
            t.outcome.as_str().to_string(),
            t.exit_reason.as_str().to_string(),
            t.bars_held().to_string(),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `top_results.json` and `best_trades.csv` into `output_dir`,
/// creating it if needed. Returns the directory.
pub fn save_artifacts(
    outcome: &SearchOutcome,
    manifest: &RunManifest,
    output_dir: &Path,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let json = export_json(outcome, manifest)?;
    let results_path = output_dir.join(RESULTS_FILE);
    std::fs::write(&results_path, json)
        .with_context(|| format!("failed to write {}", results_path.display()))?;

    let best_trades = outcome
        .best()
        .map(|best| best.entry.result.trades.as_slice())
        .unwrap_or_default();
    let trades_path = output_dir.join(TRADES_FILE);
    std::fs::write(&trades_path, export_trades_csv(best_trades)?)
        .with_context(|| format!("failed to write {}", trades_path.display()))?;

    Ok(output_dir.to_path_buf())
}
