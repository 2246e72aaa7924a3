//! RegimeLab Runner — search orchestration, leaderboards, metrics, export.
//!
//! This crate builds on `regimelab-core` to provide:
//! - Data loading with CSV / network / synthetic fallback
//! - Single-backtest runner with performance aggregation
//! - Parallel random parameter search with a bounded top-K leaderboard
//! - TOML search configuration
//! - JSON and CSV export of ranked results

pub mod config;
pub mod data_loader;
pub mod export;
pub mod leaderboard;
pub mod metrics;
pub mod runner;
pub mod search;

pub use config::{ConfigError, DataConfig, SearchConfig, SearchSettings};
pub use data_loader::{compute_dataset_hash, load_bars, LoadError, LoadOptions, LoadedData};
pub use export::{save_artifacts, ResultsDocument, RunManifest};
pub use leaderboard::{InsertResult, Leaderboard, LeaderboardEntry};
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, BacktestResult, RunError};
pub use search::{
    resolve_seed, run_search, RankedResult, SearchError, SearchOutcome, SearchProgress,
    SearchStats,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn performance_metrics_is_send_sync() {
        assert_send::<PerformanceMetrics>();
        assert_sync::<PerformanceMetrics>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SearchConfig>();
        assert_sync::<SearchConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn leaderboard_is_send_sync() {
        assert_send::<Leaderboard>();
        assert_sync::<Leaderboard>();
        assert_send::<LeaderboardEntry>();
        assert_sync::<LeaderboardEntry>();
    }

    #[test]
    fn search_types_are_send_sync() {
        assert_send::<SearchProgress>();
        assert_sync::<SearchProgress>();
        assert_send::<SearchOutcome>();
        assert_sync::<SearchOutcome>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<SearchError>();
        assert_sync::<SearchError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
    }
}
