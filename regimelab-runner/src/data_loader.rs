//! Bar loading and data resolution for the runner.
//!
//! Implements the fallback policy:
//! 1. If a CSV path is configured → read it
//! 2. Otherwise, if a network provider is available → fetch from it
//! 3. If that fails and synthetic fallback is enabled → generate synthetic bars (tagged)
//! 4. Otherwise → fail with a clear error
//!
//! Whatever the source, bars pass `validate_bars` before they are returned.
//! Synthetic data is a developer-only mode; results on it are tagged.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use regimelab_core::data::{
    validate_bars, CsvProvider, DataError, DataProvider, DataSource, FetchRequest,
    SyntheticProvider,
};
use regimelab_core::domain::PriceBar;

use crate::config::DataConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not load data for '{symbol}': {reason} (use --synthetic for synthetic data)")]
    AcquisitionFailed { symbol: String, reason: String },

    #[error("data error: {0}")]
    Data(#[from] DataError),
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub request: FetchRequest,
    /// Read from this file instead of the network.
    pub csv: Option<PathBuf>,
    /// Generate synthetic bars when real data is unavailable.
    pub synthetic: bool,
}

impl From<&DataConfig> for LoadOptions {
    fn from(config: &DataConfig) -> Self {
        Self {
            request: config.request(),
            csv: config.csv.clone(),
            synthetic: config.synthetic_fallback,
        }
    }
}

/// Bars ready for the engine, with provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
    /// BLAKE3 over the symbol and every bar.
    pub dataset_hash: String,
    /// Rows discarded for missing prices.
    pub dropped: usize,
}

impl LoadedData {
    pub fn is_synthetic(&self) -> bool {
        self.source == DataSource::Synthetic
    }
}

/// Load bars with fallback to synthetic data.
///
/// `network` is the remote provider (normally Yahoo); pass `None` to stay
/// offline.
pub fn load_bars(
    opts: &LoadOptions,
    network: Option<&dyn DataProvider>,
) -> Result<LoadedData, LoadError> {
    let symbol = opts.request.symbol.clone();

    let attempt: Result<LoadedData, DataError> = match (&opts.csv, network) {
        (Some(path), _) => fetch_validated(&CsvProvider::new(path), &opts.request),
        (None, Some(provider)) if provider.is_available() => {
            fetch_validated(provider, &opts.request)
        }
        (None, _) => {
            if !opts.synthetic {
                return Err(LoadError::AcquisitionFailed {
                    symbol,
                    reason: "no data provider available".into(),
                });
            }
            Err(DataError::InvalidRequest("no data provider available".into()))
        }
    };

    match attempt {
        Ok(loaded) => {
            info!(
                symbol = %loaded.symbol,
                bars = loaded.bars.len(),
                dropped = loaded.dropped,
                source = ?loaded.source,
                "loaded bars"
            );
            Ok(loaded)
        }
        Err(e) if opts.synthetic => {
            warn!(%symbol, error = %e, "real data unavailable, generating synthetic bars; results will be tagged as synthetic");
            Ok(fetch_validated(&SyntheticProvider::new(), &opts.request)?)
        }
        Err(e) if opts.csv.is_some() => Err(LoadError::Data(e)),
        Err(e) => Err(LoadError::AcquisitionFailed {
            symbol,
            reason: e.to_string(),
        }),
    }
}

fn fetch_validated(
    provider: &dyn DataProvider,
    request: &FetchRequest,
) -> Result<LoadedData, DataError> {
    let fetched = provider.fetch(request)?;
    let validated = validate_bars(fetched.bars)?;
    let dataset_hash = compute_dataset_hash(&fetched.symbol, &validated.bars);
    Ok(LoadedData {
        symbol: fetched.symbol,
        bars: validated.bars,
        source: fetched.source,
        dataset_hash,
        dropped: validated.dropped,
    })
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn compute_dataset_hash(symbol: &str, bars: &[PriceBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(symbol.as_bytes());
    for bar in bars {
        hasher.update(&bar.timestamp.timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regimelab_core::data::FetchResult;

    struct FailingProvider;

    impl DataProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn fetch(&self, _request: &FetchRequest) -> Result<FetchResult, DataError> {
            Err(DataError::NetworkUnreachable("offline".into()))
        }
    }

    fn opts(synthetic: bool) -> LoadOptions {
        LoadOptions {
            request: FetchRequest::new("GDX.AX", "30d", "1h"),
            csv: None,
            synthetic,
        }
    }

    #[test]
    fn network_failure_without_fallback_is_acquisition_error() {
        let err = load_bars(&opts(false), Some(&FailingProvider)).unwrap_err();
        assert!(matches!(err, LoadError::AcquisitionFailed { .. }));
        assert!(err.to_string().contains("offline"));
    }

    #[test]
    fn network_failure_with_fallback_is_synthetic() {
        let loaded = load_bars(&opts(true), Some(&FailingProvider)).unwrap();
        assert!(loaded.is_synthetic());
        assert_eq!(loaded.bars.len(), 720);
        assert_eq!(loaded.dropped, 0);
    }

    #[test]
    fn offline_without_fallback_fails() {
        assert!(matches!(
            load_bars(&opts(false), None),
            Err(LoadError::AcquisitionFailed { .. })
        ));
    }

    #[test]
    fn dataset_hash_is_deterministic_and_content_sensitive() {
        let a = load_bars(&opts(true), None).unwrap();
        let b = load_bars(&opts(true), None).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);

        let mut bars = a.bars.clone();
        bars[3].close += 0.01;
        assert_ne!(compute_dataset_hash("GDX.AX", &bars), a.dataset_hash);
        assert_ne!(compute_dataset_hash("SPY", &a.bars), a.dataset_hash);
    }
}
