//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over bar sources (Yahoo Finance, CSV
//! import, synthetic) so they can be swapped and mocked in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PriceBar;

/// Structured error types for data acquisition and validation.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bars out of order at index {index}")]
    Unordered { index: usize },

    #[error("inconsistent OHLC or non-positive price at index {index}")]
    MalformedBar { index: usize },

    #[error("duplicate timestamp at index {index}")]
    DuplicateTimestamp { index: usize },

    #[error("no usable bars")]
    Empty,

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// What to fetch: a symbol over a trailing period at a bar interval.
///
/// `period` and `interval` use chart-API spellings such as `"90d"` and `"1h"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub symbol: String,
    pub period: String,
    pub interval: String,
}

impl FetchRequest {
    pub fn new(
        symbol: impl Into<String>,
        period: impl Into<String>,
        interval: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            period: period.into(),
            interval: interval.into(),
        }
    }
}

/// Result of a successful fetch for a single symbol. Bars are unvalidated.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<PriceBar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Trait for bar providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for `request`.
    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, DataError>;

    /// Check if the provider is currently usable.
    fn is_available(&self) -> bool {
        true
    }
}

/// Parse a chart-API span such as `"15m"`, `"1h"`, `"90d"`, `"1wk"`, `"1mo"`
/// or `"2y"`. Months count as 30 days and years as 365.
pub fn parse_span(span: &str) -> Option<chrono::Duration> {
    let split = span.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = span.split_at(split);
    let n: i64 = digits.parse().ok().filter(|&n| n > 0)?;
    let d = match unit {
        "m" => chrono::Duration::minutes(n),
        "h" => chrono::Duration::hours(n),
        "d" => chrono::Duration::days(n),
        "wk" => chrono::Duration::weeks(n),
        "mo" => chrono::Duration::days(30 * n),
        "y" => chrono::Duration::days(365 * n),
        _ => return None,
    };
    Some(d)
}
