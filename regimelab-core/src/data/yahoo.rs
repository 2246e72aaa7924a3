//! Yahoo Finance data provider.
//!
//! Fetches intraday or daily OHLCV bars from Yahoo's v8 chart API using a
//! trailing `range` and an `interval`. Handles rate limiting, retries with
//! exponential backoff and response parsing.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.
//! The CSV import path is the primary fallback when Yahoo is unavailable.

use std::time::Duration;

use chrono::DateTime;
use serde::Deserialize;
use tracing::{debug, warn};

use super::provider::{DataError, DataProvider, DataSource, FetchRequest, FetchResult};
use crate::domain::PriceBar;

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new() -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Build the chart API URL for a request.
    fn chart_url(request: &FetchRequest) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{}?range={}&interval={}",
            request.symbol, request.period, request.interval
        )
    }

    /// Parse the chart API response into bars.
    ///
    /// Rows where every field is null (non-trading slots) are skipped. Rows
    /// with some nulls are kept with NaN so validation can drop them.
    fn parse_response(symbol: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| {
            if let Some(err) = resp.chart.error {
                if err.code == "Not Found" {
                    DataError::SymbolNotFound {
                        symbol: symbol.to_string(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
                }
            } else {
                DataError::ResponseFormatChanged("empty result with no error".into())
            }
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(PriceBar {
                timestamp,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        Ok(bars)
    }

    fn fetch_with_retry(&self, request: &FetchRequest) -> Result<Vec<PriceBar>, DataError> {
        let symbol = request.symbol.as_str();
        let url = Self::chart_url(request);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        return Err(DataError::NetworkUnreachable(format!(
                            "provider refused request for {symbol} (HTTP 403)"
                        )));
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(symbol, retry_after, "rate limited");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        return Err(DataError::NetworkUnreachable(
                            "Yahoo Finance requires authentication".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        last_error = Some(DataError::NetworkUnreachable(format!(
                            "HTTP {status} for {symbol}"
                        )));
                        continue;
                    }

                    let chart: ChartResponse = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;

                    return Self::parse_response(symbol, chart);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::NetworkUnreachable("max retries exceeded".into())))
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, DataError> {
        if request.symbol.trim().is_empty() {
            return Err(DataError::InvalidRequest("empty symbol".into()));
        }
        let bars = self.fetch_with_retry(request)?;
        Ok(FetchResult {
            symbol: request.symbol.clone(),
            bars,
            source: DataSource::YahooFinance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<PriceBar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(json).unwrap();
        YahooProvider::parse_response("GDX.AX", resp)
    }

    #[test]
    fn url_uses_range_and_interval() {
        let url = YahooProvider::chart_url(&FetchRequest::new("GDX.AX", "90d", "1h"));
        assert!(url.ends_with("/chart/GDX.AX?range=90d&interval=1h"));
    }

    #[test]
    fn parses_quotes_and_skips_empty_slots() {
        let bars = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704186000,1704189600,1704193200],
                "indicators":{"quote":[{
                    "open":[36.5,null,36.8],
                    "high":[36.9,null,37.1],
                    "low":[36.4,null,36.7],
                    "close":[36.7,null,37.0],
                    "volume":[1200,null,900]
                }]}
            }],"error":null}}"#,
        )
        .unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp.timestamp(), 1704186000);
        assert_eq!(bars[0].close, 36.7);
        assert_eq!(bars[1].volume, 900);
    }

    #[test]
    fn partial_nulls_become_nan() {
        let bars = parse(
            r#"{"chart":{"result":[{
                "timestamp":[1704186000],
                "indicators":{"quote":[{
                    "open":[36.5],"high":[null],"low":[36.4],"close":[36.7],"volume":[10]
                }]}
            }],"error":null}}"#,
        )
        .unwrap();
        assert!(bars[0].high.is_nan());
        assert!(bars[0].is_void());
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let err = parse(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn missing_timestamps_is_format_change() {
        let err = parse(
            r#"{"chart":{"result":[{"indicators":{"quote":[{
                "open":[],"high":[],"low":[],"close":[],"volume":[]
            }]}}],"error":null}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }
}
