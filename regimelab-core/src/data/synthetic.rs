//! Synthetic bars for offline development.
//!
//! A regime-switching random walk starting at 100.0. The RNG is seeded from a
//! BLAKE3 hash of the symbol, so the same request always yields the same
//! bars. Timestamps start at a fixed epoch and step by the request interval.

use chrono::{DateTime, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{parse_span, DataError, DataProvider, DataSource, FetchRequest, FetchResult};
use crate::domain::PriceBar;

/// Bars generated when the period or interval cannot be interpreted.
pub const DEFAULT_SYNTHETIC_BARS: usize = 2_160;

#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, request: &FetchRequest) -> Result<FetchResult, DataError> {
        if request.symbol.trim().is_empty() {
            return Err(DataError::InvalidRequest("empty symbol".into()));
        }
        let step = parse_span(&request.interval).unwrap_or_else(|| chrono::Duration::hours(1));
        let count = match parse_span(&request.period) {
            Some(period) if step.num_seconds() > 0 => {
                ((period.num_seconds() / step.num_seconds()) as usize).max(1)
            }
            _ => DEFAULT_SYNTHETIC_BARS,
        };
        Ok(FetchResult {
            symbol: request.symbol.clone(),
            bars: generate_bars(&request.symbol, count, step),
            source: DataSource::Synthetic,
        })
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Generate `count` bars for `symbol`, `step` apart.
pub fn generate_bars(symbol: &str, count: usize, step: chrono::Duration) -> Vec<PriceBar> {
    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let start = epoch();
    let mut bars = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut drift = 0.0_f64;

    for i in 0..count {
        // Occasionally switch between up, down and sideways drift.
        if i % 50 == 0 {
            drift = rng.gen_range(-0.002..0.003);
        }
        let ret: f64 = drift + rng.gen_range(-0.008..0.008);
        let open = price;
        let close = (price * (1.0 + ret)).max(0.01);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.004));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.004));
        let volume = rng.gen_range(500..50_000u64);

        bars.push(PriceBar {
            timestamp: start + step * i as i32,
            open,
            high,
            low,
            close,
            volume,
        });
        price = close;
    }

    bars
}
