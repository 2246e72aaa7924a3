//! Bar validation between a provider and the engine.
//!
//! Rows with any NaN OHLC field are dropped. What remains must be sane
//! (positive open and close, high and low bracketing the body) and have
//! strictly increasing timestamps; a malformed, out-of-order or duplicate row
//! is an error, not something to repair.

use tracing::debug;

use super::provider::DataError;
use crate::domain::PriceBar;

/// Validated bars plus how many void rows were discarded.
#[derive(Debug, Clone)]
pub struct ValidatedBars {
    pub bars: Vec<PriceBar>,
    pub dropped: usize,
}

pub fn validate_bars(raw: Vec<PriceBar>) -> Result<ValidatedBars, DataError> {
    let total = raw.len();
    let bars: Vec<PriceBar> = raw.into_iter().filter(|b| !b.is_void()).collect();
    let dropped = total - bars.len();
    if dropped > 0 {
        debug!(dropped, total, "dropped bars with missing prices");
    }

    if bars.is_empty() {
        return Err(DataError::Empty);
    }

    if let Some(index) = bars.iter().position(|b| !b.is_sane()) {
        return Err(DataError::MalformedBar { index });
    }

    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.timestamp == prev.timestamp {
            return Err(DataError::DuplicateTimestamp { index: i + 1 });
        }
        if curr.timestamp < prev.timestamp {
            return Err(DataError::Unordered { index: i + 1 });
        }
    }

    Ok(ValidatedBars { bars, dropped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn clean_bars_pass_through() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let validated = validate_bars(bars.clone()).unwrap();
        assert_eq!(validated.bars, bars);
        assert_eq!(validated.dropped, 0);
    }

    #[test]
    fn void_rows_are_dropped() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[1].close = f64::NAN;
        let validated = validate_bars(bars).unwrap();
        assert_eq!(validated.bars.len(), 2);
        assert_eq!(validated.dropped, 1);
    }

    #[test]
    fn duplicate_timestamp_is_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[2].timestamp = bars[1].timestamp;
        assert!(matches!(
            validate_bars(bars),
            Err(DataError::DuplicateTimestamp { index: 2 })
        ));
    }

    #[test]
    fn unordered_bars_are_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars.swap(0, 1);
        assert!(matches!(
            validate_bars(bars),
            Err(DataError::Unordered { index: 1 })
        ));
    }

    #[test]
    fn all_void_is_empty() {
        let mut bars = make_bars(&[1.0]);
        bars[0].open = f64::NAN;
        assert!(matches!(validate_bars(bars), Err(DataError::Empty)));
        assert!(matches!(validate_bars(Vec::new()), Err(DataError::Empty)));
    }

    #[test]
    fn zero_close_is_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[2].close = 0.0;
        assert!(matches!(
            validate_bars(bars),
            Err(DataError::MalformedBar { index: 2 })
        ));
    }

    #[test]
    fn high_below_low_is_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars[1].high = bars[1].low - 0.5;
        assert!(matches!(
            validate_bars(bars),
            Err(DataError::MalformedBar { index: 1 })
        ));
    }

    #[test]
    fn malformed_index_counts_after_void_rows_are_dropped() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        bars[0].close = f64::NAN;
        bars[3].open = -1.0;
        assert!(matches!(
            validate_bars(bars),
            Err(DataError::MalformedBar { index: 2 })
        ));
    }
}
