//! Rolling lowest low — min(low[t-period+1..=t]).
//!
//! Maintained with a monotonic deque of candidate indices, so each bar is
//! pushed and popped at most once.
//! Lookback: period - 1.

use std::collections::VecDeque;

use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct LowestLow {
    period: usize,
    name: String,
}

impl LowestLow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "lowest-low period must be >= 1");
        Self {
            period,
            name: format!("lowest_low_{period}"),
        }
    }
}

impl Indicator for LowestLow {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        if n < self.period {
            return result;
        }

        // Indices with strictly increasing lows; front is the window minimum.
        let mut window: VecDeque<usize> = VecDeque::with_capacity(self.period);

        for (i, bar) in bars.iter().enumerate() {
            while window.back().is_some_and(|&j| bars[j].low >= bar.low) {
                window.pop_back();
            }
            window.push_back(i);

            if window.front().is_some_and(|&j| j + self.period <= i) {
                window.pop_front();
            }

            if i + 1 >= self.period {
                if let Some(&j) = window.front() {
                    result[i] = bars[j].low;
                }
            }
        }

        result
    }
}
