//! Random parameter sampler.
//!
//! Draws each field of a [`ParameterSet`] independently and uniformly from
//! an inclusive range. The caller owns the RNG, so a seeded `StdRng` makes
//! the whole draw sequence reproducible.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::ParameterSet;

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: usize,
    pub max: usize,
}

impl IntRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, v: usize) -> bool {
        (self.min..=self.max).contains(&v)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(self.min..=self.max)
    }
}

/// Inclusive float range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f64,
    pub max: f64,
}

impl FloatRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Inverted or non-finite bounds.
    pub fn is_empty(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite() && self.min <= self.max)
    }

    pub fn contains(&self, v: f64) -> bool {
        (self.min..=self.max).contains(&v)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }
}

/// Bounds for every field of a [`ParameterSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterRanges {
    pub lookback: IntRange,
    pub sensitivity: FloatRange,
    pub ma_length: IntRange,
    pub stop_loss_pct: FloatRange,
    pub risk_reward: FloatRange,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            lookback: IntRange::new(2, 200),
            sensitivity: FloatRange::new(0.5, 3.0),
            ma_length: IntRange::new(2, 200),
            stop_loss_pct: FloatRange::new(0.01, 0.20),
            risk_reward: FloatRange::new(1.0, 20.0),
        }
    }
}

impl ParameterRanges {
    /// Draw one parameter set. Fields are drawn in declaration order.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParameterSet {
        ParameterSet {
            lookback: self.lookback.sample(rng),
            sensitivity: self.sensitivity.sample(rng),
            ma_length: self.ma_length.sample(rng),
            stop_loss_pct: self.stop_loss_pct.sample(rng),
            risk_reward: self.risk_reward.sample(rng),
        }
    }

    /// Draw `n` parameter sets sequentially from one stream.
    pub fn sample_n<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<ParameterSet> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Whether `params` lies within every bound.
    pub fn contains(&self, params: &ParameterSet) -> bool {
        self.lookback.contains(params.lookback)
            && self.sensitivity.contains(params.sensitivity)
            && self.ma_length.contains(params.ma_length)
            && self.stop_loss_pct.contains(params.stop_loss_pct)
            && self.risk_reward.contains(params.risk_reward)
    }
}
