//! Bounded top-K leaderboard.
//!
//! Entries are ranked by `final_return` descending, then `max_drawdown_pct`
//! ascending, then sample index ascending. The order is total, so the final
//! ranking does not depend on the order in which results arrive: partial
//! boards built on different worker threads can be merged in any order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::runner::BacktestResult;

/// A single entry in the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Position of the parameter set in the sampled sequence.
    pub sample_index: usize,
    pub result: BacktestResult,
}

/// Outcome of an insert operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    /// Worse than every kept entry of a full board, or non-finite return.
    Skipped,
}

/// Ranking order: best first.
pub fn rank_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.result
        .final_return()
        .total_cmp(&a.result.final_return())
        .then_with(|| {
            a.result
                .max_drawdown_pct()
                .total_cmp(&b.result.max_drawdown_pct())
        })
        .then_with(|| a.sample_index.cmp(&b.sample_index))
}

#[derive(Debug, Clone)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    max_size: usize,
}

impl Leaderboard {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::with_capacity(max_size.min(1024) + 1),
            max_size,
        }
    }

    pub fn insert(&mut self, entry: LeaderboardEntry) -> InsertResult {
        if !entry.result.final_return().is_finite() || self.max_size == 0 {
            return InsertResult::Skipped;
        }

        if self.entries.len() >= self.max_size {
            match self.entries.last() {
                Some(worst) if rank_order(&entry, worst) == Ordering::Less => {}
                _ => return InsertResult::Skipped,
            }
        }

        let pos = self
            .entries
            .partition_point(|e| rank_order(e, &entry) == Ordering::Less);
        self.entries.insert(pos, entry);
        self.entries.truncate(self.max_size);
        InsertResult::Inserted
    }

    /// Fold another board into this one.
    pub fn merge(mut self, other: Leaderboard) -> Self {
        for entry in other.entries {
            self.insert(entry);
        }
        self
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        self.entries
    }

    pub fn best(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
