//! Trade — a closed long round trip.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Win/loss classification of a closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
        }
    }
}

/// Which bracket leg closed the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

impl ExitReason {
    /// Same spelling as the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
        }
    }
}

/// A closed trade. Immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: DateTime<Utc>,
    pub exit_date: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    /// Return in percent: `100 * (exit - entry) / entry`.
    pub pnl_pct: f64,
    #[serde(rename = "type")]
    pub outcome: Outcome,
    pub exit_reason: ExitReason,
    pub entry_index: usize,
    pub exit_index: usize,
}

impl Trade {
    /// Build a trade from fill prices, deriving `pnl_pct` and `outcome`.
    #[allow(clippy::too_many_arguments)]
    pub fn close(
        entry_index: usize,
        entry_date: DateTime<Utc>,
        entry_price: f64,
        exit_index: usize,
        exit_date: DateTime<Utc>,
        exit_price: f64,
        exit_reason: ExitReason,
    ) -> Self {
        let pnl_pct = 100.0 * (exit_price - entry_price) / entry_price;
        let outcome = if pnl_pct > 0.0 {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        Self {
            entry_date,
            exit_date,
            entry_price,
            exit_price,
            pnl_pct,
            outcome,
            exit_reason,
            entry_index,
            exit_index,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.outcome == Outcome::Win
    }

    /// Equity multiplier contributed by this trade.
    pub fn growth_factor(&self) -> f64 {
        1.0 + self.pnl_pct / 100.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }
}
