use serde::{Deserialize, Serialize};

/// Open long position with its bracket.
///
/// Exists only while the simulator is LONG; at most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub entry_index: usize,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
}

impl Position {
    /// Open at `entry_price` with a percentage stop and a risk/reward target.
    pub fn open(entry_index: usize, entry_price: f64, stop_loss_pct: f64, risk_reward: f64) -> Self {
        let stop_price = entry_price * (1.0 - stop_loss_pct);
        let stop_size = entry_price - stop_price;
        Self {
            entry_index,
            entry_price,
            stop_price,
            target_price: entry_price + stop_size * risk_reward,
        }
    }
}
