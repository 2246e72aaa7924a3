//! Domain types for RegimeLab

pub mod bar;
pub mod params;
pub mod position;
pub mod trade;

pub use bar::PriceBar;
pub use params::{ParameterError, ParameterSet};
pub use position::Position;
pub use trade::{ExitReason, Outcome, Trade};
