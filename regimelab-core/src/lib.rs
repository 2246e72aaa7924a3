//! RegimeLab Core — domain types, indicators, regime filter and trade simulator.
//!
//! This crate contains the per-parameter-set back-test engine:
//! - Domain types (bars, parameter sets, positions, trades)
//! - Incremental O(n) indicators (SMA, ATR, rolling lowest low)
//! - Regime classifier gating entries
//! - FLAT/LONG trade simulator with stop-before-target exits
//! - Random parameter sampler
//! - Bar providers (Yahoo chart API, CSV, synthetic) and bar validation

pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod regime;
pub mod sampler;

pub use domain::{ExitReason, Outcome, ParameterSet, Position, PriceBar, Trade};
pub use engine::{run_simulation, EngineConfig, SimulationControl, SimulationError, SimulationRun};
pub use regime::RegimeConfig;
pub use sampler::ParameterRanges;
