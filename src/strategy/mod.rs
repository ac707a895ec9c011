//! Strategy layer.
//!
//! Opportunity detection across the two venues and notional allocation
//! between the legs of the chosen hedge.

pub mod arbitrage;
pub mod sizing;

pub use arbitrage::{ArbitrageConfig, ArbitrageEvaluator};
pub use sizing::{Allocation, PositionSizer};
