//! Core engine: the fetch → evaluate → execute poll loop.

pub mod accountant;
pub mod aggregator;
pub mod bot;
pub mod executor;

pub use accountant::{Accountant, CycleOutcome};
pub use aggregator::{PriceAggregator, Quoting, VenueFeed};
pub use bot::{ArbitrageBot, BotConfig};
pub use executor::{ExecutionFailure, ExecutionSequencer};

use std::any::Any;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
