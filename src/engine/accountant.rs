//! Accountant: run statistics and summaries.
//!
//! Folds each cycle's outcome into the process-wide `RunStats` and renders
//! the periodic heartbeat and final summary.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::engine::executor::ExecutionFailure;
use crate::types::{RunStats, TradeRecord};

// ---------------------------------------------------------------------------
// Cycle outcome
// ---------------------------------------------------------------------------

/// What a single poll cycle ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// At least one venue had no usable price.
    NoPrices,
    /// Prices were available but no strategy qualified.
    NoOpportunity,
    Executed(TradeRecord),
    Failed(ExecutionFailure),
    /// The cycle panicked and was contained.
    Faulted,
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

pub struct Accountant;

impl Accountant {
    /// Record one completed cycle.
    pub fn record(stats: &mut RunStats, outcome: &CycleOutcome) {
        stats.checks += 1;

        match outcome {
            CycleOutcome::NoPrices | CycleOutcome::NoOpportunity => {}
            CycleOutcome::Executed(trade) => {
                stats.opportunities_found += 1;
                stats.trades_executed += 1;
                stats.total_expected_profit = stats
                    .total_expected_profit
                    .checked_add(trade.expected_profit)
                    .unwrap_or_else(|| {
                        warn!("Expected profit total overflowed, holding at the limit");
                        if trade.expected_profit.is_sign_negative() {
                            Decimal::MIN
                        } else {
                            Decimal::MAX
                        }
                    });
            }
            CycleOutcome::Failed(failure) => {
                stats.opportunities_found += 1;
                stats.execution_failures += 1;
                if failure.is_partial_hedge() {
                    stats.partial_hedges += 1;
                }
            }
            CycleOutcome::Faulted => {
                stats.faulted_cycles += 1;
            }
        }
    }

    /// Periodic status line.
    pub fn log_heartbeat(stats: &RunStats) {
        debug!(
            checks = stats.checks,
            opportunities = stats.opportunities_found,
            trades = stats.trades_executed,
            expected_profit = format!("${:.2}", stats.total_expected_profit),
            "Still scanning"
        );
    }

    /// Final summary emitted on shutdown.
    pub fn log_summary(stats: &RunStats) {
        let uptime = stats.uptime();
        info!(
            uptime_secs = uptime.num_seconds(),
            checks = stats.checks,
            opportunities = stats.opportunities_found,
            trades = stats.trades_executed,
            failures = stats.execution_failures,
            fill_rate = format!("{:.1}%", stats.fill_rate()),
            expected_profit = format!("${:.2}", stats.total_expected_profit),
            "Run summary"
        );

        if stats.partial_hedges > 0 {
            warn!(
                partial_hedges = stats.partial_hedges,
                "Unhedged positions were left open and need manual review"
            );
        }
        if stats.faulted_cycles > 0 {
            warn!(faulted_cycles = stats.faulted_cycles, "Some cycles faulted");
        }
    }

    /// Average expected profit per executed trade.
    pub fn average_profit(stats: &RunStats) -> Decimal {
        if stats.trades_executed == 0 {
            return Decimal::ZERO;
        }
        stats.total_expected_profit / Decimal::from(stats.trades_executed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
