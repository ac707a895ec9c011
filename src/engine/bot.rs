//! Poll loop.
//!
//! Drives fetch → evaluate → execute on a fixed interval and keeps the run
//! statistics. Cycles run inside the loop body and never overlap, so the
//! shutdown signal is only observed between cycles.

use futures::FutureExt;
use rust_decimal::Decimal;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::engine::accountant::{Accountant, CycleOutcome};
use crate::engine::aggregator::PriceAggregator;
use crate::engine::executor::ExecutionSequencer;
use crate::engine::panic_message;
use crate::strategy::ArbitrageEvaluator;
use crate::types::{RunStats, TradeRecord};

/// Heartbeat is logged every this many checks.
const HEARTBEAT_EVERY: u64 = 100;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub poll_interval: Duration,
    /// Total notional per trade, split across both legs.
    pub position_size: Decimal,
    /// Stop after this many cycles. `None` runs until shutdown.
    pub max_cycles: Option<u64>,
}

// ---------------------------------------------------------------------------
// Bot
// ---------------------------------------------------------------------------

pub struct ArbitrageBot {
    config: BotConfig,
    aggregator: PriceAggregator,
    evaluator: ArbitrageEvaluator,
    sequencer: ExecutionSequencer,
    stats: RunStats,
}

impl ArbitrageBot {
    pub fn new(
        config: BotConfig,
        aggregator: PriceAggregator,
        evaluator: ArbitrageEvaluator,
        sequencer: ExecutionSequencer,
    ) -> Self {
        Self {
            config,
            aggregator,
            evaluator,
            sequencer,
            stats: RunStats::new(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn history(&self) -> &[TradeRecord] {
        self.sequencer.history()
    }

    /// One fetch → evaluate → execute pass. Does not touch `RunStats`.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let Some(snapshot) = self.aggregator.fetch().await else {
            return CycleOutcome::NoPrices;
        };

        let Some(opportunity) = self.evaluator.evaluate(&snapshot.venue_a, &snapshot.venue_b) else {
            return CycleOutcome::NoOpportunity;
        };

        info!(
            strategy = %opportunity.strategy,
            leg_a = %opportunity.leg_a,
            leg_b = %opportunity.leg_b,
            total_cost = format!("${:.4}", opportunity.total_cost),
            profit = format!("{:.2}%", opportunity.profit_percent),
            expected = format!("${:.2}", opportunity.expected_profit(self.config.position_size)),
            "Arbitrage opportunity"
        );

        match self.sequencer.execute(&opportunity, self.config.position_size).await {
            Ok(record) => CycleOutcome::Executed(record),
            Err(failure) => CycleOutcome::Failed(failure),
        }
    }

    /// Poll until `shutdown` resolves or `max_cycles` is reached, then log
    /// and return the final statistics.
    pub async fn run<F>(&mut self, shutdown: F) -> RunStats
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            interval_ms = self.config.poll_interval.as_millis() as u64,
            position_size = format!("${:.2}", self.config.position_size),
            max_cycles = ?self.config.max_cycles,
            "Entering poll loop. Press Ctrl+C to stop."
        );

        // Stats live in the guard for the duration of the loop so the summary
        // is logged on every exit, unwinding included.
        let mut guard = SummaryGuard(std::mem::take(&mut self.stats));

        loop {
            if let Some(max) = self.config.max_cycles {
                if guard.0.checks >= max {
                    info!(cycles = max, "Cycle limit reached");
                    break;
                }
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
                _ = interval.tick() => {
                    let outcome = match AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                        Ok(outcome) => outcome,
                        Err(panic) => {
                            error!(reason = %panic_message(panic.as_ref()), "Cycle panicked, continuing");
                            CycleOutcome::Faulted
                        }
                    };
                    debug!(check = guard.0.checks + 1, outcome = ?outcome, "Cycle complete");

                    Accountant::record(&mut guard.0, &outcome);
                    if guard.0.checks % HEARTBEAT_EVERY == 0 {
                        Accountant::log_heartbeat(&guard.0);
                    }
                }
            }
        }

        self.stats = guard.0.clone();
        self.stats.clone()
    }
}

/// Logs the run summary when dropped.
struct SummaryGuard(RunStats);

impl Drop for SummaryGuard {
    fn drop(&mut self) {
        Accountant::log_summary(&self.0);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
