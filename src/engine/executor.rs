//! Execution sequencer.
//!
//! Places the two legs of an opportunity strictly in order: venue A first,
//! venue B only after A is confirmed. A trade is recorded in the ledger only
//! when both legs are confirmed. A leg B rejection after leg A filled leaves
//! an unhedged position, which is surfaced as its own failure kind and never
//! retried or unwound here.

use chrono::Utc;
use futures::FutureExt;
use rust_decimal::Decimal;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::panic_message;
use crate::platforms::{OrderRequest, VenueOrderSink};
use crate::strategy::sizing::PositionSizer;
use crate::types::{Leg, Opportunity, TradeRecord};

// ---------------------------------------------------------------------------
// Failure kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionFailure {
    #[error("allocation is zero, no order placed")]
    ZeroAllocation,

    #[error("leg A rejected ({leg}), no exposure taken")]
    LegAFailed { leg: Leg },

    #[error("leg B rejected ({rejected}) after leg A filled ({filled} for ${amount_a:.2}), position is unhedged")]
    LegBFailedAfterLegA {
        filled: Leg,
        amount_a: Decimal,
        rejected: Leg,
    },
}

impl ExecutionFailure {
    /// Leg A is live without its hedge.
    pub fn is_partial_hedge(&self) -> bool {
        matches!(self, ExecutionFailure::LegBFailedAfterLegA { .. })
    }
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

pub struct ExecutionSequencer {
    sink_a: Arc<dyn VenueOrderSink>,
    sink_b: Arc<dyn VenueOrderSink>,
    ledger: Vec<TradeRecord>,
}

impl ExecutionSequencer {
    pub fn new(sink_a: Arc<dyn VenueOrderSink>, sink_b: Arc<dyn VenueOrderSink>) -> Self {
        Self {
            sink_a,
            sink_b,
            ledger: Vec::new(),
        }
    }

    /// Size and place both legs of `opportunity`.
    ///
    /// At most one order per venue is placed per call. On success the new
    /// record is appended to the ledger and returned.
    pub async fn execute(
        &mut self,
        opportunity: &Opportunity,
        position_size: Decimal,
    ) -> Result<TradeRecord, ExecutionFailure> {
        let alloc = PositionSizer::allocate(
            position_size,
            opportunity.leg_a.price,
            opportunity.leg_b.price,
        );
        if alloc.is_zero() {
            warn!(strategy = %opportunity.strategy, "Zero allocation, skipping execution");
            return Err(ExecutionFailure::ZeroAllocation);
        }

        let expected_profit = opportunity.expected_profit(position_size);

        let order_a = order_for(&opportunity.leg_a, alloc.amount_a);
        info!(venue = self.sink_a.name(), %order_a, "Placing leg A");
        if !place(self.sink_a.as_ref(), &order_a).await {
            warn!(venue = self.sink_a.name(), %order_a, "Leg A rejected, aborting trade");
            return Err(ExecutionFailure::LegAFailed {
                leg: opportunity.leg_a.clone(),
            });
        }

        let order_b = order_for(&opportunity.leg_b, alloc.amount_b);
        info!(venue = self.sink_b.name(), %order_b, "Placing leg B");
        if !place(self.sink_b.as_ref(), &order_b).await {
            let failure = ExecutionFailure::LegBFailedAfterLegA {
                filled: opportunity.leg_a.clone(),
                amount_a: alloc.amount_a,
                rejected: opportunity.leg_b.clone(),
            };
            error!(
                venue_a = self.sink_a.name(),
                venue_b = self.sink_b.name(),
                exposure = format!("${:.2}", alloc.amount_a),
                "{failure}. Manual unwind required."
            );
            return Err(failure);
        }

        let record = TradeRecord {
            id: Uuid::new_v4(),
            strategy: opportunity.strategy,
            leg_a: opportunity.leg_a.clone(),
            leg_b: opportunity.leg_b.clone(),
            amount_a: alloc.amount_a,
            amount_b: alloc.amount_b,
            position_size,
            expected_profit,
            timestamp: Utc::now(),
        };

        info!(
            trade_id = %record.id,
            strategy = %record.strategy,
            amount_a = format!("${:.2}", record.amount_a),
            amount_b = format!("${:.2}", record.amount_b),
            expected_profit = format!("${:.2}", record.expected_profit),
            "Both legs confirmed"
        );

        self.ledger.push(record.clone());
        Ok(record)
    }

    /// Every fully executed trade, oldest first.
    pub fn history(&self) -> &[TradeRecord] {
        &self.ledger
    }
}

/// Place one order. A sink that panics is treated as having rejected it.
async fn place(sink: &dyn VenueOrderSink, order: &OrderRequest) -> bool {
    match AssertUnwindSafe(sink.place_order(order)).catch_unwind().await {
        Ok(confirmed) => confirmed,
        Err(panic) => {
            error!(
                venue = sink.name(),
                %order,
                reason = %panic_message(panic.as_ref()),
                "Order placement panicked, treating as rejected"
            );
            false
        }
    }
}

fn order_for(leg: &Leg, amount: Decimal) -> OrderRequest {
    OrderRequest {
        venue: leg.venue,
        routing_token: leg.routing_token.clone(),
        side: leg.side,
        amount,
        price: leg.price,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
