//! Venue integrations.
//!
//! Defines the two capabilities the core needs from a venue and provides
//! implementations for:
//! - Polymarket: two-sided CLOB quotes (venue A)
//! - Opinion: single-sided quotes (venue B)
//! - Paper: confirms orders without touching a venue (dry-run mode)
//!
//! All venue-specific response parsing stays inside the adapters. The core
//! only ever sees `Option<Decimal>` prices and `bool` order confirmations.

pub mod opinion;
pub mod paper;
pub mod polymarket;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Outcome, Venue};

/// Read side of a venue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VenuePriceSource: Send + Sync {
    /// Best bid for the given outcome token, as a probability in `[0, 1]`.
    ///
    /// Returns `None` on any failure to produce a usable price, including
    /// transport errors. Never errors past this boundary.
    async fn best_price(&self, outcome_token: &str) -> Option<Decimal>;

    /// Venue name for logging.
    fn name(&self) -> &'static str;
}

/// Write side of a venue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VenueOrderSink: Send + Sync {
    /// Place an order. `true` means the venue confirmed it.
    async fn place_order(&self, order: &OrderRequest) -> bool;

    /// Whether this sink can place real orders.
    fn is_executable(&self) -> bool;

    /// Venue name for logging.
    fn name(&self) -> &'static str;
}

/// A single order handed to a `VenueOrderSink`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub venue: Venue,
    pub routing_token: Option<String>,
    pub side: Outcome,
    /// Notional in quote currency.
    pub amount: Decimal,
    pub price: Decimal,
}

impl fmt::Display for OrderRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] BUY {} ${:.2} @ {:.4} ({})",
            self.venue,
            self.side,
            self.amount,
            self.price,
            self.routing_token.as_deref().unwrap_or("no route"),
        )
    }
}

// ---------------------------------------------------------------------------
// Orderbook parsing shared by the adapters
// ---------------------------------------------------------------------------

/// Read a price from a JSON string or number.
fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Number(n) => n.to_string().parse().ok(),
        _ => None,
    }
}

/// Price of a single book level, shaped either `[price, size]` or
/// `{"price": .., "size": ..}`.
pub(crate) fn level_price(level: &serde_json::Value) -> Option<Decimal> {
    match level {
        serde_json::Value::Array(items) => items.first().and_then(decimal_from_json),
        serde_json::Value::Object(map) => map.get("price").and_then(decimal_from_json),
        _ => None,
    }
}

/// Highest bid among the levels that parse as a probability.
///
/// Venues disagree on sort order, so the maximum is taken rather than the
/// first level.
pub(crate) fn best_bid(levels: &[serde_json::Value]) -> Option<Decimal> {
    levels
        .iter()
        .filter_map(level_price)
        .filter(|p| crate::types::is_probability(*p))
        .max()
}
