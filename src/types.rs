//! Shared types for the crossarb bot.
//!
//! These types form the data model passed between the aggregator,
//! evaluator, sizer, sequencer, and poll loop. None of them hold
//! references into each other, so every stage can be tested in isolation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// One of the two mutually exclusive outcomes of the underlying event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Up,
    Down,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Up => write!(f, "UP"),
            Outcome::Down => write!(f, "DOWN"),
        }
    }
}

/// Which of the two venues a quote or leg belongs to.
///
/// Venue A is the two-sided venue whose legs are always placed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    A,
    B,
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Venue::A => write!(f, "A"),
            Venue::B => write!(f, "B"),
        }
    }
}

// ---------------------------------------------------------------------------
// Quotes
// ---------------------------------------------------------------------------

/// Whether a price is a usable probability.
pub fn is_probability(price: Decimal) -> bool {
    price >= Decimal::ZERO && price <= Decimal::ONE
}

/// Best-bid prices for both outcomes on one venue.
///
/// The two prices are independent and need not sum to 1. A missing price
/// stays missing; nothing downstream substitutes a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricePair {
    pub up: Option<Decimal>,
    pub down: Option<Decimal>,
}

impl PricePair {
    /// A venue that quotes both outcomes.
    pub fn two_sided(up: Decimal, down: Decimal) -> Self {
        Self { up: Some(up), down: Some(down) }
    }

    /// A venue that only quotes "up"; "down" is read as its complement.
    pub fn single_sided(up: Decimal) -> Self {
        Self { up: Some(up), down: Some(Decimal::ONE - up) }
    }

    pub fn missing() -> Self {
        Self::default()
    }

    /// Both prices, if present and inside `[0, 1]`.
    pub fn usable(&self) -> Option<(Decimal, Decimal)> {
        let up = self.up.filter(|p| is_probability(*p))?;
        let down = self.down.filter(|p| is_probability(*p))?;
        Some((up, down))
    }
}

impl fmt::Display for PricePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |p: Option<Decimal>| match p {
            Some(p) => format!("{:.4}", p),
            None => "--".to_string(),
        };
        write!(f, "UP {} | DOWN {}", show(self.up), show(self.down))
    }
}

/// Venue-specific identifiers handed back to the order sink, per outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Routes {
    pub up: Option<String>,
    pub down: Option<String>,
}

impl Routes {
    pub fn new(up: Option<String>, down: Option<String>) -> Self {
        Self { up, down }
    }

    pub fn for_side(&self, outcome: Outcome) -> Option<&str> {
        match outcome {
            Outcome::Up => self.up.as_deref(),
            Outcome::Down => self.down.as_deref(),
        }
    }
}

/// One venue's normalised quote for the current poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueQuote {
    pub venue: Venue,
    pub prices: PricePair,
    pub routes: Routes,
}

impl VenueQuote {
    pub fn new(venue: Venue, prices: PricePair) -> Self {
        Self { venue, prices, routes: Routes::default() }
    }

    pub fn with_routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }
}

/// Both venues' quotes from a single aggregator fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub venue_a: VenueQuote,
    pub venue_b: VenueQuote,
}

// ---------------------------------------------------------------------------
// Opportunities and trades
// ---------------------------------------------------------------------------

/// The two cross-venue hedge constructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// Buy UP on venue A, buy DOWN on venue B.
    UpADownB,
    /// Buy DOWN on venue A, buy UP on venue B.
    DownAUpB,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::UpADownB => "A_UP + B_DOWN",
            Strategy::DownAUpB => "A_DOWN + B_UP",
        }
    }

    /// Side bought on (venue A, venue B).
    pub fn sides(&self) -> (Outcome, Outcome) {
        match self {
            Strategy::UpADownB => (Outcome::Up, Outcome::Down),
            Strategy::DownAUpB => (Outcome::Down, Outcome::Up),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One side of a paired trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub venue: Venue,
    pub side: Outcome,
    /// Price paid for `side` on `venue`.
    pub price: Decimal,
    pub routing_token: Option<String>,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {:.4}", self.venue, self.side, self.price)
    }
}

/// The arbitrage chosen for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub strategy: Strategy,
    pub leg_a: Leg,
    pub leg_b: Leg,
    /// `leg_a.price + leg_b.price`
    pub total_cost: Decimal,
    /// `1 - total_cost`
    pub profit: Decimal,
    pub profit_percent: Decimal,
}

impl Opportunity {
    /// Expected profit for a given notional.
    pub fn expected_profit(&self, position_size: Decimal) -> Decimal {
        self.profit * position_size
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} + {} | cost ${:.4} | profit ${:.4} ({:.2}%)",
            self.strategy, self.leg_a, self.leg_b, self.total_cost, self.profit, self.profit_percent,
        )
    }
}

/// Ledger entry for a fully hedged trade. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub strategy: Strategy,
    pub leg_a: Leg,
    pub leg_b: Leg,
    pub amount_a: Decimal,
    pub amount_b: Decimal,
    pub position_size: Decimal,
    pub expected_profit: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for TradeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | {} ${:.2} + {} ${:.2} | expected ${:.2}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.strategy,
            self.leg_a,
            self.amount_a,
            self.leg_b,
            self.amount_b,
            self.expected_profit,
        )
    }
}

// ---------------------------------------------------------------------------
// Run statistics
// ---------------------------------------------------------------------------

/// Process-wide counters, reset only on restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub checks: u64,
    pub opportunities_found: u64,
    pub trades_executed: u64,
    pub total_expected_profit: Decimal,
    pub execution_failures: u64,
    /// Leg A filled, leg B did not. Each one needs a manual unwind.
    pub partial_hedges: u64,
    pub faulted_cycles: u64,
    pub started_at: DateTime<Utc>,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            checks: 0,
            opportunities_found: 0,
            trades_executed: 0,
            total_expected_profit: Decimal::ZERO,
            execution_failures: 0,
            partial_hedges: 0,
            faulted_cycles: 0,
            started_at: Utc::now(),
        }
    }

    /// Share of found opportunities that were fully executed, in percent.
    pub fn fill_rate(&self) -> Decimal {
        if self.opportunities_found == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.trades_executed) / Decimal::from(self.opportunities_found) * dec!(100)
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "checks:                {}", self.checks)?;
        writeln!(f, "opportunities_found:   {}", self.opportunities_found)?;
        writeln!(f, "trades_executed:       {}", self.trades_executed)?;
        writeln!(f, "execution_failures:    {}", self.execution_failures)?;
        writeln!(f, "partial_hedges:        {}", self.partial_hedges)?;
        writeln!(f, "faulted_cycles:        {}", self.faulted_cycles)?;
        write!(f, "total_expected_profit: ${:.2}", self.total_expected_profit)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
