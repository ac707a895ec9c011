//! Cross-venue arbitrage detection.
//!
//! Prices both hedge constructions available across two venues quoting the
//! same binary event and keeps the more profitable one that clears the
//! cost ceiling and minimum margin.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::types::{Leg, Opportunity, Outcome, Strategy, VenueQuote};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds an opportunity must clear. Validated once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrageConfig {
    /// Combined leg cost must be strictly below this.
    pub max_cost: Decimal,
    /// Profit (1 - cost) must be at least this.
    pub min_margin: Decimal,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            max_cost: dec!(1.0),
            min_margin: dec!(0.01),
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// A priced hedge construction before threshold filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Candidate {
    strategy: Strategy,
    price_a: Decimal,
    price_b: Decimal,
    cost: Decimal,
    profit: Decimal,
}

impl Candidate {
    fn new(strategy: Strategy, price_a: Decimal, price_b: Decimal) -> Self {
        let cost = price_a + price_b;
        Self {
            strategy,
            price_a,
            price_b,
            cost,
            profit: Decimal::ONE - cost,
        }
    }
}

pub struct ArbitrageEvaluator {
    config: ArbitrageConfig,
}

impl ArbitrageEvaluator {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self { config }
    }

    /// Pick the best qualifying strategy for this pair of quotes, if any.
    ///
    /// Strategy 1 buys UP on A and DOWN on B, where B's DOWN is always
    /// read as `1 - B.up`. Strategy 2 buys DOWN on A and UP on B. When both
    /// qualify with equal profit, Strategy 1 is kept.
    pub fn evaluate(&self, venue_a: &VenueQuote, venue_b: &VenueQuote) -> Option<Opportunity> {
        let (a_up, a_down) = venue_a.prices.usable()?;
        let (b_up, _) = venue_b.prices.usable()?;

        let candidates = [
            Candidate::new(Strategy::UpADownB, a_up, Decimal::ONE - b_up),
            Candidate::new(Strategy::DownAUpB, a_down, b_up),
        ];

        let mut best: Option<Candidate> = None;
        for candidate in candidates {
            if !self.qualifies(&candidate) {
                continue;
            }
            match best {
                Some(current) if candidate.profit <= current.profit => {}
                _ => best = Some(candidate),
            }
        }

        let Some(chosen) = best else {
            debug!(
                venue_a = %venue_a.prices,
                venue_b = %venue_b.prices,
                "No qualifying strategy"
            );
            return None;
        };

        let (side_a, side_b) = chosen.strategy.sides();
        Some(Opportunity {
            strategy: chosen.strategy,
            leg_a: Self::leg(venue_a, side_a, chosen.price_a),
            leg_b: Self::leg(venue_b, side_b, chosen.price_b),
            total_cost: chosen.cost,
            profit: chosen.profit,
            profit_percent: chosen.profit * dec!(100),
        })
    }

    fn qualifies(&self, candidate: &Candidate) -> bool {
        let ok = candidate.cost < self.config.max_cost && candidate.profit >= self.config.min_margin;
        debug!(
            strategy = %candidate.strategy,
            cost = %format!("{:.4}", candidate.cost),
            profit = %format!("{:.4}", candidate.profit),
            qualifies = ok,
            "Strategy priced"
        );
        ok
    }

    fn leg(quote: &VenueQuote, side: Outcome, price: Decimal) -> Leg {
        Leg {
            venue: quote.venue,
            side,
            price,
            routing_token: quote.routes.for_side(side).map(String::from),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
