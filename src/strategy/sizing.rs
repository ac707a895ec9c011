//! Position sizing for paired legs.
//!
//! Splits a total notional across the two legs in proportion to each leg's
//! price, so the capital ratio matches the cost ratio used to price the hedge.

use rust_decimal::Decimal;
use tracing::debug;

/// Notional assigned to each leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub amount_a: Decimal,
    pub amount_b: Decimal,
}

impl Allocation {
    pub fn zero() -> Self {
        Self {
            amount_a: Decimal::ZERO,
            amount_b: Decimal::ZERO,
        }
    }

    /// A zero allocation means "do not trade".
    pub fn is_zero(&self) -> bool {
        self.amount_a.is_zero() && self.amount_b.is_zero()
    }

    pub fn total(&self) -> Decimal {
        self.amount_a + self.amount_b
    }
}

pub struct PositionSizer;

impl PositionSizer {
    /// Allocate `total` across two legs priced `price_a` and `price_b`.
    ///
    /// `amount_b` is taken as the remainder so the two amounts always sum to
    /// `total` exactly. Returns a zero allocation when the prices sum to zero
    /// or less.
    pub fn allocate(total: Decimal, price_a: Decimal, price_b: Decimal) -> Allocation {
        let combined = price_a + price_b;
        if combined <= Decimal::ZERO {
            debug!(%price_a, %price_b, "Degenerate leg prices, nothing allocated");
            return Allocation::zero();
        }

        let amount_a = total * price_a / combined;
        let amount_b = total - amount_a;

        debug!(
            total = format!("${:.2}", total),
            amount_a = format!("${:.2}", amount_a),
            amount_b = format!("${:.2}", amount_b),
            "Position allocated"
        );

        Allocation { amount_a, amount_b }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
