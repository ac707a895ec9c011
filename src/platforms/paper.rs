//! Paper order sink for dry-run mode.
//!
//! Confirms every well-formed order without contacting a venue, so the full
//! detect → size → sequence path can run against live quotes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

use super::{OrderRequest, VenueOrderSink};

pub struct PaperOrderSink {
    name: &'static str,
    placed: AtomicU64,
}

impl PaperOrderSink {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            placed: AtomicU64::new(0),
        }
    }

    /// Orders confirmed so far.
    pub fn placed(&self) -> u64 {
        self.placed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VenueOrderSink for PaperOrderSink {
    async fn place_order(&self, order: &OrderRequest) -> bool {
        if order.amount <= Decimal::ZERO {
            warn!(venue = self.name, %order, "[DRY RUN] Rejecting non-positive order amount");
            return false;
        }

        let order_id = format!("paper-{}", uuid::Uuid::new_v4());
        self.placed.fetch_add(1, Ordering::Relaxed);
        info!(
            venue = self.name,
            order_id = %order_id,
            side = %order.side,
            amount = format!("${:.2}", order.amount),
            price = %format!("{:.4}", order.price),
            "[DRY RUN] Would place order"
        );
        true
    }

    fn is_executable(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
