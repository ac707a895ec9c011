//! Price aggregator.
//!
//! Reads the best bid for each configured outcome token from both venues and
//! normalises them into one `VenueQuote` per venue. All reads within a fetch
//! are issued concurrently; none are retried.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::platforms::VenuePriceSource;
use crate::types::{is_probability, PricePair, QuoteSnapshot, Routes, Venue, VenueQuote};

// ---------------------------------------------------------------------------
// Venue feed
// ---------------------------------------------------------------------------

/// How a venue's two outcome prices are obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quoting {
    /// Both outcome tokens are quoted directly.
    TwoSided { up_token: String, down_token: String },
    /// Only the "up" token is quoted; "down" is its complement. Orders for
    /// "down" route through `down_route` when set, else the up token.
    SingleSided { up_token: String, down_route: Option<String> },
}

/// A price source bound to the tokens of one venue.
pub struct VenueFeed {
    venue: Venue,
    source: Arc<dyn VenuePriceSource>,
    quoting: Quoting,
}

impl VenueFeed {
    pub fn new(venue: Venue, source: Arc<dyn VenuePriceSource>, quoting: Quoting) -> Self {
        Self { venue, source, quoting }
    }

    async fn price(&self, token: &str) -> Option<Decimal> {
        let price = self.source.best_price(token).await;
        match price {
            Some(p) if is_probability(p) => Some(p),
            Some(p) => {
                warn!(venue = self.source.name(), token, price = %p, "Price outside [0, 1], ignoring");
                None
            }
            None => {
                warn!(venue = self.source.name(), token, "No quote");
                None
            }
        }
    }

    /// Quote this venue, or `None` if any required price is unavailable.
    pub async fn quote(&self) -> Option<VenueQuote> {
        let (prices, routes) = match &self.quoting {
            Quoting::TwoSided { up_token, down_token } => {
                let (up, down) = tokio::join!(self.price(up_token), self.price(down_token));
                (
                    PricePair::two_sided(up?, down?),
                    Routes::new(Some(up_token.clone()), Some(down_token.clone())),
                )
            }
            Quoting::SingleSided { up_token, down_route } => {
                let up = self.price(up_token).await?;
                let down_route = down_route.clone().unwrap_or_else(|| up_token.clone());
                (
                    PricePair::single_sided(up),
                    Routes::new(Some(up_token.clone()), Some(down_route)),
                )
            }
        };

        Some(VenueQuote::new(self.venue, prices).with_routes(routes))
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

pub struct PriceAggregator {
    venue_a: VenueFeed,
    venue_b: VenueFeed,
}

impl PriceAggregator {
    pub fn new(venue_a: VenueFeed, venue_b: VenueFeed) -> Self {
        Self { venue_a, venue_b }
    }

    /// Fetch both venues' quotes. `None` if either venue is missing a price.
    pub async fn fetch(&self) -> Option<QuoteSnapshot> {
        let (venue_a, venue_b) = tokio::join!(self.venue_a.quote(), self.venue_b.quote());

        let (Some(venue_a), Some(venue_b)) = (venue_a, venue_b) else {
            debug!("Quote snapshot incomplete, skipping cycle");
            return None;
        };

        debug!(
            venue_a = %venue_a.prices,
            venue_b = %venue_b.prices,
            "Quotes fetched"
        );

        Some(QuoteSnapshot { venue_a, venue_b })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
