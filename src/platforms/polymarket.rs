//! Polymarket CLOB integration (venue A).
//!
//! Quotes are read from the public order book endpoint; no auth required.
//! Each outcome ("up" / "down") has its own token ID, so both sides are
//! quoted directly.
//!
//! CLOB API: https://clob.polymarket.com
//!
//! Placing orders needs a Polygon wallet and EIP-712 order signing, which
//! this client does not do. Live orders are refused, so a live leg A fails
//! before any exposure is taken.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, error, warn};

use super::{best_bid, OrderRequest, VenueOrderSink, VenuePriceSource};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://clob.polymarket.com";
const PLATFORM_NAME: &str = "polymarket";
const REQUEST_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// API response types
// ---------------------------------------------------------------------------

/// `/book` response. Levels are kept as raw JSON because their shape
/// varies between `[price, size]` and `{price, size}`.
#[derive(Debug, Deserialize)]
struct BookResponse {
    #[serde(default)]
    bids: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct PolymarketClient {
    http: Client,
    base_url: String,
}

impl PolymarketClient {
    pub fn new(base_url: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build Polymarket HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    async fn fetch_book(&self, token_id: &str) -> Result<BookResponse> {
        let url = format!("{}/book", self.base_url);
        debug!(token_id, "Fetching Polymarket order book");

        let resp = self
            .http
            .get(&url)
            .query(&[("token_id", token_id)])
            .send()
            .await
            .context("Polymarket book request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Polymarket book error {status}: {body}");
        }

        resp.json()
            .await
            .context("Failed to parse Polymarket book response")
    }

    /// Check the CLOB is reachable.
    pub async fn ping(&self) -> Result<()> {
        let url = format!("{}/time", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Polymarket connectivity check failed")?;

        if !resp.status().is_success() {
            anyhow::bail!("Polymarket returned {}", resp.status());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Venue trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl VenuePriceSource for PolymarketClient {
    async fn best_price(&self, outcome_token: &str) -> Option<Decimal> {
        match self.fetch_book(outcome_token).await {
            Ok(book) => {
                let price = best_bid(&book.bids);
                if price.is_none() {
                    debug!(token_id = outcome_token, "Polymarket book has no usable bids");
                }
                price
            }
            Err(e) => {
                warn!(token_id = outcome_token, error = %e, "Polymarket price fetch failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        PLATFORM_NAME
    }
}

#[async_trait]
impl VenueOrderSink for PolymarketClient {
    async fn place_order(&self, order: &OrderRequest) -> bool {
        error!(
            %order,
            "Polymarket order signing is not configured, refusing live order"
        );
        false
    }

    fn is_executable(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        PLATFORM_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
