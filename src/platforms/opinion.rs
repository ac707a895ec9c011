//! Opinion integration (venue B).
//!
//! Opinion is read as a single-sided venue: only the "up" token is quoted
//! and "down" is taken as its complement by the aggregator.
//!
//! Base URL: https://proxy.opinion.trade:8443
//! Auth: `apikey` header on every request.
//!
//! Responses are usually wrapped in a `{"errno", "errmsg", "result"}`
//! envelope, but the book may also arrive bare or under `data`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, info, warn};

use super::{best_bid, OrderRequest, VenueOrderSink, VenuePriceSource};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://proxy.opinion.trade:8443";
const PLATFORM_NAME: &str = "opinion";
const REQUEST_TIMEOUT_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct OpinionClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
}

impl OpinionClient {
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build Opinion HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
        })
    }

    async fn fetch_orderbook(&self, token_id: &str) -> Result<serde_json::Value> {
        let url = format!("{}/openapi/token/orderbook", self.base_url);
        debug!(token_id, "Fetching Opinion order book");

        let resp = self
            .http
            .get(&url)
            .header("apikey", self.api_key.expose_secret().as_str())
            .query(&[("token_id", token_id)])
            .send()
            .await
            .context("Opinion orderbook request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Opinion orderbook error {status}: {body}");
        }

        resp.json()
            .await
            .context("Failed to parse Opinion orderbook response")
    }

    /// Pull the bid levels out of whichever envelope the response uses.
    fn extract_bids(body: &serde_json::Value) -> &[serde_json::Value] {
        ["result", "data"]
            .iter()
            .filter_map(|key| body.get(key))
            .chain(std::iter::once(body))
            .find_map(|node| node.get("bids").and_then(|b| b.as_array()))
            .map(|levels| levels.as_slice())
            .unwrap_or(&[])
    }

    /// Check that the configured API key is accepted.
    ///
    /// `Ok(false)` means the venue answered but rejected or could not
    /// confirm the key.
    pub async fn check_api_key(&self) -> Result<bool> {
        let url = format!("{}/openapi/market", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("apikey", self.api_key.expose_secret().as_str())
            .query(&[("limit", "1")])
            .send()
            .await
            .context("Opinion API key check failed")?;

        match resp.status() {
            StatusCode::OK => {
                info!("Opinion API key accepted");
                Ok(true)
            }
            StatusCode::UNAUTHORIZED => {
                error!("Opinion API key invalid or lacks permission (401)");
                Ok(false)
            }
            other => {
                warn!(status = %other, "Unexpected Opinion API status during key check");
                Ok(false)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Venue trait implementations
// ---------------------------------------------------------------------------

#[async_trait]
impl VenuePriceSource for OpinionClient {
    async fn best_price(&self, outcome_token: &str) -> Option<Decimal> {
        match self.fetch_orderbook(outcome_token).await {
            Ok(body) => {
                let price = best_bid(Self::extract_bids(&body));
                if price.is_none() {
                    debug!(token_id = outcome_token, "Opinion book has no usable bids");
                }
                price
            }
            Err(e) => {
                warn!(token_id = outcome_token, error = %e, "Opinion price fetch failed");
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        PLATFORM_NAME
    }
}

#[async_trait]
impl VenueOrderSink for OpinionClient {
    async fn place_order(&self, order: &OrderRequest) -> bool {
        error!(
            %order,
            "Opinion order signing is not configured, refusing live order"
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
