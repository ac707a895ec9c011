//! crossarb: Polymarket × Opinion arbitrage bot.
//!
//! Entry point. Loads and validates configuration, initialises structured
//! logging, checks venue connectivity, and runs the poll loop until Ctrl+C
//! or the configured cycle limit.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};

use crossarb::config::{self, Settings};
use crossarb::engine::{
    Accountant, ArbitrageBot, ExecutionSequencer, PriceAggregator, Quoting, VenueFeed,
};
use crossarb::platforms::opinion::OpinionClient;
use crossarb::platforms::paper::PaperOrderSink;
use crossarb::platforms::polymarket::PolymarketClient;
use crossarb::platforms::VenueOrderSink;
use crossarb::strategy::ArbitrageEvaluator;
use crossarb::types::{RunStats, Venue};

const BANNER: &str = r#"
  ___ ___  ___  ___ ___   _   ___ ___
 / __| _ \/ _ \/ __/ __| /_\ | _ \ _ )
| (__|   / (_) \__ \__ \/ _ \|   / _ \
 \___|_|_\\___/|___/___/_/ \_\_|_\___/

  Polymarket x Opinion binary-outcome arbitrage
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let raw = config::AppConfig::load(&config_path)?;
    let settings = raw.validate().context("Startup configuration check failed")?;

    init_logging(&settings);

    println!("{BANNER}");
    info!(
        config = %config_path,
        dry_run = settings.dry_run,
        poll_interval_ms = settings.bot.poll_interval.as_millis() as u64,
        max_cost = %settings.arbitrage.max_cost,
        min_margin = %settings.arbitrage.min_margin,
        position_size = format!("${:.2}", settings.bot.position_size),
        "crossarb starting up"
    );

    // -- Venue clients ---------------------------------------------------

    let polymarket = Arc::new(PolymarketClient::new(settings.polymarket.base_url.clone())?);
    let opinion = Arc::new(OpinionClient::new(
        settings.opinion.api_key,
        settings.opinion.base_url.clone(),
    )?);

    check_connectivity(&polymarket, &opinion).await;

    // -- Order sinks -----------------------------------------------------

    let (sink_a, sink_b): (Arc<dyn VenueOrderSink>, Arc<dyn VenueOrderSink>) = if settings.dry_run {
        info!("Dry-run mode: orders are logged, not sent");
        (
            Arc::new(PaperOrderSink::new("paper-polymarket")),
            Arc::new(PaperOrderSink::new("paper-opinion")),
        )
    } else {
        for sink in [polymarket.as_ref() as &dyn VenueOrderSink, opinion.as_ref()] {
            if !sink.is_executable() {
                warn!(
                    venue = sink.name(),
                    "Live mode but venue cannot place orders; every trade will be refused"
                );
            }
        }
        (polymarket.clone(), opinion.clone())
    };

    // -- Bot -------------------------------------------------------------

    let aggregator = PriceAggregator::new(
        VenueFeed::new(
            Venue::A,
            polymarket,
            Quoting::TwoSided {
                up_token: settings.polymarket.up_token.clone(),
                down_token: settings.polymarket.down_token.clone(),
            },
        ),
        VenueFeed::new(
            Venue::B,
            opinion,
            Quoting::SingleSided {
                up_token: settings.opinion.up_token.clone(),
                down_route: settings.opinion.down_token.clone(),
            },
        ),
    );

    let mut bot = ArbitrageBot::new(
        settings.bot.clone(),
        aggregator,
        ArbitrageEvaluator::new(settings.arbitrage),
        ExecutionSequencer::new(sink_a, sink_b),
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C, stopping");
        }
    };
    let stats = bot.run(shutdown).await;

    print_stats_table(&stats, bot.history().len());
    info!("crossarb shut down cleanly.");

    Ok(())
}

/// Startup reachability checks. Failures are logged, not fatal.
async fn check_connectivity(polymarket: &PolymarketClient, opinion: &OpinionClient) {
    match polymarket.ping().await {
        Ok(()) => info!("Polymarket reachable"),
        Err(e) => warn!(error = %e, "Polymarket connectivity check failed"),
    }
    match opinion.check_api_key().await {
        Ok(true) => {}
        Ok(false) => warn!("Opinion API key not confirmed, prices may be unavailable"),
        Err(e) => warn!(error = %e, "Opinion connectivity check failed"),
    }
}

fn print_stats_table(stats: &RunStats, ledger_len: usize) {
    let uptime = stats.uptime();
    println!();
    println!("{}", "=".repeat(48));
    println!(" Run statistics");
    println!("{}", "=".repeat(48));
    println!("uptime:                {}s", uptime.num_seconds());
    println!("{stats}");
    println!("fill_rate:             {:.1}%", stats.fill_rate());
    println!("avg_expected_profit:   ${:.2}", Accountant::average_profit(stats));
    println!("ledger_entries:        {ledger_len}");
    println!("{}", "=".repeat(48));
}

/// Initialise the `tracing` subscriber.
fn init_logging(settings: &Settings) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("crossarb={}", settings.log_level)));

    let json_logging = std::env::var("CROSSARB_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
