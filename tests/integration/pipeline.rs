//! End-to-end runs of the bot against in-memory venues.
//!
//! Venue A quotes both outcome tokens, venue B quotes only "up", exactly as
//! the live adapters do.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

use crossarb::config::AppConfig;
use crossarb::engine::{
    ArbitrageBot, BotConfig, CycleOutcome, ExecutionFailure, ExecutionSequencer, PriceAggregator,
    Quoting, VenueFeed,
};
use crossarb::platforms::paper::PaperOrderSink;
use crossarb::platforms::VenueOrderSink;
use crossarb::strategy::{ArbitrageConfig, ArbitrageEvaluator};
use crossarb::types::{Outcome, Strategy, Venue};

use crate::mock_venue::{journal, Journal, MockVenue};

const A_UP: &str = "pm-up";
const A_DOWN: &str = "pm-down";
const B_UP: &str = "op-up";
const B_DOWN: &str = "op-down";

struct Harness {
    venue_a: Arc<MockVenue>,
    venue_b: Arc<MockVenue>,
    journal: Journal,
    bot: ArbitrageBot,
}

fn aggregator(venue_a: &Arc<MockVenue>, venue_b: &Arc<MockVenue>) -> PriceAggregator {
    PriceAggregator::new(
        VenueFeed::new(
            Venue::A,
            venue_a.clone(),
            Quoting::TwoSided { up_token: A_UP.into(), down_token: A_DOWN.into() },
        ),
        VenueFeed::new(
            Venue::B,
            venue_b.clone(),
            Quoting::SingleSided { up_token: B_UP.into(), down_route: Some(B_DOWN.into()) },
        ),
    )
}

fn bot_config(max_cycles: u64) -> BotConfig {
    BotConfig {
        poll_interval: Duration::from_millis(1),
        position_size: dec!(10),
        max_cycles: Some(max_cycles),
    }
}

fn harness_with(venue_b_rejects: bool, max_cycles: u64) -> Harness {
    let journal = journal();
    let venue_a = Arc::new(MockVenue::new("polymarket", journal.clone()));
    let venue_b = Arc::new(if venue_b_rejects {
        MockVenue::rejecting("opinion", journal.clone())
    } else {
        MockVenue::new("opinion", journal.clone())
    });

    let bot = ArbitrageBot::new(
        bot_config(max_cycles),
        aggregator(&venue_a, &venue_b),
        ArbitrageEvaluator::new(ArbitrageConfig::default()),
        ExecutionSequencer::new(venue_a.clone(), venue_b.clone()),
    );

    Harness { venue_a, venue_b, journal, bot }
}

fn harness(max_cycles: u64) -> Harness {
    harness_with(false, max_cycles)
}

fn quote(h: &Harness, a_up: Decimal, a_down: Decimal, b_up: Decimal) {
    h.venue_a.set_price(A_UP, Some(a_up));
    h.venue_a.set_price(A_DOWN, Some(a_down));
    h.venue_b.set_price(B_UP, Some(b_up));
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_up_on_a_down_on_b_executes() {
    let mut h = harness(1);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));

    let record = match h.bot.run_cycle().await {
        CycleOutcome::Executed(record) => record,
        other => panic!("expected a trade, got {other:?}"),
    };

    assert_eq!(record.strategy, Strategy::UpADownB);
    assert_eq!(record.leg_a.price + record.leg_b.price, dec!(0.85));
    assert_eq!(record.leg_b.price, dec!(0.45));
    assert_eq!(record.expected_profit, dec!(1.5));
    assert_eq!(record.amount_a + record.amount_b, dec!(10));
    assert_eq!(record.amount_a.round_dp(2), dec!(4.71));
    assert_eq!(record.amount_b.round_dp(2), dec!(5.29));

    let journal = h.journal.lock().unwrap().clone();
    assert_eq!(journal.len(), 2);
    let (first_venue, first) = &journal[0];
    let (second_venue, second) = &journal[1];
    assert_eq!(*first_venue, "polymarket");
    assert_eq!(first.side, Outcome::Up);
    assert_eq!(first.routing_token.as_deref(), Some(A_UP));
    assert_eq!(*second_venue, "opinion");
    assert_eq!(second.side, Outcome::Down);
    assert_eq!(second.routing_token.as_deref(), Some(B_DOWN));

    assert_eq!(h.bot.history(), &[record]);
}

#[tokio::test]
async fn test_down_on_a_up_on_b_executes() {
    let mut h = harness(1);
    quote(&h, dec!(0.52), dec!(0.48), dec!(0.50));

    let stats = h.bot.run(std::future::pending()).await;
    assert_eq!(stats.trades_executed, 1);
    assert_eq!(stats.total_expected_profit, dec!(0.2));

    let trade = &h.bot.history()[0];
    assert_eq!(trade.strategy, Strategy::DownAUpB);
    assert_eq!(trade.leg_a.side, Outcome::Down);
    assert_eq!(trade.leg_b.side, Outcome::Up);
    assert_eq!(h.venue_b.orders()[0].routing_token.as_deref(), Some(B_UP));
}

#[tokio::test]
async fn test_no_opportunity_places_nothing() {
    let mut h = harness(3);
    quote(&h, dec!(0.55), dec!(0.55), dec!(0.50));

    let stats = h.bot.run(std::future::pending()).await;
    assert_eq!(stats.checks, 3);
    assert_eq!(stats.opportunities_found, 0);
    assert_eq!(stats.trades_executed, 0);
    assert!(h.journal.lock().unwrap().is_empty());
    assert!(h.bot.history().is_empty());
}

#[tokio::test]
async fn test_leg_b_failure_leaves_ledger_untouched() {
    let mut h = harness_with(true, 1);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));

    let stats = h.bot.run(std::future::pending()).await;
    assert_eq!(stats.checks, 1);
    assert_eq!(stats.opportunities_found, 1);
    assert_eq!(stats.trades_executed, 0);
    assert_eq!(stats.execution_failures, 1);
    assert_eq!(stats.partial_hedges, 1);
    assert_eq!(stats.total_expected_profit, Decimal::ZERO);
    assert!(h.bot.history().is_empty());

    // Leg A went through before leg B was refused
    assert_eq!(h.venue_a.orders().len(), 1);
    assert_eq!(h.venue_b.orders().len(), 1);
}

#[tokio::test]
async fn test_leg_b_failure_reason_is_distinct() {
    let mut h = harness_with(true, 1);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));

    match h.bot.run_cycle().await {
        CycleOutcome::Failed(ExecutionFailure::LegBFailedAfterLegA { filled, rejected, .. }) => {
            assert_eq!(filled.venue, Venue::A);
            assert_eq!(rejected.venue, Venue::B);
        }
        other => panic!("expected a partial hedge, got {other:?}"),
    }
}

#[tokio::test]
async fn test_leg_a_rejection_never_reaches_venue_b() {
    let mut h = harness(2);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));
    h.venue_a.script_confirmations(vec![false]);

    let stats = h.bot.run(std::future::pending()).await;

    // First cycle: leg A refused. Second cycle: both legs fill.
    assert_eq!(stats.opportunities_found, 2);
    assert_eq!(stats.execution_failures, 1);
    assert_eq!(stats.partial_hedges, 0);
    assert_eq!(stats.trades_executed, 1);
    assert_eq!(h.venue_a.orders().len(), 2);
    assert_eq!(h.venue_b.orders().len(), 1);
}

// ---------------------------------------------------------------------------
// Data availability and fault containment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_quote_skips_cycle_until_it_returns() {
    let mut h = harness(3);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));
    h.venue_b.script_prices(B_UP, vec![None, None, Some(dec!(0.55))]);

    let stats = h.bot.run(std::future::pending()).await;
    assert_eq!(stats.checks, 3);
    assert_eq!(stats.opportunities_found, 1);
    assert_eq!(stats.trades_executed, 1);
}

#[tokio::test]
async fn test_missing_down_price_on_two_sided_venue() {
    let mut h = harness(1);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));
    h.venue_a.set_price(A_DOWN, None);

    assert_eq!(h.bot.run_cycle().await, CycleOutcome::NoPrices);
    assert!(h.journal.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_panicking_cycle_is_contained() {
    let mut h = harness(3);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));
    h.venue_a.panic_on_next_fetch();

    let stats = h.bot.run(std::future::pending()).await;
    assert_eq!(stats.checks, 3);
    assert_eq!(stats.faulted_cycles, 1);
    assert_eq!(stats.trades_executed, 2);
    assert_eq!(h.bot.history().len(), 2);
}

#[tokio::test]
async fn test_leg_b_panic_counts_as_partial_hedge() {
    let mut h = harness(2);
    quote(&h, dec!(0.40), dec!(0.60), dec!(0.55));
    h.venue_b.panic_on_next_order();

    let stats = h.bot.run(std::future::pending()).await;

    // First cycle: leg A filled, leg B crashed. Second cycle: both legs fill.
    assert_eq!(stats.checks, 2);
    assert_eq!(stats.faulted_cycles, 0);
    assert_eq!(stats.opportunities_found, 2);
    assert_eq!(stats.execution_failures, 1);
    assert_eq!(stats.partial_hedges, 1);
    assert_eq!(stats.trades_executed, 1);
    assert_eq!(h.venue_a.orders().len(), 2);
    assert_eq!(h.bot.history().len(), 1);
}

#[tokio::test]
async fn test_shutdown_stops_loop_between_cycles() {
    let mut h = harness(1_000_000);
    quote(&h, dec!(0.55), dec!(0.55), dec!(0.50));

    let shutdown = tokio::time::sleep(Duration::from_millis(30));
    let stats = h.bot.run(shutdown).await;

    assert!(stats.checks > 0);
    assert!(stats.checks < 1_000_000);
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dry_run_with_paper_sinks() {
    let journal = journal();
    let prices_a = Arc::new(MockVenue::new("polymarket", journal.clone()));
    let prices_b = Arc::new(MockVenue::new("opinion", journal.clone()));
    prices_a.set_price(A_UP, Some(dec!(0.40)));
    prices_a.set_price(A_DOWN, Some(dec!(0.60)));
    prices_b.set_price(B_UP, Some(dec!(0.55)));

    let paper_a = Arc::new(PaperOrderSink::new("paper-a"));
    let paper_b = Arc::new(PaperOrderSink::new("paper-b"));
    assert!(!paper_a.is_executable());

    let mut bot = ArbitrageBot::new(
        bot_config(2),
        aggregator(&prices_a, &prices_b),
        ArbitrageEvaluator::new(ArbitrageConfig::default()),
        ExecutionSequencer::new(paper_a.clone(), paper_b.clone()),
    );

    let stats = bot.run(std::future::pending()).await;
    assert_eq!(stats.trades_executed, 2);
    assert_eq!(paper_a.placed(), 2);
    assert_eq!(paper_b.placed(), 2);
    // Nothing reached the scripted venues
    assert!(journal.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_validated_config_drives_bot() {
    let raw: AppConfig = toml::from_str(
        r#"
        [bot]
        poll_interval_secs = 0.001
        max_cycles = 2

        [arbitrage]
        max_cost = 0.9
        min_margin = 0.05
        position_size = 100.0
        "#,
    )
    .unwrap();

    let env = |name: &str| match name {
        "POLYMARKET_UP_TOKEN_ID" => Some(A_UP.to_string()),
        "POLYMARKET_DOWN_TOKEN_ID" => Some(A_DOWN.to_string()),
        "OPINION_API_KEY" => Some("key".to_string()),
        "OPINION_UP_TOKEN_ID" => Some(B_UP.to_string()),
        "OPINION_DOWN_TOKEN_ID" => Some("op-down-configured".to_string()),
        _ => None,
    };
    let settings = raw.validate_with(env).unwrap();
    assert_eq!(settings.bot.max_cycles, Some(2));
    assert_eq!(settings.arbitrage.max_cost, dec!(0.9));

    let journal = journal();
    let venue_a = Arc::new(MockVenue::new("polymarket", journal.clone()));
    let venue_b = Arc::new(MockVenue::new("opinion", journal.clone()));
    // S1 = 0.40 + 0.45 = 0.85: under 0.9 with 15% margin
    venue_a.script_prices(&settings.polymarket.up_token, vec![Some(dec!(0.40)), Some(dec!(0.46))]);
    venue_a.set_price(&settings.polymarket.down_token, Some(dec!(0.90)));
    venue_b.set_price(&settings.opinion.up_token, Some(dec!(0.55)));

    let aggregator = PriceAggregator::new(
        VenueFeed::new(
            Venue::A,
            venue_a.clone(),
            Quoting::TwoSided {
                up_token: settings.polymarket.up_token.clone(),
                down_token: settings.polymarket.down_token.clone(),
            },
        ),
        VenueFeed::new(
            Venue::B,
            venue_b.clone(),
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
        ExecutionSequencer::new(venue_a.clone(), venue_b.clone()),
    );

    let stats = bot.run(std::future::pending()).await;
    // Second cycle: S1 = 0.46 + 0.45 = 0.91 breaches max_cost
    assert_eq!(stats.checks, 2);
    assert_eq!(stats.trades_executed, 1);
    assert_eq!(stats.total_expected_profit, dec!(15));
    assert_eq!(
        venue_b.orders()[0].routing_token.as_deref(),
        Some("op-down-configured")
    );
}
