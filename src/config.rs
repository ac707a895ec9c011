//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Token IDs and the Opinion API key are referenced by env-var name in the
//! config and resolved once at startup by `AppConfig::validate`, which turns
//! the raw file into immutable `Settings`.

use anyhow::{Context, Result};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::engine::BotConfig;
use crate::strategy::ArbitrageConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Largest accepted notional per trade, in dollars.
const MAX_POSITION_SIZE: Decimal = dec!(1000000);

// ---------------------------------------------------------------------------
// Raw file layout
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub bot: BotSection,
    #[serde(default)]
    pub arbitrage: ArbitrageSection,
    #[serde(default)]
    pub polymarket: PolymarketSection,
    #[serde(default)]
    pub opinion: OpinionSection,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BotSection {
    pub poll_interval_secs: f64,
    /// Paper-trade instead of sending orders to the venues.
    pub dry_run: bool,
    pub log_level: String,
    pub max_cycles: Option<u64>,
}

impl Default for BotSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: 1.0,
            dry_run: true,
            log_level: "info".to_string(),
            max_cycles: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArbitrageSection {
    pub max_cost: f64,
    pub min_margin: f64,
    /// Total notional per trade in USDC.
    pub position_size: f64,
}

impl Default for ArbitrageSection {
    fn default() -> Self {
        Self {
            max_cost: 1.0,
            min_margin: 0.01,
            position_size: 10.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PolymarketSection {
    pub base_url: Option<String>,
    pub up_token_env: String,
    pub down_token_env: String,
}

impl Default for PolymarketSection {
    fn default() -> Self {
        Self {
            base_url: None,
            up_token_env: "POLYMARKET_UP_TOKEN_ID".to_string(),
            down_token_env: "POLYMARKET_DOWN_TOKEN_ID".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OpinionSection {
    pub base_url: Option<String>,
    pub api_key_env: String,
    pub up_token_env: String,
    /// Only used to route "down" orders; prices come from the up token.
    pub down_token_env: Option<String>,
}

impl Default for OpinionSection {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: "OPINION_API_KEY".to_string(),
            up_token_env: "OPINION_UP_TOKEN_ID".to_string(),
            down_token_env: Some("OPINION_DOWN_TOKEN_ID".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Validated settings
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "configuration invalid:\n{}",
        .0.iter().map(|e| format!("  - {e}")).collect::<Vec<_>>().join("\n")
    )]
    Invalid(Vec<String>),
}

#[derive(Debug)]
pub struct PolymarketSettings {
    pub base_url: Option<String>,
    pub up_token: String,
    pub down_token: String,
}

#[derive(Debug)]
pub struct OpinionSettings {
    pub base_url: Option<String>,
    pub api_key: SecretString,
    pub up_token: String,
    pub down_token: Option<String>,
}

/// Everything the binary needs, checked once at startup.
#[derive(Debug)]
pub struct Settings {
    pub dry_run: bool,
    pub log_level: String,
    pub bot: BotConfig,
    pub arbitrage: ArbitrageConfig,
    pub polymarket: PolymarketSettings,
    pub opinion: OpinionSettings,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Validate against the process environment.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        self.validate_with(|name| Self::resolve_env(name).ok())
    }

    /// Validate using `lookup` to resolve env-var references. Every problem
    /// is collected before failing.
    pub fn validate_with<F>(&self, lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        let require = |env_name: &str, errors: &mut Vec<String>| -> String {
            match lookup(env_name).map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => v,
                _ => {
                    errors.push(format!("missing {env_name}"));
                    String::new()
                }
            }
        };

        let pm_up = require(&self.polymarket.up_token_env, &mut errors);
        let pm_down = require(&self.polymarket.down_token_env, &mut errors);
        let op_key = require(&self.opinion.api_key_env, &mut errors);
        let op_up = require(&self.opinion.up_token_env, &mut errors);
        let op_down = self
            .opinion
            .down_token_env
            .as_deref()
            .and_then(|name| lookup(name))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let bot = &self.bot;
        if !(bot.poll_interval_secs.is_finite() && bot.poll_interval_secs > 0.0) {
            errors.push(format!(
                "bot.poll_interval_secs must be positive (got {})",
                bot.poll_interval_secs
            ));
        }
        if bot.max_cycles == Some(0) {
            errors.push("bot.max_cycles must be positive when set".to_string());
        }
        if !LOG_LEVELS.contains(&bot.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "bot.log_level must be one of {} (got {:?})",
                LOG_LEVELS.join(", "),
                bot.log_level
            ));
        }

        let arb = &self.arbitrage;
        let max_cost = Decimal::from_f64(arb.max_cost).filter(|c| *c > Decimal::ZERO && *c <= dec!(2));
        if max_cost.is_none() {
            errors.push(format!("arbitrage.max_cost must be in (0, 2] (got {})", arb.max_cost));
        }
        let min_margin = Decimal::from_f64(arb.min_margin).filter(|m| *m >= Decimal::ZERO && *m < Decimal::ONE);
        if min_margin.is_none() {
            errors.push(format!("arbitrage.min_margin must be in [0, 1) (got {})", arb.min_margin));
        }
        let position_size = Decimal::from_f64(arb.position_size)
            .filter(|p| *p > Decimal::ZERO && *p <= MAX_POSITION_SIZE);
        if position_size.is_none() {
            errors.push(format!(
                "arbitrage.position_size must be in (0, {MAX_POSITION_SIZE}] (got {})",
                arb.position_size
            ));
        }

        let (Some(max_cost), Some(min_margin), Some(position_size), true) =
            (max_cost, min_margin, position_size, errors.is_empty())
        else {
            return Err(ConfigError::Invalid(errors));
        };

        Ok(Settings {
            dry_run: bot.dry_run,
            log_level: bot.log_level.to_lowercase(),
            bot: BotConfig {
                poll_interval: Duration::from_secs_f64(bot.poll_interval_secs),
                position_size,
                max_cycles: bot.max_cycles,
            },
            arbitrage: ArbitrageConfig { max_cost, min_margin },
            polymarket: PolymarketSettings {
                base_url: self.polymarket.base_url.clone(),
                up_token: pm_up,
                down_token: pm_down,
            },
            opinion: OpinionSettings {
                base_url: self.opinion.base_url.clone(),
                api_key: SecretString::new(op_key),
                up_token: op_up,
                down_token: op_down,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
