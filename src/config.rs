//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub dex: DexConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Chain indexer (Hiro extended API) connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    #[serde(default = "default_indexer_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            api_base: default_indexer_base(),
            timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// DEX gateway (ALEX xyk swap endpoints) connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DexConfig {
    #[serde(default = "default_dex_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DexConfig {
    fn default() -> Self {
        Self {
            api_base: default_dex_base(),
            timeout_ms: default_request_timeout_ms(),
        }
    }
}

/// Trading pair for the automated reaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradePair {
    #[serde(rename = "STX/AEUSDC")]
    StxAeusdc,
    #[serde(rename = "STX/BTC")]
    StxBtc,
    #[serde(rename = "STX/USDT")]
    StxUsdt,
}

impl Default for TradePair {
    fn default() -> Self {
        Self::StxAeusdc
    }
}

impl fmt::Display for TradePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradePair::StxAeusdc => "STX/AEUSDC",
            TradePair::StxBtc => "STX/BTC",
            TradePair::StxUsdt => "STX/USDT",
        };
        f.write_str(s)
    }
}

/// Direction of the automated reaction trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Buy,
    Sell,
    /// Routed to sell until a direction-inference policy exists
    Auto,
}

impl Default for TradeDirection {
    fn default() -> Self {
        Self::Sell
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
            TradeDirection::Auto => "auto",
        };
        f.write_str(s)
    }
}

/// Address monitor configuration, mutable at runtime through
/// `MonitorEngine::update_config`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Master switch for the automated reaction; detection still runs when
    /// false, no trade is submitted
    #[serde(default)]
    pub enabled: bool,

    /// Watched Stacks addresses, checked in insertion order
    #[serde(default)]
    pub monitored_addresses: Vec<String>,

    #[serde(default)]
    pub trade_pair: TradePair,

    /// STX amount per reaction trade
    #[serde(default = "default_trade_amount")]
    pub trade_amount: f64,

    #[serde(default)]
    pub trade_direction: TradeDirection,

    /// Indexer quota ceiling per rolling minute
    #[serde(default = "default_max_api_calls")]
    pub max_api_calls_per_minute: u32,

    /// Delay between polling cycles; widened automatically when the call
    /// rate approaches the quota
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,

    /// Source asset principal for the swap route
    #[serde(default)]
    pub dx: Option<String>,

    /// Destination asset principal for the swap route
    #[serde(default)]
    pub dy: Option<String>,

    /// Pool fee rate, passed through verbatim
    #[serde(default)]
    pub fee: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            monitored_addresses: Vec::new(),
            trade_pair: TradePair::default(),
            trade_amount: default_trade_amount(),
            trade_direction: TradeDirection::default(),
            max_api_calls_per_minute: default_max_api_calls(),
            check_interval_ms: default_check_interval_ms(),
            dx: None,
            dy: None,
            fee: None,
        }
    }
}

impl MonitorConfig {
    /// Merge a partial update into this config
    pub fn apply(&mut self, patch: MonitorConfigPatch) {
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
        if let Some(addresses) = patch.monitored_addresses {
            self.monitored_addresses = addresses;
        }
        if let Some(pair) = patch.trade_pair {
            self.trade_pair = pair;
        }
        if let Some(amount) = patch.trade_amount {
            self.trade_amount = amount;
        }
        if let Some(direction) = patch.trade_direction {
            self.trade_direction = direction;
        }
        if let Some(max) = patch.max_api_calls_per_minute {
            self.max_api_calls_per_minute = max;
        }
        if let Some(interval) = patch.check_interval_ms {
            self.check_interval_ms = interval;
        }
        if let Some(dx) = patch.dx {
            self.dx = Some(dx);
        }
        if let Some(dy) = patch.dy {
            self.dy = Some(dy);
        }
        if let Some(fee) = patch.fee {
            self.fee = Some(fee);
        }
    }
}

/// Partial monitor config for runtime updates; unset fields keep their
/// current values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonitorConfigPatch {
    pub enabled: Option<bool>,
    pub monitored_addresses: Option<Vec<String>>,
    pub trade_pair: Option<TradePair>,
    pub trade_amount: Option<f64>,
    pub trade_direction: Option<TradeDirection>,
    pub max_api_calls_per_minute: Option<u32>,
    pub check_interval_ms: Option<u64>,
    pub dx: Option<String>,
    pub dy: Option<String>,
    pub fee: Option<String>,
}

impl From<MonitorConfig> for MonitorConfigPatch {
    fn from(config: MonitorConfig) -> Self {
        Self {
            enabled: Some(config.enabled),
            monitored_addresses: Some(config.monitored_addresses),
            trade_pair: Some(config.trade_pair),
            trade_amount: Some(config.trade_amount),
            trade_direction: Some(config.trade_direction),
            max_api_calls_per_minute: Some(config.max_api_calls_per_minute),
            check_interval_ms: Some(config.check_interval_ms),
            dx: config.dx,
            dy: config.dy,
            fee: config.fee,
        }
    }
}

fn default_indexer_base() -> String {
    "https://api.mainnet.hiro.so".to_string()
}

fn default_dex_base() -> String {
    "http://127.0.0.1:10000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_trade_amount() -> f64 {
    100.0
}

fn default_max_api_calls() -> u32 {
    30
}

fn default_check_interval_ms() -> u64 {
    5_000
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix PRESSURE_)
            .add_source(
                config::Environment::with_prefix("PRESSURE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.indexer.api_base.is_empty() {
            anyhow::bail!("indexer.api_base must not be empty");
        }

        if self.dex.api_base.is_empty() {
            anyhow::bail!("dex.api_base must not be empty");
        }

        if self.monitor.trade_amount <= 0.0 {
            anyhow::bail!("monitor.trade_amount must be positive");
        }

        if self.monitor.max_api_calls_per_minute == 0 {
            anyhow::bail!("monitor.max_api_calls_per_minute must be positive");
        }

        if self.monitor.check_interval_ms == 0 {
            anyhow::bail!("monitor.check_interval_ms must be positive");
        }

        if self.monitor.enabled && self.monitor.monitored_addresses.is_empty() {
            tracing::warn!(
                "Auto-trading is enabled but no addresses are monitored - nothing will trigger"
            );
        }

        Ok(())
    }

    /// Get configuration summary for display
    pub fn display(&self) -> String {
        format!(
            r#"Configuration:
  Indexer:
    api_base: {}
    timeout: {}ms
  Dex:
    api_base: {}
    timeout: {}ms
  Monitor:
    enabled: {}
    addresses: {:?}
    pair: {}
    amount: {} STX
    direction: {}
    max_api_calls_per_minute: {}
    check_interval: {}ms"#,
            self.indexer.api_base,
            self.indexer.timeout_ms,
            self.dex.api_base,
            self.dex.timeout_ms,
            self.monitor.enabled,
            self.monitor.monitored_addresses,
            self.monitor.trade_pair,
            self.monitor.trade_amount,
            self.monitor.trade_direction,
            self.monitor.max_api_calls_per_minute,
            self.monitor.check_interval_ms,
        )
    }
}
