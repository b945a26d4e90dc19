//! Trade executor seam and swap intent types
//!
//! The engine reacts to a detection by submitting one xyk swap through
//! whatever executor is wired in. Params mirror the gateway's body
//! verbatim; defaults route the STX/AEUSDC pool.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::{MonitorConfig, TradeDirection};
use crate::error::Result;

/// Default source asset for the swap route (wrapped STX)
pub const DEFAULT_DX: &str = "SM1793C4R5PZ4NS4VQ4WMP7SKKYVH8JZEWSZ9HCCR.token-stx-v-1-2";

/// Default destination asset for the swap route (aeUSDC)
pub const DEFAULT_DY: &str = "SP3Y2ZSH8P7D50B0VBTSX11S7XSG24M1VB9YFQA4K.token-aeusdc";

/// Default pool fee rate
pub const DEFAULT_FEE: &str = "0.124251";

/// Request body for the xyk auto-swap endpoints
#[derive(Debug, Clone, Serialize)]
pub struct XykSwapParams {
    pub amount: f64,
    pub dx: String,
    pub dy: String,
    /// "s" for sell routing, "b" for buy
    pub su: String,
    pub fee: String,
}

impl XykSwapParams {
    /// Build swap params from the monitor config, falling back to the
    /// STX/AEUSDC defaults for unset routing fields
    pub fn from_config(config: &MonitorConfig) -> Self {
        let su = match config.trade_direction {
            TradeDirection::Sell | TradeDirection::Auto => "s",
            TradeDirection::Buy => "b",
        };

        Self {
            amount: config.trade_amount,
            dx: config.dx.clone().unwrap_or_else(|| DEFAULT_DX.to_string()),
            dy: config.dy.clone().unwrap_or_else(|| DEFAULT_DY.to_string()),
            su: su.to_string(),
            fee: config.fee.clone().unwrap_or_else(|| DEFAULT_FEE.to_string()),
        }
    }
}

/// Order submission seam for the automated reaction
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Submit a buy order; returns a human-readable result
    async fn buy(&self, params: &XykSwapParams) -> Result<String>;

    /// Submit a sell order; returns a human-readable result
    async fn sell(&self, params: &XykSwapParams) -> Result<String>;
}

/// Executor that logs the intent and submits nothing
///
/// Used by the CLI's `--dry-run` mode so the full detection path can be
/// exercised against live chain data without spending funds.
pub struct DryRunTrader;

#[async_trait]
impl TradeExecutor for DryRunTrader {
    async fn buy(&self, params: &XykSwapParams) -> Result<String> {
        info!(amount = params.amount, "[dry-run] buy skipped");
        Ok(format!("Trade buy simulated for {} STX", params.amount))
    }

    async fn sell(&self, params: &XykSwapParams) -> Result<String> {
        info!(amount = params.amount, "[dry-run] sell skipped");
        Ok(format!("Trade sell simulated for {} STX", params.amount))
    }
}
