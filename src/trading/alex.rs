//! ALEX DEX gateway client
//!
//! Talks to the trading backend's xyk auto-swap endpoints. The gateway
//! signs and broadcasts the actual contract call; this client only
//! submits the intent and relays the outcome.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::DexConfig;
use crate::error::{Error, Result};
use crate::trading::executor::{TradeExecutor, XykSwapParams};

const AUTO_SELL_PATH: &str = "/dex/xykautosell";
const AUTO_BUY_PATH: &str = "/dex/xykautobuy";

/// Response from the swap endpoints
#[derive(Debug, Clone, Deserialize)]
struct SwapResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    txid: Option<String>,
}

/// HTTP client for the ALEX swap gateway
pub struct AlexGateway {
    client: reqwest::Client,
    api_base: String,
}

impl AlexGateway {
    pub fn new(config: &DexConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .unwrap_or_default(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn submit(&self, path: &str, side: &str, params: &XykSwapParams) -> Result<String> {
        info!(amount = params.amount, side, "submitting swap");

        let response = self
            .client
            .post(format!("{}{}", self.api_base, path))
            .json(params)
            .send()
            .await
            .map_err(|e| Error::TradeExecution(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::TradeExecution(format!(
                "swap endpoint returned HTTP {}",
                response.status()
            )));
        }

        let swap: SwapResponse = response
            .json()
            .await
            .map_err(|e| Error::TradeExecution(format!("Failed to parse response: {}", e)))?;

        if swap.success == Some(false) {
            let reason = swap
                .message
                .unwrap_or_else(|| "swap rejected by gateway".to_string());
            warn!(side, %reason, "swap rejected");
            return Err(Error::TradeRejected(reason));
        }

        let receipt = match swap.txid {
            Some(txid) => format!("Trade {} executed for {} STX ({})", side, params.amount, txid),
            None => format!("Trade {} executed for {} STX", side, params.amount),
        };
        Ok(receipt)
    }
}

#[async_trait]
impl TradeExecutor for AlexGateway {
    async fn buy(&self, params: &XykSwapParams) -> Result<String> {
        self.submit(AUTO_BUY_PATH, "buy", params).await
    }

    async fn sell(&self, params: &XykSwapParams) -> Result<String> {
        self.submit(AUTO_SELL_PATH, "sell", params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swap_response_variants_deserialize() {
        let ok: SwapResponse =
            serde_json::from_str(r#"{"success": true, "txid": "0xfeed"}"#).unwrap();
        assert_eq!(ok.success, Some(true));
        assert_eq!(ok.txid.as_deref(), Some("0xfeed"));

        let rejected: SwapResponse =
            serde_json::from_str(r#"{"success": false, "message": "insufficient funds"}"#).unwrap();
        assert_eq!(rejected.success, Some(false));
        assert_eq!(rejected.message.as_deref(), Some("insufficient funds"));

        // Minimal gateways answer with an empty object
        let bare: SwapResponse = serde_json::from_str("{}").unwrap();
        assert!(bare.success.is_none());
        assert!(bare.txid.is_none());
    }
}
