//! Stacks chain indexer client (Hiro extended API)
//!
//! The monitor reads confirmed address activity through the public Hiro
//! API. Responses are paged; the engine only ever asks for a small head
//! page per address, so quota accounting stays predictable.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::IndexerConfig;
use crate::error::{Error, Result};

/// Transaction status value the indexer reports for confirmed success
pub const TX_STATUS_SUCCESS: &str = "success";

/// Token transfer payload attached to `token_transfer` transactions
#[derive(Debug, Clone, Deserialize)]
pub struct TokenTransfer {
    #[serde(default)]
    pub recipient_address: String,
    pub amount: String,
    #[serde(default)]
    pub memo: String,
}

/// One transaction as reported by the extended API
#[derive(Debug, Clone, Deserialize)]
pub struct StacksTransaction {
    pub tx_id: String,
    pub tx_type: String,
    pub tx_status: String,
    #[serde(default)]
    pub block_height: u64,
    /// Anchor block burn time, seconds since epoch; 0 for mempool entries
    #[serde(default)]
    pub burn_block_time: i64,
    #[serde(default)]
    pub sender_address: String,
    #[serde(default)]
    pub fee_rate: String,
    pub token_transfer: Option<TokenTransfer>,
}

impl StacksTransaction {
    /// Whether the transaction is anchored and succeeded
    pub fn is_success(&self) -> bool {
        self.tx_status == TX_STATUS_SUCCESS
    }

    /// Burn block time as a UTC timestamp; falls back to "now" for
    /// entries the indexer has not anchored yet
    pub fn timestamp(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.burn_block_time, 0)
            .single()
            .filter(|_| self.burn_block_time > 0)
            .unwrap_or_else(Utc::now)
    }

    /// Transfer amount in micro-STX, when the transaction carries one
    pub fn transfer_amount(&self) -> Option<String> {
        self.token_transfer.as_ref().map(|t| t.amount.clone())
    }
}

/// One page of address transactions
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub total: u64,
    pub results: Vec<StacksTransaction>,
}

/// Source of recent transactions for a monitored address
///
/// The engine consumes this seam; production wires in [`HiroClient`],
/// tests substitute scripted fixtures.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn address_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage>;
}

/// HTTP client for the Hiro extended API
pub struct HiroClient {
    client: reqwest::Client,
    api_base: String,
}

impl HiroClient {
    pub fn new(config: &IndexerConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .unwrap_or_default(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the address's pending (mempool) transactions
    ///
    /// Not part of the monitoring cycle; surfaced through the CLI for
    /// ad-hoc pending-order checks.
    pub async fn mempool_transactions(&self, address: &str) -> Result<TransactionPage> {
        let url = format!("{}/extended/v1/tx/mempool", self.api_base);
        debug!(%address, "fetching mempool transactions");

        let resp = self
            .client
            .get(&url)
            .query(&[("sender_address", address)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::SourceFetch(format!(
                "mempool lookup returned HTTP {}",
                resp.status()
            )));
        }

        let page: TransactionPage = resp.json().await?;
        Ok(page)
    }
}

#[async_trait]
impl TransactionSource for HiroClient {
    async fn address_transactions(
        &self,
        address: &str,
        limit: u32,
        offset: u32,
    ) -> Result<TransactionPage> {
        let url = format!(
            "{}/extended/v1/address/{}/transactions",
            self.api_base, address
        );
        debug!(%address, limit, offset, "fetching address transactions");

        let resp = self
            .client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Error::SourceFetch(format!(
                "address lookup returned HTTP {}",
                resp.status()
            )));
        }

        let page: TransactionPage = resp.json().await?;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"{
        "limit": 5,
        "offset": 0,
        "total": 128,
        "results": [
            {
                "tx_id": "0xabc123",
                "tx_type": "token_transfer",
                "tx_status": "success",
                "block_height": 150000,
                "burn_block_time": 1700000000,
                "sender_address": "SP000000000000000000002Q6VF78",
                "fee_rate": "180",
                "token_transfer": {
                    "recipient_address": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
                    "amount": "42000000",
                    "memo": "0x"
                }
            },
            {
                "tx_id": "0xdef456",
                "tx_type": "contract_call",
                "tx_status": "abort_by_response",
                "block_height": 149999,
                "burn_block_time": 1699999000,
                "sender_address": "SP000000000000000000002Q6VF78",
                "fee_rate": "250",
                "token_transfer": null
            }
        ]
    }"#;

    #[test]
    fn test_page_deserializes() {
        let page: TransactionPage = serde_json::from_str(SAMPLE_PAGE).unwrap();

        assert_eq!(page.total, 128);
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].tx_id, "0xabc123");
        assert_eq!(
            page.results[0].transfer_amount().as_deref(),
            Some("42000000")
        );
        assert!(page.results[1].token_transfer.is_none());
    }

    #[test]
    fn test_success_classification() {
        let page: TransactionPage = serde_json::from_str(SAMPLE_PAGE).unwrap();

        assert!(page.results[0].is_success());
        assert!(!page.results[1].is_success());
    }

    #[test]
    fn test_timestamp_from_burn_block_time() {
        let page: TransactionPage = serde_json::from_str(SAMPLE_PAGE).unwrap();

        assert_eq!(page.results[0].timestamp().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unanchored_timestamp_falls_back() {
        let tx: StacksTransaction = serde_json::from_str(
            r#"{"tx_id": "0x1", "tx_type": "token_transfer", "tx_status": "pending"}"#,
        )
        .unwrap();

        // Zero burn time means the fallback is used, not 1970
        assert!(tx.timestamp().timestamp() > 1_700_000_000);
    }
}
