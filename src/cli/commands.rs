//! CLI command implementations

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::monitor::MonitorRegistry;
use crate::stacks::HiroClient;
use crate::trading::{AlexGateway, DryRunTrader, TradeExecutor};

/// Run the pressure monitor until interrupted
pub async fn start(config: &Config, dry_run: bool) -> Result<()> {
    if dry_run {
        warn!("Running in DRY-RUN mode - no real trades will be executed");
    }

    info!("Starting pressure bot...");
    info!(
        "Pair: {}, amount: {} STX, direction: {}",
        config.monitor.trade_pair, config.monitor.trade_amount, config.monitor.trade_direction
    );

    let source = Arc::new(HiroClient::new(&config.indexer));
    let executor: Arc<dyn TradeExecutor> = if dry_run {
        Arc::new(DryRunTrader)
    } else {
        Arc::new(AlexGateway::new(&config.dex))
    };

    let registry = MonitorRegistry::new(source, executor);
    let engine = registry.get_or_create(Some(config.monitor.clone())).await?;

    engine.on_transaction_detected(|tx| {
        info!(
            tx_id = %tx.tx_id,
            address = %tx.address,
            traded = tx.auto_trade_executed,
            result = tx.trade_result.as_deref().unwrap_or("-"),
            "Detection"
        );
    });

    engine.on_status_update(|status| {
        info!(
            detections = status.detected_transactions,
            trades = status.executed_trades,
            call_rate = status.current_api_call_rate,
            errors = status.errors.len(),
            "Status"
        );
    });

    engine.start().await;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    registry.reset().await;

    Ok(())
}

/// Show the resolved configuration
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.display());
    Ok(())
}

/// List an address's pending (mempool) transactions
pub async fn pending(config: &Config, address: &str) -> Result<()> {
    let client = HiroClient::new(&config.indexer);
    let page = client.mempool_transactions(address).await?;

    if page.results.is_empty() {
        println!("No pending transactions for {}", address);
        return Ok(());
    }

    println!("{} pending transaction(s) for {}:", page.total, address);
    for tx in &page.results {
        println!(
            "  {}  {}  {}",
            tx.tx_id,
            tx.tx_type,
            tx.transfer_amount().unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}
