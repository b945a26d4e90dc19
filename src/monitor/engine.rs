//! Pressure-order monitor engine
//!
//! Watches configured Stacks addresses through the chain indexer and
//! fires at most one swap per newly observed confirmed transaction.
//! One self-rescheduling loop runs per engine; cycles never overlap
//! because the next timer is armed only after the current cycle's body
//! completes. Pacing widens automatically as the call rate approaches
//! the indexer quota.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{MonitorConfig, MonitorConfigPatch, TradeDirection};
use crate::error::Result;
use crate::monitor::events::Observers;
use crate::ratelimit::RateLimiter;
use crate::seen::SeenSet;
use crate::stacks::{StacksTransaction, TransactionSource};
use crate::trading::{TradeExecutor, XykSwapParams};

/// Transactions requested per address per cycle
const FETCH_PAGE_LIMIT: u32 = 5;

/// Detection history high-water mark and post-trim size
const HISTORY_CAP: usize = 200;
const HISTORY_TRIM: usize = 100;

/// Error history high-water mark and post-trim size
const ERROR_CAP: usize = 100;
const ERROR_TRIM: usize = 50;

/// Returned by `detected_transactions` when no limit is given
const DEFAULT_DETECTED_LIMIT: usize = 50;

/// Interval bounds and trigger for the adaptive controller
const MIN_INTERVAL_MS: u64 = 1_000;
const MAX_INTERVAL_MS: u64 = 60_000;
const BACKOFF_USAGE_RATIO: f64 = 0.8;
const BACKOFF_FACTOR: f64 = 1.5;

/// A transaction observed for the first time, plus the reaction outcome
#[derive(Debug, Clone, Serialize)]
pub struct DetectedTransaction {
    pub tx_id: String,
    pub address: String,
    pub timestamp: DateTime<Utc>,
    pub tx_type: String,
    pub amount: Option<String>,
    pub auto_trade_executed: bool,
    pub trade_result: Option<String>,
}

/// Point-in-time view of the engine, recomputed on demand
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub running: bool,
    pub monitored_addresses: Vec<String>,
    pub last_check_time: Option<DateTime<Utc>>,
    pub detected_transactions: usize,
    pub executed_trades: u64,
    pub current_api_call_rate: u32,
    pub errors: Vec<String>,
}

/// State mutated only from within the cycle and the public mutators
struct EngineState {
    config: MonitorConfig,
    limiter: RateLimiter,
    seen: SeenSet,
    history: VecDeque<DetectedTransaction>,
    errors: Vec<String>,
    executed_trades: u64,
    last_check_time: Option<DateTime<Utc>>,
}

struct EngineInner {
    source: Arc<dyn TransactionSource>,
    executor: Arc<dyn TradeExecutor>,
    state: RwLock<EngineState>,
    running: AtomicBool,
    shutdown: broadcast::Sender<()>,
    status_observers: Observers<MonitorStatus>,
    tx_observers: Observers<DetectedTransaction>,
}

/// Address monitor with automated pressure-order reaction
pub struct MonitorEngine {
    inner: Arc<EngineInner>,
}

impl MonitorEngine {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn TransactionSource>,
        executor: Arc<dyn TradeExecutor>,
    ) -> Self {
        let (shutdown, _) = broadcast::channel(1);

        Self {
            inner: Arc::new(EngineInner {
                source,
                executor,
                state: RwLock::new(EngineState {
                    config,
                    limiter: RateLimiter::new(),
                    seen: SeenSet::new(),
                    history: VecDeque::new(),
                    errors: Vec::new(),
                    executed_trades: 0,
                    last_check_time: None,
                }),
                running: AtomicBool::new(false),
                shutdown,
                status_observers: Observers::new(),
                tx_observers: Observers::new(),
            }),
        }
    }

    /// Begin monitoring: clears the error history, runs one cycle
    /// immediately and self-schedules from there
    pub async fn start(&self) {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            warn!("Pressure monitor is already running");
            return;
        }

        {
            let mut state = self.inner.state.write().await;
            state.errors.clear();
            info!(
                addresses = state.config.monitored_addresses.len(),
                interval_ms = state.config.check_interval_ms,
                auto_trade = state.config.enabled,
                "Starting pressure monitor"
            );
        }

        let inner = self.inner.clone();
        let mut shutdown_rx = self.inner.shutdown.subscribe();

        tokio::spawn(async move {
            loop {
                if !inner.running.load(Ordering::SeqCst) {
                    break;
                }

                inner.run_cycle().await;

                let delay = {
                    let state = inner.state.read().await;
                    Duration::from_millis(state.config.check_interval_ms)
                };

                // stop() may have landed while a fetch was in flight;
                // never arm the next timer on a stale flag
                if !inner.running.load(Ordering::SeqCst) {
                    break;
                }

                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = shutdown_rx.recv() => break,
                }
            }

            debug!("Monitor loop exited");
        });
    }

    /// Stop monitoring and cancel the pending cycle. Emits one final
    /// status notification; a second stop is a warn-level no-op.
    pub async fn stop(&self) {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            warn!("Pressure monitor is not running");
            return;
        }

        let _ = self.inner.shutdown.send(());
        info!("Pressure monitor stopped");

        let status = self.inner.snapshot().await;
        self.inner.status_observers.emit(&status);
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::SeqCst)
    }

    /// Merge a partial config update; the next cycle picks up the new
    /// values, no cycle is re-triggered
    pub async fn update_config(&self, patch: MonitorConfigPatch) {
        let mut state = self.inner.state.write().await;
        state.config.apply(patch);
        debug!(config = ?state.config, "Monitor config updated");
    }

    pub async fn config(&self) -> MonitorConfig {
        self.inner.state.read().await.config.clone()
    }

    /// Current status snapshot; safe to call while a cycle is in flight
    pub async fn status(&self) -> MonitorStatus {
        self.inner.snapshot().await
    }

    /// Detection history, most recent first
    pub async fn detected_transactions(&self, limit: Option<usize>) -> Vec<DetectedTransaction> {
        let limit = limit.unwrap_or(DEFAULT_DETECTED_LIMIT);
        let state = self.inner.state.read().await;
        state.history.iter().take(limit).cloned().collect()
    }

    /// Subscribe to per-cycle status notifications
    pub fn on_status_update<F>(&self, callback: F)
    where
        F: Fn(&MonitorStatus) + Send + Sync + 'static,
    {
        self.inner.status_observers.register(callback);
    }

    /// Subscribe to new-transaction notifications
    pub fn on_transaction_detected<F>(&self, callback: F)
    where
        F: Fn(&DetectedTransaction) + Send + Sync + 'static,
    {
        self.inner.tx_observers.register(callback);
    }
}

impl EngineInner {
    /// One polling cycle: quota check, per-address fetch and classify,
    /// status notification, adaptive pacing
    async fn run_cycle(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }

        let (max_calls, addresses) = {
            let state = self.state.read().await;
            (
                state.config.max_api_calls_per_minute,
                state.config.monitored_addresses.clone(),
            )
        };

        let allowed = {
            let mut state = self.state.write().await;
            state.limiter.check_allowed(max_calls)
        };

        if allowed {
            self.check_addresses(&addresses, max_calls).await;
        } else {
            debug!("Indexer quota exhausted, skipping fetches this cycle");
        }

        let status = self.snapshot().await;
        self.status_observers.emit(&status);

        self.adjust_interval().await;
    }

    /// Fetch each address in config order, one quota unit per request.
    /// Fetch failures are recorded and the loop moves on; a mid-cycle
    /// stop aborts the remaining addresses.
    async fn check_addresses(&self, addresses: &[String], max_calls: u32) {
        for address in addresses {
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            {
                let mut state = self.state.write().await;
                if !state.limiter.check_allowed(max_calls) {
                    debug!(%address, "Quota exhausted mid-cycle, remaining addresses skipped");
                    break;
                }
                state.limiter.record_call();
            }

            match self
                .source
                .address_transactions(address, FETCH_PAGE_LIMIT, 0)
                .await
            {
                Ok(page) => {
                    self.state.write().await.last_check_time = Some(Utc::now());

                    for tx in &page.results {
                        let fresh = {
                            let mut state = self.state.write().await;
                            state.seen.add(&tx.tx_id)
                        };
                        if !fresh {
                            continue;
                        }

                        // Only confirmed transactions trigger a reaction
                        if tx.is_success() {
                            self.handle_new_transaction(tx, address).await;
                        }
                    }
                }
                Err(e) => {
                    warn!(%address, error = %e, "Address check failed");
                    self.push_error(format!("Error checking {}: {}", address, e))
                        .await;
                }
            }
        }
    }

    /// Classify a fresh confirmed transaction, run the reaction if
    /// enabled, record it and notify subscribers
    async fn handle_new_transaction(&self, tx: &StacksTransaction, address: &str) {
        info!(tx_id = %tx.tx_id, %address, tx_type = %tx.tx_type, "New transaction detected");

        let mut detected = DetectedTransaction {
            tx_id: tx.tx_id.clone(),
            address: address.to_string(),
            timestamp: tx.timestamp(),
            tx_type: tx.tx_type.clone(),
            amount: tx.transfer_amount(),
            auto_trade_executed: false,
            trade_result: None,
        };

        let enabled = self.state.read().await.config.enabled;
        if enabled {
            match self.execute_auto_trade().await {
                Ok(result) => {
                    info!(%result, "Auto-trade executed");
                    detected.auto_trade_executed = true;
                    detected.trade_result = Some(result);
                    self.state.write().await.executed_trades += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Auto-trade failed");
                    detected.trade_result = Some(format!("Failed: {}", e));
                    self.push_error(format!("Trade execution failed: {}", e))
                        .await;
                }
            }
        }

        {
            let mut state = self.state.write().await;
            state.history.push_front(detected.clone());
            if state.history.len() > HISTORY_CAP {
                state.history.truncate(HISTORY_TRIM);
            }
        }

        self.tx_observers.emit(&detected);
    }

    /// Submit one swap with the currently configured routing
    async fn execute_auto_trade(&self) -> Result<String> {
        let (direction, params) = {
            let state = self.state.read().await;
            (
                state.config.trade_direction,
                XykSwapParams::from_config(&state.config),
            )
        };

        match direction {
            // "auto" keeps the observed routing: sell
            TradeDirection::Sell | TradeDirection::Auto => self.executor.sell(&params).await,
            TradeDirection::Buy => self.executor.buy(&params).await,
        }
    }

    /// Append a timestamped entry to the bounded error history
    async fn push_error(&self, message: String) {
        let mut state = self.state.write().await;
        state
            .errors
            .push(format!("{}: {}", Utc::now().to_rfc3339(), message));
        if state.errors.len() > ERROR_CAP {
            let excess = state.errors.len() - ERROR_TRIM;
            state.errors.drain(..excess);
        }
    }

    /// Widen the check interval when call rate approaches the quota.
    /// Backpressure only; nothing ever shortens the interval again.
    async fn adjust_interval(&self) {
        let mut state = self.state.write().await;
        let max = state.config.max_api_calls_per_minute;
        if max == 0 {
            return;
        }

        let usage = state.limiter.current_rate() as f64 / max as f64;
        if usage > BACKOFF_USAGE_RATIO {
            let widened = (state.config.check_interval_ms as f64 * BACKOFF_FACTOR) as u64;
            let next = widened.clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS);
            if next != state.config.check_interval_ms {
                info!(
                    from_ms = state.config.check_interval_ms,
                    to_ms = next,
                    "Approaching indexer quota, widening check interval"
                );
                state.config.check_interval_ms = next;
            }
        }
    }

    async fn snapshot(&self) -> MonitorStatus {
        let state = self.state.read().await;
        MonitorStatus {
            running: self.running.load(Ordering::SeqCst),
            monitored_addresses: state.config.monitored_addresses.clone(),
            last_check_time: state.last_check_time,
            detected_transactions: state.history.len(),
            executed_trades: state.executed_trades,
            current_api_call_rate: state.limiter.current_rate(),
            errors: state.errors.clone(),
        }
    }
}
