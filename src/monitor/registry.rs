//! Process-wide monitor lifecycle
//!
//! One live engine per registry. Consumers fetch the shared handle from
//! here instead of constructing engines, which keeps the "exactly one
//! monitor per process" rule explicit rather than hidden in a global.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{MonitorConfig, MonitorConfigPatch};
use crate::error::{Error, Result};
use crate::monitor::engine::MonitorEngine;
use crate::stacks::TransactionSource;
use crate::trading::TradeExecutor;

/// Holds the single engine instance and its collaborator handles
pub struct MonitorRegistry {
    source: Arc<dyn TransactionSource>,
    executor: Arc<dyn TradeExecutor>,
    instance: Mutex<Option<Arc<MonitorEngine>>>,
}

impl MonitorRegistry {
    pub fn new(source: Arc<dyn TransactionSource>, executor: Arc<dyn TradeExecutor>) -> Self {
        Self {
            source,
            executor,
            instance: Mutex::new(None),
        }
    }

    /// Fetch the engine, constructing it on first use.
    ///
    /// With a config and no instance, a new engine is built. With a
    /// config and a live instance, the config is merged into it. Without
    /// a config the live instance is returned as-is; if none exists the
    /// call fails with `NotInitialized`.
    pub async fn get_or_create(&self, config: Option<MonitorConfig>) -> Result<Arc<MonitorEngine>> {
        let mut guard = self.instance.lock().await;

        match (guard.as_ref(), config) {
            (Some(engine), Some(config)) => {
                let engine = engine.clone();
                engine.update_config(MonitorConfigPatch::from(config)).await;
                Ok(engine)
            }
            (Some(engine), None) => Ok(engine.clone()),
            (None, Some(config)) => {
                info!("Creating pressure monitor instance");
                let engine = Arc::new(MonitorEngine::new(
                    config,
                    self.source.clone(),
                    self.executor.clone(),
                ));
                *guard = Some(engine.clone());
                Ok(engine)
            }
            (None, None) => Err(Error::NotInitialized),
        }
    }

    /// Stop and discard the current instance, allowing a fresh
    /// `get_or_create` later
    pub async fn reset(&self) {
        let mut guard = self.instance.lock().await;
        if let Some(engine) = guard.take() {
            engine.stop().await;
            info!("Pressure monitor instance discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacks::TransactionPage;
    use async_trait::async_trait;
    use crate::trading::XykSwapParams;

    struct EmptySource;

    #[async_trait]
    impl TransactionSource for EmptySource {
        async fn address_transactions(
            &self,
            _address: &str,
            limit: u32,
            offset: u32,
        ) -> Result<TransactionPage> {
            Ok(TransactionPage {
                limit,
                offset,
                total: 0,
                results: vec![],
            })
        }
    }

    struct NoTrader;

    #[async_trait]
    impl TradeExecutor for NoTrader {
        async fn buy(&self, _params: &XykSwapParams) -> Result<String> {
            Ok("noop".to_string())
        }

        async fn sell(&self, _params: &XykSwapParams) -> Result<String> {
            Ok("noop".to_string())
        }
    }

    fn registry() -> MonitorRegistry {
        MonitorRegistry::new(Arc::new(EmptySource), Arc::new(NoTrader))
    }

    #[tokio::test]
    async fn test_uninitialized_access_fails() {
        let registry = registry();

        let result = registry.get_or_create(None).await;
        assert!(matches!(result, Err(Error::NotInitialized)));
    }

    #[tokio::test]
    async fn test_create_then_reuse_same_instance() {
        let registry = registry();

        let first = registry
            .get_or_create(Some(MonitorConfig::default()))
            .await
            .unwrap();
        let second = registry.get_or_create(None).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_config_merges_into_live_instance() {
        let registry = registry();

        let engine = registry
            .get_or_create(Some(MonitorConfig::default()))
            .await
            .unwrap();

        let updated = MonitorConfig {
            enabled: true,
            monitored_addresses: vec!["SPA".to_string()],
            ..Default::default()
        };
        let merged = registry.get_or_create(Some(updated)).await.unwrap();

        assert!(Arc::ptr_eq(&engine, &merged));
        let config = engine.config().await;
        assert!(config.enabled);
        assert_eq!(config.monitored_addresses, vec!["SPA"]);
    }

    #[tokio::test]
    async fn test_reset_stops_and_discards() {
        let registry = registry();

        let engine = registry
            .get_or_create(Some(MonitorConfig::default()))
            .await
            .unwrap();
        engine.start().await;
        assert!(engine.is_running());

        registry.reset().await;
        assert!(!engine.is_running());
        assert!(matches!(
            registry.get_or_create(None).await,
            Err(Error::NotInitialized)
        ));
    }
}
