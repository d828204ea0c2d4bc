//! Wiring from configuration to core services.

use anyhow::{Context, Result};
use nexus_core::upstream::GeminiBackend;
use nexus_core::{
    AdmissionGate, ExhaustionLatch, KeySpace, MemoryStore, ModelCascade, RedisStore, SharedStore,
    SystemClock,
};
use nexus_types::NexusConfig;
use std::sync::Arc;
use std::time::Duration;

/// Slack on top of the cascade's own per-call timeout.
const HTTP_TIMEOUT_MARGIN_SECS: u64 = 5;

pub struct Services {
    pub config: NexusConfig,
    pub store: Arc<dyn SharedStore>,
    pub keys: KeySpace,
}

impl Services {
    pub async fn connect(config: NexusConfig) -> Result<Self> {
        let store: Arc<dyn SharedStore> = match config.store.redis_url.as_deref() {
            Some(url) => Arc::new(RedisStore::connect(url).await?),
            None => {
                tracing::warn!(
                    "NEXUS_REDIS_URL not set; using an in-process store (limits reset on exit)"
                );
                Arc::new(MemoryStore::new())
            },
        };
        let keys = KeySpace::new(config.store.key_prefix.clone());
        Ok(Self { config, store, keys })
    }

    pub fn gate(&self) -> AdmissionGate {
        AdmissionGate::new(self.store.clone(), self.keys.clone(), self.config.admission.clone())
    }

    pub fn latch(&self) -> ExhaustionLatch {
        ExhaustionLatch::new(
            self.store.clone(),
            &self.keys,
            Arc::new(SystemClock),
            Duration::from_secs(self.config.cascade.exhaustion_reset_secs),
        )
    }

    pub fn cascade(&self) -> Result<ModelCascade> {
        let call_timeout = self.config.cascade.model_call_timeout_secs;
        let timeout = Duration::from_secs(call_timeout + HTTP_TIMEOUT_MARGIN_SECS);
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let backend = GeminiBackend::from_env(http_client, self.config.gemini_base_url.as_deref())?;
        Ok(ModelCascade::new(Arc::new(backend), self.latch(), self.config.cascade.clone()))
    }
}
