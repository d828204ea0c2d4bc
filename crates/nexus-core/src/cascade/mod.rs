//! Priority-ordered model fallback.
//!
//! ```text
//! generate ─► exhaustion latch set? ──yes──► Exhausted
//!                │ no
//!                ▼
//!          model[i] ─ok──► Generated
//!                │ err
//!                ├─ fatal ─────► Fatal (stop)
//!                ├─ not found ─► model[i+1], no retry
//!                └─ transient ─► backoff + retry up to max, then model[i+1]
//!          past the last model ─► trip latch ─► Exhausted
//! ```
//!
//! Attempts within one call are strictly sequential.

mod backend;
mod classify;
mod exhaustion;

pub use backend::{BackendError, ModelBackend};
pub use classify::{
    ErrorClass, ErrorClassifier, SubstringClassifier, NOT_FOUND_KEYWORDS, TRANSIENT_KEYWORDS,
    UNSUPPORTED_KEYWORDS,
};
pub use exhaustion::{ExhaustionLatch, ServiceAvailability};

#[cfg(test)]
pub(crate) use backend::testing as backend_testing;

use nexus_types::{CascadeConfig, Generated, GenerationError, ModelSpec};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::prometheus;

pub const EXHAUSTED_MESSAGE: &str =
    "Service temporarily unavailable. All model rate limits reached. Please try again later.";

/// Length of error excerpts in log lines.
const LOG_EXCERPT_CHARS: usize = 100;

fn excerpt(message: &str) -> String {
    message.chars().take(LOG_EXCERPT_CHARS).collect()
}

/// Combine the system instruction and the prompt into one model input.
pub fn full_prompt(prompt: &str, system_instruction: &str) -> String {
    if system_instruction.is_empty() {
        prompt.to_string()
    } else {
        format!("{}\n\n{}", system_instruction, prompt)
    }
}

enum ModelOutcome {
    Success(String),
    Fatal(String),
    /// Move on to the next model.
    Skip,
}

pub struct ModelCascade {
    backend: Arc<dyn ModelBackend>,
    classifier: Arc<dyn ErrorClassifier>,
    latch: ExhaustionLatch,
    models: Vec<ModelSpec>,
    config: CascadeConfig,
}

impl ModelCascade {
    pub fn new(
        backend: Arc<dyn ModelBackend>,
        latch: ExhaustionLatch,
        config: CascadeConfig,
    ) -> Self {
        Self {
            backend,
            classifier: Arc::new(SubstringClassifier::default()),
            latch,
            models: config.model_specs(),
            config,
        }
    }

    /// Replace the keyword classifier, e.g. with one reading structured codes.
    pub fn with_classifier(mut self, classifier: Arc<dyn ErrorClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Models in the order they are tried.
    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    pub fn latch(&self) -> &ExhaustionLatch {
        &self.latch
    }

    pub async fn availability(&self) -> ServiceAvailability {
        self.latch.availability().await
    }

    /// Backoff before retry number `attempt + 1`: `initial * 2^attempt`.
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        Duration::from_millis(self.config.initial_retry_delay_ms.saturating_mul(factor))
    }

    /// Generate a response, falling back through the configured models.
    ///
    /// Only two failures escape: [`GenerationError::Exhausted`] when every
    /// model failed (now or within the reset window) and
    /// [`GenerationError::Fatal`] for non-recoverable errors.
    pub async fn generate(
        &self,
        prompt: &str,
        system_instruction: &str,
    ) -> Result<Generated, GenerationError> {
        let trace_id: String = uuid::Uuid::new_v4().simple().to_string().chars().take(8).collect();

        if let Some(remaining) = self.latch.check().await {
            warn!("[{}] All models exhausted, rejecting request", trace_id);
            return Err(GenerationError::Exhausted {
                message: EXHAUSTED_MESSAGE.to_string(),
                retry_after_secs: exhaustion::ceil_secs(remaining),
            });
        }

        let started = Instant::now();
        let input = full_prompt(prompt, system_instruction);
        let total = self.models.len();

        for (index, model) in self.models.iter().enumerate() {
            info!(
                "[{}] Attempting model {}/{}: {} ({})",
                trace_id,
                index + 1,
                total,
                model.display_name,
                model.id
            );
            match self.try_model(&trace_id, &model.id, &input).await {
                ModelOutcome::Success(text) => {
                    prometheus::record_generation_duration(started.elapsed());
                    return Ok(Generated { text, model_used: model.id.clone() });
                },
                ModelOutcome::Fatal(message) => {
                    prometheus::record_generation_duration(started.elapsed());
                    return Err(GenerationError::Fatal { model: model.id.clone(), message });
                },
                ModelOutcome::Skip => {},
            }
        }

        error!(critical = true, "[{}] All {} models exhausted", trace_id, total);
        prometheus::record_exhaustion();
        prometheus::record_generation_duration(started.elapsed());
        self.latch.trip().await;
        Err(GenerationError::Exhausted {
            message: EXHAUSTED_MESSAGE.to_string(),
            retry_after_secs: self.latch.reset_window().as_secs(),
        })
    }

    async fn try_model(&self, trace_id: &str, model: &str, input: &str) -> ModelOutcome {
        let max_attempts = self.config.max_retries_per_model.max(1);
        let call_timeout = Duration::from_secs(self.config.model_call_timeout_secs);

        for attempt in 0..max_attempts {
            let call = self.backend.generate_content(model, input);
            let (class, message) = match tokio::time::timeout(call_timeout, call).await {
                Ok(Ok(text)) => {
                    info!("[{}] Success with {} on attempt {}", trace_id, model, attempt + 1);
                    prometheus::record_model_attempt(model, "success");
                    return ModelOutcome::Success(text);
                },
                Ok(Err(e)) => (self.classifier.classify(&e), e.message),
                Err(_) => (
                    ErrorClass::Transient,
                    format!("Model call timed out after {}s", call_timeout.as_secs()),
                ),
            };
            prometheus::record_model_attempt(model, class.as_str());

            match class {
                ErrorClass::Fatal => {
                    error!("[{}] Non-recoverable error with {}: {}", trace_id, model, message);
                    return ModelOutcome::Fatal(message);
                },
                ErrorClass::NotFound => {
                    warn!(
                        "[{}] Model {} unavailable upstream: {}... Moving to next model",
                        trace_id,
                        model,
                        excerpt(&message)
                    );
                    prometheus::record_model_not_found(model);
                    return ModelOutcome::Skip;
                },
                ErrorClass::Transient => {
                    warn!(
                        "[{}] Rate limit hit for {} (attempt {}/{}): {}...",
                        trace_id,
                        model,
                        attempt + 1,
                        max_attempts,
                        excerpt(&message)
                    );
                    if attempt + 1 < max_attempts {
                        let delay = self.backoff(attempt);
                        info!("[{}] Retrying {} in {}ms", trace_id, model, delay.as_millis());
                        sleep(delay).await;
                    }
                },
            }
        }

        warn!("[{}] Max retries reached for {}, moving to next model", trace_id, model);
        ModelOutcome::Skip
    }
}
