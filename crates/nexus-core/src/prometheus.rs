//! Prometheus metrics for Nexus observability.
//!
//! - `nexus_admission_total{outcome,scope}` - Counter of admission decisions
//! - `nexus_store_failures_total{op}` - Counter of swallowed shared store errors
//! - `nexus_model_attempts_total{model,outcome}` - Counter of model calls by outcome
//! - `nexus_model_not_found_total{model}` - Counter of configured models missing upstream
//! - `nexus_exhaustion_total` - Counter of cascade exhaustion events
//! - `nexus_generation_duration_seconds` - Histogram of end-to-end cascade latency
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

static PROMETHEUS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// LLM calls are bimodal: sub-second cache hits and multi-second generations,
/// plus backoff sleeps when the cascade falls through.
const GENERATION_LATENCY_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0];

/// Install the Prometheus recorder. Safe to call more than once.
///
/// Returns `None` if another global recorder is already installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = match PrometheusBuilder::new().set_buckets(GENERATION_LATENCY_BUCKETS) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("Failed to set histogram buckets: {}", e);
                    PrometheusBuilder::new()
                },
            };
            let handle = match builder.install_recorder() {
                Ok(h) => h,
                Err(e) => {
                    tracing::warn!("Prometheus recorder not installed: {}", e);
                    return None;
                },
            };

            describe_counter!("nexus_admission_total", "Admission decisions by outcome and scope");
            describe_counter!(
                "nexus_store_failures_total",
                "Shared store errors swallowed by the fail-open policy"
            );
            describe_counter!("nexus_model_attempts_total", "Model calls by model and outcome");
            describe_counter!(
                "nexus_model_not_found_total",
                "Configured models reported missing by the upstream API"
            );
            describe_counter!("nexus_exhaustion_total", "Times every model in the cascade failed");
            describe_histogram!(
                "nexus_generation_duration_seconds",
                "Cascade latency including retries and backoff"
            );

            Some(handle)
        })
        .clone()
}

/// Render metrics in Prometheus text format.
pub fn render_metrics() -> String {
    PROMETHEUS_HANDLE
        .get()
        .and_then(Option::as_ref)
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

pub fn record_admission(allowed: bool, scope: Option<&'static str>) {
    let outcome = if allowed { "allowed" } else { "denied" };
    counter!("nexus_admission_total", "outcome" => outcome, "scope" => scope.unwrap_or("none"))
        .increment(1);
}

pub fn record_store_failure(op: &'static str) {
    counter!("nexus_store_failures_total", "op" => op).increment(1);
}

pub fn record_model_attempt(model: &str, outcome: &'static str) {
    counter!("nexus_model_attempts_total", "model" => model.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_model_not_found(model: &str) {
    counter!("nexus_model_not_found_total", "model" => model.to_string()).increment(1);
}

pub fn record_exhaustion() {
    counter!("nexus_exhaustion_total").increment(1);
}

pub fn record_generation_duration(elapsed: Duration) {
    histogram!("nexus_generation_duration_seconds").record(elapsed.as_secs_f64());
}
