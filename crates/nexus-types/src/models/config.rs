//! Runtime configuration models.
//!
//! Every field has a serde default so a partial JSON file (or none at all)
//! yields the production defaults. Environment overrides are applied by
//! `nexus_core::config::load_config`.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::model_spec::{default_model_ids, ModelSpec};

// ============================================================================
// Cascade
// ============================================================================

/// Model cascade and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct CascadeConfig {
    /// Model identifiers in priority order (index 0 tried first)
    #[validate(length(min = 1, message = "at least one model is required"))]
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    /// Attempts per model before falling through on transient errors
    #[validate(range(min = 1, max = 10))]
    #[serde(default = "default_max_retries_per_model")]
    pub max_retries_per_model: u32,
    /// Base of the exponential backoff, in milliseconds
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,
    /// How long the exhaustion flag stays set, in seconds
    #[validate(range(min = 1))]
    #[serde(default = "default_exhaustion_reset_secs")]
    pub exhaustion_reset_secs: u64,
    /// Upper bound for a single model call, in seconds
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_model_call_timeout_secs")]
    pub model_call_timeout_secs: u64,
}

impl CascadeConfig {
    /// Cascade entries in priority order, with display names resolved.
    pub fn model_specs(&self) -> Vec<ModelSpec> {
        self.models.iter().map(ModelSpec::new).collect()
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            models: default_models(),
            max_retries_per_model: default_max_retries_per_model(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            exhaustion_reset_secs: default_exhaustion_reset_secs(),
            model_call_timeout_secs: default_model_call_timeout_secs(),
        }
    }
}

// ============================================================================
// Admission
// ============================================================================

/// Thresholds for the four admission gates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct AdmissionConfig {
    /// Master switch; when false every action is admitted
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Requests currently in flight across all workers
    #[validate(range(min = 1))]
    #[serde(default = "default_global_parallel_limit")]
    pub global_parallel_limit: u64,
    /// Safety expiry of the in-flight counter, in seconds
    #[validate(range(min = 1))]
    #[serde(default = "default_global_parallel_ttl_secs")]
    pub global_parallel_ttl_secs: u64,
    /// Mutating requests per user per minute
    #[validate(range(min = 1))]
    #[serde(default = "default_user_requests_per_minute")]
    pub user_requests_per_minute: u64,
    /// Mutating requests per user per hour
    #[validate(range(min = 1))]
    #[serde(default = "default_user_requests_per_hour")]
    pub user_requests_per_hour: u64,
    /// AI generation calls per user per minute
    #[validate(range(min = 1))]
    #[serde(default = "default_api_calls_per_minute")]
    pub api_calls_per_minute: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            global_parallel_limit: default_global_parallel_limit(),
            global_parallel_ttl_secs: default_global_parallel_ttl_secs(),
            user_requests_per_minute: default_user_requests_per_minute(),
            user_requests_per_hour: default_user_requests_per_hour(),
            api_calls_per_minute: default_api_calls_per_minute(),
        }
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Prompt assembly bounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct OrchestratorConfig {
    /// Prior turns included in the transcript
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    /// Per-turn character cap in the transcript
    #[validate(range(min = 1))]
    #[serde(default = "default_history_max_chars")]
    pub history_max_chars: usize,
    /// Longest accepted user message, in characters
    #[validate(range(min = 1))]
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            history_turns: default_history_turns(),
            history_max_chars: default_history_max_chars(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

// ============================================================================
// Store / upstream
// ============================================================================

/// Shared store and upstream endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct StoreConfig {
    /// Redis URL; in-process memory store when absent
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Key namespace prefix
    #[validate(length(min = 1))]
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

/// Full Nexus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, Validate)]
pub struct NexusConfig {
    /// Model cascade settings
    #[validate(nested)]
    #[serde(default)]
    pub cascade: CascadeConfig,
    /// Admission gate settings
    #[validate(nested)]
    #[serde(default)]
    pub admission: AdmissionConfig,
    /// Prompt assembly settings
    #[validate(nested)]
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Shared store settings
    #[validate(nested)]
    #[serde(default)]
    pub store: StoreConfig,
    /// Gemini API base URL override
    #[serde(default)]
    pub gemini_base_url: Option<String>,
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_models() -> Vec<String> {
    default_model_ids()
}

fn default_max_retries_per_model() -> u32 {
    2
}

fn default_initial_retry_delay_ms() -> u64 {
    500
}

fn default_exhaustion_reset_secs() -> u64 {
    300
}

fn default_model_call_timeout_secs() -> u64 {
    45
}

fn default_global_parallel_limit() -> u64 {
    50
}

fn default_global_parallel_ttl_secs() -> u64 {
    60
}

fn default_user_requests_per_minute() -> u64 {
    10
}

fn default_user_requests_per_hour() -> u64 {
    100
}

fn default_api_calls_per_minute() -> u64 {
    5
}

fn default_history_turns() -> usize {
    10
}

fn default_history_max_chars() -> usize {
    500
}

fn default_max_message_chars() -> usize {
    5000
}

fn default_key_prefix() -> String {
    "nexus".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { redis_url: None, key_prefix: default_key_prefix() }
    }
}
