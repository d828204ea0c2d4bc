//! Configuration loading: defaults, optional JSON file, environment overrides.

use nexus_types::{ConfigError, NexusConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use validator::Validate;

/// Path of an optional JSON config file.
pub const CONFIG_PATH_ENV: &str = "NEXUS_CONFIG";

/// Load the configuration from the process environment.
pub fn load_config() -> Result<NexusConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    load_config_from(path.as_deref(), &|name| std::env::var(name).ok())
}

/// Load the configuration from an optional file and an environment lookup.
pub fn load_config_from(
    path: Option<&Path>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<NexusConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => NexusConfig::default(),
    };

    apply_env_overrides(&mut config, env);

    config.validate().map_err(|e| ConfigError::from_validation_errors(&e))?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<NexusConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound { path: path.display().to_string() });
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;
    let config = serde_json::from_str(&content).map_err(|e| ConfigError::from_json_error(&e))?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok(config)
}

fn override_number<T: FromStr>(env: &dyn Fn(&str) -> Option<String>, name: &str, target: &mut T) {
    let Some(raw) = env(name) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => tracing::warn!("Ignoring {}: '{}' is not a valid number", name, raw),
    }
}

fn override_string(env: &dyn Fn(&str) -> Option<String>, name: &str, target: &mut Option<String>) {
    if let Some(raw) = env(name) {
        let value = raw.trim();
        if !value.is_empty() {
            *target = Some(value.to_string());
        }
    }
}

fn apply_env_overrides(config: &mut NexusConfig, env: &dyn Fn(&str) -> Option<String>) {
    if let Some(raw) = env("NEXUS_MODELS") {
        let models: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        if models.is_empty() {
            tracing::warn!("Ignoring NEXUS_MODELS: no model identifiers");
        } else {
            config.cascade.models = models;
        }
    }

    let admission = &mut config.admission;
    override_number(env, "NEXUS_USER_REQUESTS_PER_MINUTE", &mut admission.user_requests_per_minute);
    override_number(env, "NEXUS_USER_REQUESTS_PER_HOUR", &mut admission.user_requests_per_hour);
    override_number(env, "NEXUS_GLOBAL_PARALLEL_LIMIT", &mut admission.global_parallel_limit);
    override_number(env, "NEXUS_API_CALLS_PER_MINUTE", &mut admission.api_calls_per_minute);

    let cascade = &mut config.cascade;
    override_number(env, "NEXUS_EXHAUSTION_RESET_SECS", &mut cascade.exhaustion_reset_secs);
    override_number(env, "NEXUS_MAX_RETRIES_PER_MODEL", &mut cascade.max_retries_per_model);
    override_number(env, "NEXUS_INITIAL_RETRY_DELAY_MS", &mut cascade.initial_retry_delay_ms);
    override_number(env, "NEXUS_MODEL_CALL_TIMEOUT_SECS", &mut cascade.model_call_timeout_secs);

    override_string(env, "NEXUS_REDIS_URL", &mut config.store.redis_url);
    override_string(env, "NEXUS_GEMINI_BASE_URL", &mut config.gemini_base_url);
}
