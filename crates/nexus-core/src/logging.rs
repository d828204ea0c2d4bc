//! Process-wide tracing setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
///
/// Records emitted through the `log` facade by dependencies are forwarded
/// into tracing.
pub fn init_logging(default_level: &str) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| AppError::Logging(format!("Invalid log filter '{}': {}", default_level, e)))?;

    let subscriber = fmt().with_env_filter(filter).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Logging(format!("Failed to install subscriber: {}", e)))?;

    tracing_log::LogTracer::init()
        .map_err(|e| AppError::Logging(format!("Failed to bridge log records: {}", e)))?;
    Ok(())
}
