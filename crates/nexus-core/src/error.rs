//! Unified error types for Nexus Core.

use serde::Serialize;
use thiserror::Error;

/// Error type for core setup and plumbing.
///
/// Request-path failures use the narrower types from `nexus-types`
/// (`GenerationError`, `StoreError`); this type covers process startup.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AppError {
    /// Redis command or connection failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Log filter or subscriber installation failed.
    #[error("Logging error: {0}")]
    Logging(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for Nexus core operations.
pub type AppResult<T> = Result<T, AppError>;
