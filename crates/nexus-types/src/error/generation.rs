//! Generation failures that cross the core boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two failures a generation request can surface to the caller.
///
/// Transient and not-found model errors are absorbed by the cascade
/// (retry or fallback) and never appear here.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum GenerationError {
    /// Every model in the cascade failed recently.
    #[error("{message}")]
    Exhausted {
        /// User-facing explanation
        message: String,
        /// Suggested wait before retrying, in seconds
        retry_after_secs: u64,
    },

    /// A non-recoverable model error (auth, configuration).
    #[error("Non-recoverable error from {model}: {message}")]
    Fatal {
        /// Model that raised the error
        model: String,
        /// Raw upstream error message
        message: String,
    },
}

impl GenerationError {
    /// Wire name of the failure kind: `"exhausted"` or `"fatal"`.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Exhausted { .. } => "exhausted",
            Self::Fatal { .. } => "fatal",
        }
    }

    /// Retry hint for the caller, if any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Exhausted { retry_after_secs, .. } => Some(*retry_after_secs),
            Self::Fatal { .. } => None,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Fatal errors carry raw upstream text (possibly leaking configuration
    /// details), so they are replaced by a generic notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Exhausted { message, .. } => message.clone(),
            Self::Fatal { .. } => {
                "API configuration error. Please contact administrator.".to_string()
            },
        }
    }
}
