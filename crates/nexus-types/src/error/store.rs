//! Shared store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the shared counter store.
///
/// Callers in the admission and cascade layers never propagate these:
/// every store interaction is wrapped in the best-effort helper.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum StoreError {
    /// Backend could not be reached or refused the command
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Backend error text
        message: String,
    },

    /// Stored value could not be interpreted
    #[error("Corrupt value at {key}: {message}")]
    CorruptValue {
        /// Key holding the bad value
        key: String,
        /// Description of the problem
        message: String,
    },
}
