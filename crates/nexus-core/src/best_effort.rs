//! Fail-open wrapper for shared store calls.
//!
//! A misbehaving store must never block the product: every store call on the
//! request path goes through [`best_effort`], which logs the failure, counts
//! it, and hands back a caller-chosen default.

use nexus_types::StoreError;
use std::future::Future;

use crate::prometheus;

pub async fn best_effort<T, F>(op: &'static str, default: T, fut: F) -> T
where
    F: Future<Output = Result<T, StoreError>>,
{
    match fut.await {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(op = op, error = %e, "Shared store call failed, continuing fail-open");
            prometheus::record_store_failure(op);
            default
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_value_through() {
        let value = best_effort("get", 0_i64, async { Ok(7) }).await;
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_returns_default_on_error() {
        let value = best_effort("get", 0_i64, async {
            Err(StoreError::Unavailable { message: "down".to_string() })
        })
        .await;
        assert_eq!(value, 0);
    }
}
