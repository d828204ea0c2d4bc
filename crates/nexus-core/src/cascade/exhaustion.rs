//! Deployment-wide "all models exhausted" latch.
//!
//! Stored as the trip time (unix millis) under one key in the shared store.
//! Expiry is checked on read: the latch holds while elapsed <= reset window.
//! The store TTL outlives that window by one second and only reclaims the key.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::best_effort::best_effort;
use crate::clock::Clock;
use crate::store::{KeySpace, SharedStore};

/// Extra store lifetime past the reset window.
const KEY_GRACE: Duration = Duration::from_secs(1);

/// Whether generation is currently possible, and when to retry if not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAvailability {
    pub available: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ServiceAvailability {
    fn available() -> Self {
        Self { available: true, message: "Service available".to_string(), retry_after_secs: None }
    }

    fn exhausted(remaining: Duration) -> Self {
        let secs = remaining.as_secs();
        Self {
            available: false,
            message: format!("Service temporarily unavailable. Please try again in {}s.", secs),
            retry_after_secs: Some(ceil_secs(remaining)),
        }
    }
}

pub(crate) fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs() + 1
    } else {
        d.as_secs()
    }
}

pub struct ExhaustionLatch {
    store: Arc<dyn SharedStore>,
    key: String,
    clock: Arc<dyn Clock>,
    reset: Duration,
}

impl ExhaustionLatch {
    pub fn new(
        store: Arc<dyn SharedStore>,
        keys: &KeySpace,
        clock: Arc<dyn Clock>,
        reset: Duration,
    ) -> Self {
        Self { store, key: keys.exhaustion(), clock, reset }
    }

    pub fn reset_window(&self) -> Duration {
        self.reset
    }

    /// Time left until the latch opens, or `None` if it is not set.
    ///
    /// At exactly the reset window the latch is still set with zero remaining.
    ///
    /// An unreadable store counts as not set.
    pub async fn check(&self) -> Option<Duration> {
        let tripped_at = best_effort("exhaustion_get", None, self.store.get(&self.key)).await?;
        let elapsed_ms = self.clock.now().timestamp_millis().saturating_sub(tripped_at);
        let elapsed = Duration::from_millis(u64::try_from(elapsed_ms).unwrap_or(0));

        if elapsed <= self.reset {
            return Some(self.reset - elapsed);
        }

        tracing::info!("Resetting model exhaustion after {}s", elapsed.as_secs());
        best_effort("exhaustion_clear", (), self.store.delete(&self.key)).await;
        None
    }

    pub async fn trip(&self) {
        let now_ms = self.clock.now().timestamp_millis();
        let ttl = self.reset + KEY_GRACE;
        best_effort("exhaustion_set", (), self.store.set(&self.key, now_ms, Some(ttl))).await;
    }

    pub async fn clear(&self) {
        best_effort("exhaustion_clear", (), self.store.delete(&self.key)).await;
    }

    pub async fn availability(&self) -> ServiceAvailability {
        match self.check().await {
            Some(remaining) => ServiceAvailability::exhausted(remaining),
            None => ServiceAvailability::available(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::testing::UnavailableStore;
    use crate::store::MemoryStore;

    fn latch() -> (ExhaustionLatch, ManualClock) {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        let latch = ExhaustionLatch::new(
            store,
            &KeySpace::default(),
            Arc::new(clock.clone()),
            Duration::from_secs(300),
        );
        (latch, clock)
    }

    #[tokio::test]
    async fn test_latch_expires_after_reset_window() {
        let (latch, clock) = latch();
        assert_eq!(latch.check().await, None);

        latch.trip().await;
        assert_eq!(latch.check().await, Some(Duration::from_secs(300)));

        clock.advance(Duration::from_secs(120));
        assert_eq!(latch.check().await, Some(Duration::from_secs(180)));

        clock.advance(Duration::from_secs(180));
        assert_eq!(latch.check().await, Some(Duration::ZERO));

        clock.advance(Duration::from_millis(1));
        assert_eq!(latch.check().await, None);
        // Opening the latch clears the key for every reader
        assert_eq!(latch.check().await, None);
    }

    #[tokio::test]
    async fn test_store_key_outlives_reset_window() {
        let clock = ManualClock::default();
        let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
        let keys = KeySpace::default();
        let latch = ExhaustionLatch::new(
            store.clone(),
            &keys,
            Arc::new(clock.clone()),
            Duration::from_secs(300),
        );

        latch.trip().await;
        clock.advance(Duration::from_secs(300));
        assert!(store.get(&keys.exhaustion()).await.ok().flatten().is_some());
        assert!(!latch.availability().await.available);
    }

    #[tokio::test]
    async fn test_availability_message() {
        let (latch, clock) = latch();
        assert!(latch.availability().await.available);

        latch.trip().await;
        clock.advance(Duration::from_secs(100));
        let availability = latch.availability().await;
        assert!(!availability.available);
        assert_eq!(
            availability.message,
            "Service temporarily unavailable. Please try again in 200s."
        );
        assert_eq!(availability.retry_after_secs, Some(200));
    }

    #[tokio::test]
    async fn test_clear() {
        let (latch, _) = latch();
        latch.trip().await;
        latch.clear().await;
        assert_eq!(latch.check().await, None);
    }

    #[tokio::test]
    async fn test_unreadable_store_counts_as_available() {
        let latch = ExhaustionLatch::new(
            Arc::new(UnavailableStore::default()),
            &KeySpace::default(),
            Arc::new(ManualClock::default()),
            Duration::from_secs(300),
        );
        latch.trip().await;
        assert!(latch.availability().await.available);
    }
}
