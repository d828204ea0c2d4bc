//! Fixed-window counters over the shared store.

use std::sync::Arc;
use std::time::Duration;

use super::key::CounterKey;
use crate::best_effort::best_effort;
use crate::store::{KeySpace, SharedStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Admitted,
    Denied { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, RateDecision::Admitted)
    }
}

fn limit_as_i64(limit: u64) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Read-then-write counters. Lost updates under races are tolerated; a
/// store with atomic INCR simply loses fewer.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SharedStore>,
    keys: KeySpace,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn SharedStore>, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Current count, or `None` when the store could not be read.
    pub async fn count(&self, key: &CounterKey) -> Option<i64> {
        let store_key = key.store_key(&self.keys);
        best_effort("rate_get", None, async {
            self.store.get(&store_key).await.map(|v| Some(v.unwrap_or(0)))
        })
        .await
    }

    /// Admit and count one request against `key`, or deny if the window is full.
    ///
    /// The first increment in a window arms the expiry, so the window starts
    /// at the first admitted request and resets `window` later. Increment and
    /// expiry go to the store together; a counter found without expiry is
    /// armed by the next admitted request.
    pub async fn check_and_admit(
        &self,
        key: &CounterKey,
        limit: u64,
        window: Duration,
    ) -> RateDecision {
        let Some(current) = self.count(key).await else {
            tracing::warn!(counter = %key, "Rate counter unreadable, admitting");
            return RateDecision::Admitted;
        };

        if current >= limit_as_i64(limit) {
            tracing::debug!(counter = %key, current, limit, "Rate limit reached");
            return RateDecision::Denied { retry_after_secs: key.scope().retry_after_secs() };
        }

        let store_key = key.store_key(&self.keys);
        let counted = best_effort("rate_incr", None, async {
            self.store.incr_with_expiry(&store_key, window).await.map(Some)
        })
        .await;
        match counted {
            Some(count) => tracing::debug!(counter = %key, count, limit, "Request counted"),
            None => tracing::warn!(counter = %key, "Rate counter not incremented, admitting"),
        }
        RateDecision::Admitted
    }

    /// Read-only limit check. Unreadable counters count as below the limit.
    pub async fn is_below(&self, key: &CounterKey, limit: u64) -> bool {
        match self.count(key).await {
            Some(current) => current < limit_as_i64(limit),
            None => true,
        }
    }

    /// Count one request entering flight. Every increment re-arms `ttl`, so a
    /// counter leaked by a crashed worker drains once traffic stops.
    pub async fn increment_in_flight(&self, ttl: Duration) {
        let store_key = CounterKey::global_parallel().store_key(&self.keys);
        let incremented =
            best_effort("inflight_incr", None, async { self.store.incr(&store_key).await.map(Some) })
                .await;
        if incremented.is_some() {
            best_effort("inflight_expire", (), self.store.expire(&store_key, ttl)).await;
        }
    }

    /// Count one request leaving flight, never going below zero.
    pub async fn decrement_in_flight(&self, ttl: Duration) {
        let store_key = CounterKey::global_parallel().store_key(&self.keys);
        let remaining =
            best_effort("inflight_decr", None, async { self.store.decr(&store_key).await.map(Some) })
                .await;
        match remaining {
            Some(value) if value < 0 => {
                best_effort("inflight_clamp", (), self.store.set(&store_key, 0, Some(ttl))).await;
            },
            Some(_) => {
                best_effort("inflight_expire", (), self.store.expire(&store_key, ttl)).await;
            },
            None => {},
        }
    }

    /// Requests currently in flight (0 when unreadable).
    pub async fn in_flight(&self) -> i64 {
        self.count(&CounterKey::global_parallel()).await.unwrap_or(0)
    }
}
