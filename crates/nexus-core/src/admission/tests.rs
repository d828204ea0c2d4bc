use super::*;
use crate::clock::ManualClock;
use crate::store::testing::UnavailableStore;
use crate::store::{KeySpace, MemoryStore, SharedStore, StoreResult};
use nexus_types::{ActionKind, AdmissionConfig, RateScope};
use async_trait::async_trait;
use nexus_types::StoreError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn gate_with(config: AdmissionConfig) -> (AdmissionGate, Arc<MemoryStore>, ManualClock) {
    let clock = ManualClock::default();
    let store = Arc::new(MemoryStore::with_clock(Arc::new(clock.clone())));
    let gate = AdmissionGate::new(store.clone(), KeySpace::default(), config);
    (gate, store, clock)
}

fn gate() -> (AdmissionGate, Arc<MemoryStore>, ManualClock) {
    gate_with(AdmissionConfig::default())
}

#[tokio::test]
async fn test_minute_limit_scenario() {
    let (gate, _, clock) = gate();

    for i in 0..10 {
        let admission = gate.admit("u1", ActionKind::SessionMutation).await;
        assert!(admission.is_allowed(), "call {} should be admitted", i + 1);
        admission.complete().await;
    }

    let eleventh = gate.admit("u1", ActionKind::SessionMutation).await;
    assert!(!eleventh.is_allowed());
    assert_eq!(eleventh.decision().retry_after_seconds, 10);
    assert_eq!(eleventh.decision().denied_by, Some(RateScope::UserMinute));

    clock.advance(Duration::from_secs(61));
    let twelfth = gate.admit("u1", ActionKind::SessionMutation).await;
    assert!(twelfth.is_allowed());
}

#[tokio::test]
async fn test_denial_is_monotonic_within_window() {
    let (gate, _, clock) = gate();
    for _ in 0..10 {
        gate.admit("u1", ActionKind::Upload).await.complete().await;
    }
    for _ in 0..5 {
        clock.advance(Duration::from_secs(5));
        assert!(!gate.admit("u1", ActionKind::Upload).await.is_allowed());
    }
}

#[tokio::test]
async fn test_window_starts_at_first_request() {
    let (gate, _, clock) = gate();
    gate.admit("u1", ActionKind::SessionMutation).await.complete().await;
    clock.advance(Duration::from_secs(59));
    for _ in 0..9 {
        gate.admit("u1", ActionKind::SessionMutation).await.complete().await;
    }
    assert!(!gate.admit("u1", ActionKind::SessionMutation).await.is_allowed());

    // The whole window expires 60s after the first increment
    clock.advance(Duration::from_secs(1));
    assert!(gate.admit("u1", ActionKind::SessionMutation).await.is_allowed());
}

#[tokio::test]
async fn test_actors_are_independent() {
    let (gate, _, _) = gate();
    for _ in 0..10 {
        gate.admit("u1", ActionKind::SessionMutation).await.complete().await;
    }
    assert!(!gate.admit("u1", ActionKind::SessionMutation).await.is_allowed());
    assert!(gate.admit("u2", ActionKind::SessionMutation).await.is_allowed());
}

#[tokio::test]
async fn test_hourly_limit() {
    let config = AdmissionConfig {
        user_requests_per_minute: 100,
        user_requests_per_hour: 3,
        ..AdmissionConfig::default()
    };
    let (gate, _, _) = gate_with(config);
    for _ in 0..3 {
        gate.admit("u1", ActionKind::SessionMutation).await.complete().await;
    }
    let denied = gate.admit("u1", ActionKind::SessionMutation).await;
    assert_eq!(denied.decision().denied_by, Some(RateScope::UserHour));
    assert_eq!(denied.decision().retry_after_seconds, 300);
}

#[tokio::test]
async fn test_api_gate_applies_only_to_generation() {
    let (gate, _, _) = gate();
    for _ in 0..5 {
        assert!(gate.admit("u1", ActionKind::Generate).await.is_allowed());
    }
    let denied = gate.admit("u1", ActionKind::Generate).await;
    assert_eq!(denied.decision().denied_by, Some(RateScope::UserApiCall));
    assert_eq!(denied.decision().retry_after_seconds, 30);

    // Non-generation actions still have minute budget left
    assert!(gate.admit("u1", ActionKind::Upload).await.is_allowed());
}

#[tokio::test]
async fn test_global_parallel_limit_tracks_in_flight() {
    let config = AdmissionConfig { global_parallel_limit: 2, ..AdmissionConfig::default() };
    let (gate, _, _) = gate_with(config);

    let first = gate.admit("a", ActionKind::SessionMutation).await;
    let second = gate.admit("b", ActionKind::SessionMutation).await;
    assert!(first.is_allowed() && second.is_allowed());
    assert_eq!(gate.limiter().in_flight().await, 2);

    let third = gate.admit("c", ActionKind::SessionMutation).await;
    assert_eq!(third.decision().denied_by, Some(RateScope::GlobalParallel));
    assert_eq!(third.decision().retry_after_seconds, 5);

    first.complete().await;
    assert_eq!(gate.limiter().in_flight().await, 1);
    assert!(gate.admit("c", ActionKind::SessionMutation).await.is_allowed());
    second.complete().await;
}

#[tokio::test]
async fn test_dropped_permit_decrements() {
    let (gate, _, _) = gate();
    let admission = gate.admit("u1", ActionKind::Upload).await;
    assert_eq!(gate.limiter().in_flight().await, 1);
    drop(admission);
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert_eq!(gate.limiter().in_flight().await, 0);
}

#[tokio::test]
async fn test_decrement_clamps_at_zero() {
    let (gate, store, _) = gate();
    gate.limiter().decrement_in_flight(Duration::from_secs(60)).await;
    gate.limiter().decrement_in_flight(Duration::from_secs(60)).await;
    let key = CounterKey::global_parallel().store_key(&KeySpace::default());
    assert_eq!(store.get(&key).await, Ok(Some(0)));
}

#[tokio::test]
async fn test_in_flight_counter_expires() {
    let (gate, _, clock) = gate();
    let (_, permit) = gate.admit("u1", ActionKind::Upload).await.into_parts();
    // Simulate a worker that died mid-request
    std::mem::forget(permit);
    assert_eq!(gate.limiter().in_flight().await, 1);
    clock.advance(Duration::from_secs(60));
    assert_eq!(gate.limiter().in_flight().await, 0);
}

#[tokio::test]
async fn test_exempt_actions_bypass_counters() {
    let config = AdmissionConfig { user_requests_per_minute: 1, ..AdmissionConfig::default() };
    let (gate, _, _) = gate_with(config);
    for kind in [ActionKind::ReadOnly, ActionKind::StaticAsset, ActionKind::AuthFlow] {
        for _ in 0..5 {
            let admission = gate.admit("u1", kind).await;
            assert!(admission.is_allowed());
            assert!(admission.into_parts().1.is_none());
        }
    }
    assert_eq!(gate.limiter().in_flight().await, 0);
    assert!(gate.admit("u1", ActionKind::Upload).await.is_allowed());
}

#[tokio::test]
async fn test_disabled_gate_admits_everything() {
    let config = AdmissionConfig {
        enabled: false,
        user_requests_per_minute: 1,
        ..AdmissionConfig::default()
    };
    let (gate, _, _) = gate_with(config);
    for _ in 0..3 {
        assert!(gate.admit("u1", ActionKind::Generate).await.is_allowed());
    }
}

#[tokio::test]
async fn test_store_failure_fails_open() {
    let store = Arc::new(UnavailableStore::default());
    let gate = AdmissionGate::new(store.clone(), KeySpace::default(), AdmissionConfig::default());

    for kind in [ActionKind::Generate, ActionKind::Upload, ActionKind::SessionMutation] {
        for _ in 0..20 {
            let admission = gate.admit("u1", kind).await;
            assert!(admission.is_allowed());
            admission.complete().await;
        }
    }
    assert!(gate.admit_generation_call("u1").await.allowed);
    assert!(store.calls.load(Ordering::SeqCst) > 0);
}

/// Memory store whose standalone `expire` always fails.
struct ExpireFailingStore {
    inner: MemoryStore,
    expire_calls: AtomicUsize,
}

#[async_trait]
impl SharedStore for ExpireFailingStore {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
        self.inner.get(key).await
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        self.inner.incr(key).await
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        self.inner.incr_with_expiry(key, ttl).await
    }

    async fn decr(&self, key: &str) -> StoreResult<i64> {
        self.inner.decr(key).await
    }

    async fn expire(&self, _key: &str, _ttl: Duration) -> StoreResult<()> {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable { message: "EXPIRE timed out".to_string() })
    }

    async fn set(
        &self,
        key: &str,
        value: i64,
        ttl: Option<Duration>,
    ) -> StoreResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.inner.delete(key).await
    }
}

#[tokio::test]
async fn test_window_resets_when_expire_fails() {
    let clock = ManualClock::default();
    let store = Arc::new(ExpireFailingStore {
        inner: MemoryStore::with_clock(Arc::new(clock.clone())),
        expire_calls: AtomicUsize::new(0),
    });
    let gate = AdmissionGate::new(store.clone(), KeySpace::default(), AdmissionConfig::default());

    for _ in 0..10 {
        assert!(gate.admit("u1", ActionKind::Upload).await.is_allowed());
    }
    assert!(!gate.admit("u1", ActionKind::Upload).await.is_allowed());

    clock.advance(Duration::from_secs(60));
    assert!(gate.admit("u1", ActionKind::Upload).await.is_allowed());
}

#[tokio::test]
async fn test_counter_left_without_expiry_is_rearmed() {
    let (gate, store, clock) = gate();
    let key = CounterKey::new(RateScope::UserMinute, "u1").store_key(&KeySpace::default());

    // A worker died after incrementing but before arming the window
    for _ in 0..9 {
        store.incr(&key).await.ok();
    }

    assert!(gate.admit("u1", ActionKind::Upload).await.is_allowed());
    assert!(!gate.admit("u1", ActionKind::Upload).await.is_allowed());

    clock.advance(Duration::from_secs(60));
    assert!(gate.admit("u1", ActionKind::Upload).await.is_allowed());
}
