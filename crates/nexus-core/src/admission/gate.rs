//! The admission gate and the in-flight permit it hands out.

use nexus_types::{ActionKind, AdmissionConfig, AdmissionDecision, RateScope};
use std::sync::Arc;
use std::time::Duration;

use super::key::CounterKey;
use super::limiter::{RateDecision, RateLimiter};
use crate::prometheus;
use crate::store::{KeySpace, SharedStore};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Holds one slot of the global in-flight counter.
///
/// Call [`release`](Self::release) when the downstream action completes,
/// success or failure. A permit dropped without release (panic, cancelled
/// future) decrements on the current Tokio runtime instead.
pub struct InFlightPermit {
    limiter: RateLimiter,
    ttl: Duration,
    released: bool,
}

impl InFlightPermit {
    pub async fn release(mut self) {
        self.released = true;
        self.limiter.decrement_in_flight(self.ttl).await;
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let limiter = self.limiter.clone();
                let ttl = self.ttl;
                handle.spawn(async move {
                    limiter.decrement_in_flight(ttl).await;
                });
            },
            Err(_) => {
                tracing::warn!("In-flight permit dropped outside a runtime; counter drains on expiry");
            },
        }
    }
}

/// Outcome of [`AdmissionGate::admit`]: the decision, plus the in-flight
/// permit when a counted request was admitted.
pub struct Admission {
    decision: AdmissionDecision,
    permit: Option<InFlightPermit>,
}

impl Admission {
    fn exempt() -> Self {
        Self { decision: AdmissionDecision::allow(), permit: None }
    }

    fn denied(scope: RateScope) -> Self {
        Self { decision: AdmissionDecision::deny(scope), permit: None }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision.allowed
    }

    pub fn decision(&self) -> &AdmissionDecision {
        &self.decision
    }

    pub fn into_parts(self) -> (AdmissionDecision, Option<InFlightPermit>) {
        (self.decision, self.permit)
    }

    /// Mark the admitted action as finished.
    pub async fn complete(self) {
        if let Some(permit) = self.permit {
            permit.release().await;
        }
    }
}

pub struct AdmissionGate {
    limiter: RateLimiter,
    config: AdmissionConfig,
}

impl AdmissionGate {
    pub fn new(store: Arc<dyn SharedStore>, keys: KeySpace, config: AdmissionConfig) -> Self {
        Self { limiter: RateLimiter::new(store, keys), config }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Evaluate every gate that applies to `kind` for `actor`.
    pub async fn admit(&self, actor: &str, kind: ActionKind) -> Admission {
        if !self.config.enabled || kind.is_exempt() {
            return Admission::exempt();
        }

        if !self
            .limiter
            .is_below(&CounterKey::global_parallel(), self.config.global_parallel_limit)
            .await
        {
            return self.deny(actor, RateScope::GlobalParallel);
        }

        let per_user = [
            (RateScope::UserMinute, self.config.user_requests_per_minute, MINUTE),
            (RateScope::UserHour, self.config.user_requests_per_hour, HOUR),
        ];
        for (scope, limit, window) in per_user {
            let key = CounterKey::new(scope, actor);
            if let RateDecision::Denied { .. } =
                self.limiter.check_and_admit(&key, limit, window).await
            {
                return self.deny(actor, scope);
            }
        }

        if kind.is_generation() {
            let decision = self.admit_generation_call(actor).await;
            if !decision.allowed {
                return Admission { decision, permit: None };
            }
        }

        let ttl = Duration::from_secs(self.config.global_parallel_ttl_secs);
        self.limiter.increment_in_flight(ttl).await;
        prometheus::record_admission(true, None);
        Admission {
            decision: AdmissionDecision::allow(),
            permit: Some(InFlightPermit { limiter: self.limiter.clone(), ttl, released: false }),
        }
    }

    /// Gate 4 alone: the per-user AI call budget.
    pub async fn admit_generation_call(&self, actor: &str) -> AdmissionDecision {
        if !self.config.enabled {
            return AdmissionDecision::allow();
        }
        let key = CounterKey::new(RateScope::UserApiCall, actor);
        match self.limiter.check_and_admit(&key, self.config.api_calls_per_minute, MINUTE).await {
            RateDecision::Admitted => AdmissionDecision::allow(),
            RateDecision::Denied { .. } => {
                self.deny(actor, RateScope::UserApiCall).decision
            },
        }
    }

    fn deny(&self, actor: &str, scope: RateScope) -> Admission {
        tracing::warn!(actor = actor, scope = %scope, "Request denied by rate limit");
        prometheus::record_admission(false, Some(scope.as_str()));
        Admission::denied(scope)
    }
}
