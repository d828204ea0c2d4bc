use nexus_types::RateScope;

use crate::store::KeySpace;

/// Actor used for counters that are not per-user.
pub const GLOBAL_ACTOR: &str = "all";

/// Identifies one rate counter: a scope and the actor it counts.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CounterKey {
    scope: RateScope,
    actor: String,
}

impl CounterKey {
    pub fn new(scope: RateScope, actor: &str) -> Self {
        Self { scope, actor: actor.to_string() }
    }

    /// The deployment-wide in-flight counter.
    pub fn global_parallel() -> Self {
        Self::new(RateScope::GlobalParallel, GLOBAL_ACTOR)
    }

    pub fn scope(&self) -> RateScope {
        self.scope
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    pub fn store_key(&self, keys: &KeySpace) -> String {
        keys.rate(self.scope.as_str(), &self.actor)
    }
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scope, self.actor)
    }
}
