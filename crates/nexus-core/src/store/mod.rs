//! Shared key-value store for rate counters and the exhaustion flag.
//!
//! Every worker process talks to the same store, so admission decisions and
//! exhaustion state hold across the whole deployment. Updates are
//! best-effort: a read-then-write race may lose an increment, which the
//! admission layer tolerates.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  SharedStore (trait)                          │
//! │  ├── MemoryStore: DashMap + Clock (one node)  │
//! │  └── RedisStore:  INCR/DECR/EXPIRE (cluster)  │
//! └──────────────────────────────────────────────┘
//! ```

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

use async_trait::async_trait;
use nexus_types::StoreError;
use std::time::Duration;

pub type StoreResult<T> = Result<T, StoreError>;

/// Integer key-value store with per-key expiry.
///
/// A missing or expired key reads as `None`, which callers treat as zero.
#[async_trait]
pub trait SharedStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>>;

    /// Increment by one, creating the key at zero (without expiry) if absent.
    async fn incr(&self, key: &str) -> StoreResult<i64>;

    /// Increment by one and arm `ttl` if the key has no expiry yet, as a
    /// single store operation. An existing expiry is left untouched.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> StoreResult<i64>;

    /// Decrement by one, creating the key at zero (without expiry) if absent.
    async fn decr(&self, key: &str) -> StoreResult<i64>;

    /// Set the key to expire `ttl` from now. No-op for a missing key.
    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()>;

    async fn set(&self, key: &str, value: i64, ttl: Option<Duration>) -> StoreResult<()>;

    async fn delete(&self, key: &str) -> StoreResult<()>;
}

/// Key layout inside the store.
#[derive(Debug, Clone)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    /// `{prefix}:rate:{scope}:{actor}`
    pub fn rate(&self, scope: &str, actor: &str) -> String {
        format!("{}:rate:{}:{}", self.prefix, scope, actor)
    }

    /// `{prefix}:cascade:exhausted_at`
    pub fn exhaustion(&self) -> String {
        format!("{}:cascade:exhausted_at", self.prefix)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("nexus")
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose every call fails, counting the attempts.
    #[derive(Default)]
    pub(crate) struct UnavailableStore {
        pub(crate) calls: AtomicUsize,
    }

    impl UnavailableStore {
        fn fail<T>(&self) -> StoreResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable { message: "connection refused".to_string() })
        }
    }

    #[async_trait]
    impl SharedStore for UnavailableStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<i64>> {
            self.fail()
        }

        async fn incr(&self, _key: &str) -> StoreResult<i64> {
            self.fail()
        }

        async fn incr_with_expiry(&self, _key: &str, _ttl: Duration) -> StoreResult<i64> {
            self.fail()
        }

        async fn decr(&self, _key: &str) -> StoreResult<i64> {
            self.fail()
        }

        async fn expire(&self, _key: &str, _ttl: Duration) -> StoreResult<()> {
            self.fail()
        }

        async fn set(&self, _key: &str, _value: i64, _ttl: Option<Duration>) -> StoreResult<()> {
            self.fail()
        }

        async fn delete(&self, _key: &str) -> StoreResult<()> {
            self.fail()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let keys = KeySpace::new("nx");
        assert_eq!(keys.rate("user_minute", "u1"), "nx:rate:user_minute:u1");
        assert_eq!(keys.exhaustion(), "nx:cascade:exhausted_at");
    }
}
