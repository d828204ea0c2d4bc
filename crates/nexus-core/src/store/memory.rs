//! In-process store. Authoritative only for a single worker; used in
//! development and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use super::{SharedStore, StoreResult};
use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy)]
struct Entry {
    value: i64,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { entries: DashMap::new(), clock }
    }

    /// Drop expired entries. Reads already ignore them; this only reclaims memory.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!("Memory store dropped {} expired keys", removed);
        }
        removed
    }

    fn add(&self, key: &str, delta: i64, ttl: Option<Duration>) -> i64 {
        let now = self.clock.now();
        let mut entry =
            self.entries.entry(key.to_string()).or_insert(Entry { value: 0, expires_at: None });
        if !entry.is_live(now) {
            *entry = Entry { value: 0, expires_at: None };
        }
        entry.value = entry.value.saturating_add(delta);
        if let (Some(ttl), None) = (ttl, entry.expires_at) {
            entry.expires_at = Some(self.ttl_to_deadline(ttl));
        }
        entry.value
    }

    fn ttl_to_deadline(&self, ttl: Duration) -> DateTime<Utc> {
        let delta = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let now = self.clock.now();
        now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
        let now = self.clock.now();
        Ok(self.entries.get(key).filter(|e| e.is_live(now)).map(|e| e.value))
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        Ok(self.add(key, 1, None))
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        Ok(self.add(key, 1, Some(ttl)))
    }

    async fn decr(&self, key: &str) -> StoreResult<i64> {
        Ok(self.add(key, -1, None))
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let now = self.clock.now();
        let deadline = self.ttl_to_deadline(ttl);
        if let Some(mut entry) = self.entries.get_mut(key) {
            if entry.is_live(now) {
                entry.expires_at = Some(deadline);
            }
        }
        Ok(())
    }

    async fn set(&self, key: &str, value: i64, ttl: Option<Duration>) -> StoreResult<()> {
        let expires_at = ttl.map(|t| self.ttl_to_deadline(t));
        self.entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
