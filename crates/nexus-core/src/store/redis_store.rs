//! Redis-backed store shared by every worker process.
//!
//! INCR/DECR are atomic on the server, which is strictly better than the
//! best-effort read-then-write the admission layer is designed to tolerate.
//! Rate counters are incremented and armed in one MULTI/EXEC block, so a
//! crash between the two cannot leave a counter without expiry.

use async_trait::async_trait;
use nexus_types::StoreError;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;

use super::{SharedStore, StoreResult};
use crate::error::AppResult;

fn unavailable(e: redis::RedisError) -> StoreError {
    StoreError::Unavailable { message: e.to_string() }
}

/// Seconds for EXPIRE/SET EX. Redis rejects zero, so round up to one.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

fn ttl_secs_i64(ttl: Duration) -> i64 {
    i64::try_from(ttl_secs(ttl)).unwrap_or(i64::MAX)
}

#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            tracing::error!("Failed to create Redis client: {e}");
            e
        })?;
        let conn = client.get_multiplexed_async_connection().await.map_err(|e| {
            tracing::error!("Failed to connect to Redis: {e}");
            e
        })?;
        tracing::info!("Connected to shared Redis store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<i64>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(unavailable)
    }

    async fn incr(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        conn.incr(key, 1_i64).await.map_err(unavailable)
    }

    /// `MULTI; INCR; EXPIRE key ttl NX; EXEC` (`NX` needs Redis 7).
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        let (value, _armed): (i64, bool) = redis::pipe()
            .atomic()
            .incr(key, 1_i64)
            .expire(key, ttl_secs_i64(ttl))
            .arg("NX")
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(value)
    }

    async fn decr(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.conn.clone();
        conn.decr(key, 1_i64).await.map_err(unavailable)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: bool = conn.expire(key, ttl_secs_i64(ttl)).await.map_err(unavailable)?;
        Ok(())
    }

    async fn set(&self, key: &str, value: i64, ttl: Option<Duration>) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => conn.set_ex(key, value, ttl_secs(ttl)).await.map_err(unavailable),
            None => conn.set(key, value).await.map_err(unavailable),
        }
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let _: i64 = conn.del(key).await.map_err(unavailable)?;
        Ok(())
    }
}
