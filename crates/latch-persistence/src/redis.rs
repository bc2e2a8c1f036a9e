//! Redis backend for the lock store
//!
//! One lock is one Redis hash, auto-expired by the server via `EXPIRE`. The
//! base capabilities map onto plain commands; the conditional primitives run
//! as Lua scripts so the existence/ownership check and the mutation happen
//! server-side in a single atomic step.
//!
//! Every round trip is bounded by the configured operation timeout. A hung
//! call surfaces as a store error, never as an indefinite wait.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, RedisResult, Script};
use anyhow::Context;
use async_trait::async_trait;
use tracing::debug;

use crate::store::{DeleteOutcome, LockStore};

/// Creates the record with its field set and expiry iff the key is absent.
/// ARGV[1] = ttl seconds, ARGV[2..] = alternating field/value pairs.
const CREATE_IF_ABSENT_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
for i = 2, #ARGV, 2 do
  redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
end
redis.call('EXPIRE', KEYS[1], ARGV[1])
return 1
"#;

/// Deletes the record iff ARGV[1] (the owner field) still holds ARGV[2].
/// Returns 1 deleted, 0 owner mismatch, -1 no record.
const DELETE_IF_OWNER_SCRIPT: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return -1
end
if redis.call('HGET', KEYS[1], ARGV[1]) ~= ARGV[2] then
  return 0
end
redis.call('DEL', KEYS[1])
return 1
"#;

/// Lock store backed by a shared Redis instance.
///
/// `ConnectionManager` multiplexes safely across concurrent in-flight
/// operations, so one store handles all requests without in-process locking.
pub struct RedisLockStore {
    conn: ConnectionManager,
    op_timeout: Duration,
    create_script: Script,
    delete_script: Script,
}

impl RedisLockStore {
    pub fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self {
            conn,
            op_timeout,
            create_script: Script::new(CREATE_IF_ABSENT_SCRIPT),
            delete_script: Script::new(DELETE_IF_OWNER_SCRIPT),
        }
    }

    /// Open a client for `url` and establish the managed connection.
    pub async fn connect(url: &str, op_timeout: Duration) -> anyhow::Result<Self> {
        let client =
            ::redis::Client::open(url).with_context(|| format!("invalid redis url '{}'", url))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| anyhow::anyhow!("failed to connect to redis at {}: {}", url, e))?;
        debug!(url = %url, "Connected to redis");
        Ok(Self::new(conn, op_timeout))
    }

    /// Run one store round trip under the operation timeout.
    async fn bounded<T>(
        &self,
        op: &str,
        fut: impl Future<Output = RedisResult<T>>,
    ) -> anyhow::Result<T> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(|e| anyhow::anyhow!("redis {} failed: {}", op, e)),
            Err(_) => Err(anyhow::anyhow!(
                "redis {} timed out after {:?}",
                op,
                self.op_timeout
            )),
        }
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        let mut conn = self.conn.clone();
        self.bounded("EXISTS", async move { conn.exists(key).await })
            .await
    }

    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("HSET", async move { conn.hset_multiple(key, fields).await })
            .await
    }

    async fn set_expiry(&self, key: &str, seconds: u64) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("EXPIRE", async move { conn.expire(key, seconds as i64).await })
            .await
    }

    async fn get_field(&self, key: &str, field: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.conn.clone();
        self.bounded("HGET", async move { conn.hget(key, field).await })
            .await
    }

    async fn get_all_fields(&self, key: &str) -> anyhow::Result<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        self.bounded("HGETALL", async move { conn.hgetall(key).await })
            .await
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.conn.clone();
        self.bounded("DEL", async move { conn.del(key).await }).await
    }

    async fn keys_by_prefix(&self, prefix: &str) -> anyhow::Result<Vec<String>> {
        let pattern = format!("{}*", prefix);
        let mut conn = self.conn.clone();
        self.bounded("KEYS", async move { conn.keys(pattern).await })
            .await
    }

    async fn create_if_absent(
        &self,
        key: &str,
        fields: &[(String, String)],
        ttl_seconds: u64,
    ) -> anyhow::Result<bool> {
        let mut invocation = self.create_script.prepare_invoke();
        invocation.key(key).arg(ttl_seconds);
        for (field, value) in fields {
            invocation.arg(field.as_str()).arg(value.as_str());
        }

        let mut conn = self.conn.clone();
        let created: i64 = self
            .bounded("conditional create", invocation.invoke_async(&mut conn))
            .await?;
        Ok(created == 1)
    }

    async fn delete_if_owner(
        &self,
        key: &str,
        owner_field: &str,
        expected_owner: &str,
    ) -> anyhow::Result<DeleteOutcome> {
        let mut invocation = self.delete_script.prepare_invoke();
        invocation.key(key).arg(owner_field).arg(expected_owner);

        let mut conn = self.conn.clone();
        let deleted: i64 = self
            .bounded("conditional delete", invocation.invoke_async(&mut conn))
            .await?;
        Ok(match deleted {
            1 => DeleteOutcome::Deleted,
            0 => DeleteOutcome::OwnerMismatch,
            _ => DeleteOutcome::Missing,
        })
    }
}
