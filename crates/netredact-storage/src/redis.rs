//! Redis-backed mapping store.

use crate::{Mapping, MappingStore, StorageResult};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use uuid::Uuid;

/// Key namespace all mappings live under.
pub const DEFAULT_NAMESPACE: &str = "redact_mappings";

/// Remote mapping store delegating expiry to Redis.
///
/// Mappings are stored as compact JSON under `"{namespace}:{id}"` with
/// TTL applied via `SET ... EX`, so no local expiry bookkeeping exists.
pub struct RedisMappingStore {
    conn: ConnectionManager,
    ttl: Option<Duration>,
    namespace: String,
}

impl RedisMappingStore {
    /// Connects to the given Redis URL.
    pub async fn connect(url: &str, ttl: Option<Duration>) -> StorageResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self {
            conn,
            ttl,
            namespace: DEFAULT_NAMESPACE.to_string(),
        })
    }

    /// Overrides the key namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    fn key(&self, id: Uuid) -> String {
        format!("{}:{}", self.namespace, id)
    }
}

#[async_trait]
impl MappingStore for RedisMappingStore {
    fn name(&self) -> &str {
        "redis"
    }

    async fn save(&self, id: Uuid, mapping: &Mapping) -> StorageResult<()> {
        let payload = serde_json::to_string(mapping)?;
        let mut conn = self.conn.clone();
        match self.ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(self.key(id), payload, ttl.as_secs()).await?;
            }
            None => {
                let _: () = conn.set(self.key(id), payload).await?;
            }
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Mapping>> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn.get(self.key(id)).await?;
        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let mut conn = self.conn.clone();
        let removed: u64 = conn.del(self.key(id)).await?;
        Ok(removed > 0)
    }

    /// Cursor scan over the namespace. Approximate under concurrent
    /// mutation and potentially several round trips; readiness probes
    /// are its only intended consumer.
    async fn count(&self) -> StorageResult<usize> {
        let mut conn = self.conn.clone();
        let pattern = format!("{}:*", self.namespace);
        let mut cursor: u64 = 0;
        let mut total = 0usize;
        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await?;
            total += keys.len();
            if next == 0 {
                break;
            }
            cursor = next;
        }
        Ok(total)
    }

    async fn startup(&self) -> StorageResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn shutdown(&self) -> StorageResult<()> {
        // The connection manager closes its connections on drop; there
        // is no explicit close command to issue.
        Ok(())
    }
}
