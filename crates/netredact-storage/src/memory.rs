//! Process-local mapping store.

use crate::{Mapping, MappingStore, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

struct Entry {
    mapping: Mapping,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory mapping store with TTL eviction.
///
/// Expired entries are dropped lazily on `get` and proactively by a
/// sweep task that runs between `startup` and `shutdown`. With no TTL
/// configured, entries persist until deleted and no sweeper is started.
pub struct InMemoryMappingStore {
    ttl: Option<Duration>,
    cleanup_interval: Duration,
    entries: Arc<Mutex<HashMap<Uuid, Entry>>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl InMemoryMappingStore {
    #[must_use]
    pub fn new(ttl: Option<Duration>, cleanup_interval: Duration) -> Self {
        Self {
            ttl,
            cleanup_interval,
            entries: Arc::new(Mutex::new(HashMap::new())),
            sweeper: Mutex::new(None),
        }
    }

    /// Drops every entry past its expiry instant.
    async fn sweep(entries: &Mutex<HashMap<Uuid, Entry>>) {
        let mut table = entries.lock().await;
        let now = Instant::now();
        let before = table.len();
        table.retain(|_, entry| !entry.expired(now));
        let evicted = before - table.len();
        if evicted > 0 {
            debug!(evicted, "evicted expired mappings");
        }
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, id: Uuid, mapping: &Mapping) -> StorageResult<()> {
        let expires_at = self.ttl.map(|ttl| Instant::now() + ttl);
        self.entries.lock().await.insert(
            id,
            Entry {
                mapping: mapping.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Mapping>> {
        let mut table = self.entries.lock().await;
        let expired = match table.get(&id) {
            None => return Ok(None),
            Some(entry) => entry.expired(Instant::now()),
        };
        if expired {
            table.remove(&id);
            return Ok(None);
        }
        Ok(table.get(&id).map(|entry| entry.mapping.clone()))
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        Ok(self.entries.lock().await.remove(&id).is_some())
    }

    async fn count(&self) -> StorageResult<usize> {
        let table = self.entries.lock().await;
        let now = Instant::now();
        Ok(table.values().filter(|entry| !entry.expired(now)).count())
    }

    async fn startup(&self) -> StorageResult<()> {
        let mut sweeper = self.sweeper.lock().await;
        if sweeper.is_none() && self.ttl.is_some() {
            let entries = Arc::clone(&self.entries);
            let interval = self.cleanup_interval;
            *sweeper = Some(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick completes immediately.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    Self::sweep(&entries).await;
                }
            }));
        }
        Ok(())
    }

    async fn shutdown(&self) -> StorageResult<()> {
        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.entries.lock().await.clear();
        Ok(())
    }
}
