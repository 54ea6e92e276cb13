//! Mapping storage backends with TTL support.
//!
//! A redaction mapping (original identifier → replacement) is persisted
//! under its mapping id so a caller holding the id can later resolve
//! replacements back to originals. Two interchangeable backends exist:
//! a process-local table and a Redis-backed remote store. The backend
//! is selected once at startup behind `Arc<dyn MappingStore>`.

pub mod error;
pub mod memory;
pub mod redis;

pub use error::{StorageError, StorageResult};
pub use memory::InMemoryMappingStore;
pub use self::redis::RedisMappingStore;

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

/// The original → replacement correspondence produced by one redact call.
pub type Mapping = HashMap<String, String>;

/// Uniform mapping store interface.
///
/// `startup` and `shutdown` are invoked exactly once each around the
/// store's active period; no background work may outlive `shutdown`.
#[async_trait]
pub trait MappingStore: Send + Sync {
    /// Returns the backend name.
    fn name(&self) -> &str;

    /// Persists a mapping under `id`, overwriting any previous entry.
    async fn save(&self, id: Uuid, mapping: &Mapping) -> StorageResult<()>;

    /// Retrieves a mapping. Expired entries are treated as absent.
    async fn get(&self, id: Uuid) -> StorageResult<Option<Mapping>>;

    /// Deletes a mapping, reporting whether it existed.
    async fn delete(&self, id: Uuid) -> StorageResult<bool>;

    /// Number of live mappings. Approximate on the remote backend; use
    /// only for readiness probes, never correctness-sensitive logic.
    async fn count(&self) -> StorageResult<usize>;

    /// Starts background work (eviction sweeps, connectivity checks).
    async fn startup(&self) -> StorageResult<()>;

    /// Cancels background work and releases resources.
    async fn shutdown(&self) -> StorageResult<()>;
}
