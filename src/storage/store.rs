//! Unified secret store: durable repository plus read-through cache.
//!
//! Callers never see the cache and the database as two systems. `put` writes
//! durably before caching, `get` reads through, and `delete` removes from
//! both, reporting whether this caller removed the durable row.

use crate::config::CacheConfig;
use crate::errors::Result;
use crate::storage::{DbPool, NewSecret, SecretCache, SecretRepository, SecretRow};
use tracing::debug;
use uuid::Uuid;

/// Keyed secret storage with a bounded TTL cache in front of the database
#[derive(Debug, Clone)]
pub struct SecretStore {
    repository: SecretRepository,
    cache: SecretCache,
}

impl SecretStore {
    /// Create a store over the given pool with the configured cache bounds
    pub fn new(pool: DbPool, cache_config: &CacheConfig) -> Self {
        Self {
            repository: SecretRepository::new(pool),
            cache: SecretCache::new(cache_config.capacity, cache_config.ttl()),
        }
    }

    /// Persist a new secret and return the stored row with its fresh token
    ///
    /// The cache is only updated after the durable write succeeds, so a failed
    /// insert never leaves a phantom cache entry.
    pub async fn put(&self, secret: NewSecret) -> Result<SecretRow> {
        let secret_key = Uuid::new_v4().to_string();
        let row = self.repository.insert(&secret_key, &secret).await?;
        self.cache.insert(row.clone()).await;
        Ok(row)
    }

    /// Look up a secret by token, populating the cache on a durable-store hit
    ///
    /// Pure read: store contents are unchanged. Destruction is the caller's
    /// responsibility via [`SecretStore::delete`].
    pub async fn get(&self, secret_key: &str) -> Result<Option<SecretRow>> {
        if let Some(row) = self.cache.get(secret_key).await {
            return Ok(Some(row));
        }

        debug!(secret_key = %secret_key, "Cache miss, reading durable store");
        match self.repository.fetch(secret_key).await? {
            Some(row) => {
                self.cache.insert(row.clone()).await;
                Ok(Some(row))
            }
            None => Ok(None),
        }
    }

    /// Remove a secret from cache and durable store
    ///
    /// Returns whether a durable row was removed by this call. Idempotent;
    /// absence is signaled via `get`, never as a delete error.
    pub async fn delete(&self, secret_key: &str) -> Result<bool> {
        self.cache.remove(secret_key).await;
        self.repository.delete(secret_key).await
    }

    /// Direct repository access for durable-state inspection
    pub fn repository(&self) -> &SecretRepository {
        &self.repository
    }

    /// Direct cache access, used by tests to simulate eviction
    pub fn cache(&self) -> &SecretCache {
        &self.cache
    }
}
