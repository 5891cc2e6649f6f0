//! Bounded TTL cache for secret rows.
//!
//! Read-through cache in front of the durable store. Entries expire after a
//! configurable TTL and the map is capped at a fixed capacity; eviction is
//! lazy (on access and insert), there is no sweeper task. Evicting an entry
//! never touches the durable row; a cache-evicted secret that has not
//! expired is still served from the database.

use crate::storage::SecretRow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Cached secret entry with its insertion time
#[derive(Debug, Clone)]
struct CacheEntry {
    row: SecretRow,
    cached_at: Instant,
}

impl CacheEntry {
    fn new(row: SecretRow) -> Self {
        Self { row, cached_at: Instant::now() }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Bounded in-memory cache keyed by token
///
/// Uses `RwLock` for thread-safe access and can be shared across async tasks.
/// The cache TTL is independent of a secret's own expiry.
#[derive(Debug, Clone)]
pub struct SecretCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    capacity: usize,
    ttl: Duration,
}

impl SecretCache {
    /// Create a new cache with the given capacity and per-entry TTL
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self { entries: Arc::new(RwLock::new(HashMap::new())), capacity, ttl }
    }

    /// Get a cached secret if present and not stale
    pub async fn get(&self, secret_key: &str) -> Option<SecretRow> {
        {
            let entries = self.entries.read().await;
            match entries.get(secret_key) {
                Some(entry) if !entry.is_stale(self.ttl) => {
                    debug!(secret_key = %secret_key, "Cache hit");
                    return Some(entry.row.clone());
                }
                Some(_) => debug!(secret_key = %secret_key, "Cache entry stale"),
                None => return None,
            }
        }

        // Drop the stale entry under a write lock; re-check since another
        // task may have refreshed it between the two lock acquisitions.
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get(secret_key) {
            if !entry.is_stale(self.ttl) {
                return Some(entry.row.clone());
            }
            entries.remove(secret_key);
        }
        None
    }

    /// Insert a secret, evicting stale entries and then the oldest entry when
    /// the cache is at capacity
    pub async fn insert(&self, row: SecretRow) {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&row.secret_key) && entries.len() >= self.capacity {
            entries.retain(|_, entry| !entry.is_stale(self.ttl));

            while entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.cached_at)
                    .map(|(key, _)| key.clone());
                match oldest {
                    Some(key) => {
                        debug!(secret_key = %key, "Evicting oldest cache entry at capacity");
                        entries.remove(&key);
                    }
                    None => break,
                }
            }
        }

        entries.insert(row.secret_key.clone(), CacheEntry::new(row));
    }

    /// Remove a cache entry
    pub async fn remove(&self, secret_key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(secret_key);
    }

    /// Number of entries currently cached
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
