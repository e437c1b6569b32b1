//! Response cache.
//!
//! Maps `(query, retrieved context)` to a previously generated answer with a
//! time-to-live and a bound on the number of entries.
//!
//! # Key derivation
//!
//! The key is the SHA-256 hex digest of the query text concatenated with the
//! JSON-serialized, ordered list of context contents. A change in the
//! retrieved passages therefore invalidates the cached answer for a query.
//!
//! # Validity and eviction
//!
//! - An entry is valid while `now - timestamp < ttl`.
//! - After a store, if the backend holds more than `max_entries`, the
//!   oldest entries are evicted until exactly `max_entries` remain.
//! - Backend errors are logged and treated as a miss (lookup) or a no-op
//!   (store). They never fail the calling request.
//!
//! Storage sits behind the [`KeyValueStore`] trait so that an in-memory or
//! file-backed backend can be swapped without touching callers.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::models::ContextItem;

/// One cached answer, as persisted by backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub query: String,
    /// Creation time, Unix seconds.
    pub timestamp: f64,
    pub response: String,
}

/// Key-value storage for cache entries.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or overwrite the entry for `key`.
    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<()>;

    /// Remove the `n` oldest entries. Returns the number removed.
    async fn evict_oldest(&self, n: usize) -> Result<usize>;

    async fn len(&self) -> Result<usize>;

    /// Remove every entry. Returns the number removed.
    async fn clear(&self) -> Result<usize>;
}

/// Derive the cache key for a query and its ordered context.
pub fn cache_key(query: &str, context: &[ContextItem]) -> String {
    let contents: Vec<&str> = context.iter().map(|c| c.content.as_str()).collect();
    let serialized = serde_json::to_string(&contents).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(serialized.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Current time in Unix seconds.
pub fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// TTL- and size-bounded answer cache over a [`KeyValueStore`].
pub struct ResponseCache<K> {
    store: K,
    ttl: Duration,
    max_entries: usize,
}

impl<K: KeyValueStore> ResponseCache<K> {
    pub fn new(store: K, ttl: Duration, max_entries: usize) -> Self {
        Self {
            store,
            ttl,
            max_entries,
        }
    }

    pub fn store(&self) -> &K {
        &self.store
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Return the cached answer for `key`, or `None` on miss, expiry, or error.
    pub async fn lookup(&self, key: &str) -> Option<String> {
        self.lookup_at(key, unix_now()).await
    }

    pub async fn lookup_at(&self, key: &str, now: f64) -> Option<String> {
        let entry = match self.store.get(key).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "cache read failed; treating as miss");
                return None;
            }
        };

        if now - entry.timestamp >= self.ttl.as_secs_f64() {
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        Some(entry.response)
    }

    /// Store `response` under `key`, then enforce the entry bound.
    pub async fn insert(&self, key: &str, query: &str, response: &str) {
        self.insert_at(key, query, response, unix_now()).await
    }

    pub async fn insert_at(&self, key: &str, query: &str, response: &str, now: f64) {
        let entry = CacheEntry {
            query: query.to_string(),
            timestamp: now,
            response: response.to_string(),
        };
        if let Err(e) = self.store.put(key, &entry).await {
            tracing::warn!(key, error = %e, "cache write failed");
            return;
        }

        match self.store.len().await {
            Ok(len) if len > self.max_entries => {
                let excess = len - self.max_entries;
                match self.store.evict_oldest(excess).await {
                    Ok(removed) => tracing::debug!(removed, "evicted old cache entries"),
                    Err(e) => tracing::warn!(error = %e, "cache eviction failed"),
                }
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "cache size check failed"),
        }
    }
}
