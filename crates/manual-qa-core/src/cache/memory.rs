//! In-memory [`KeyValueStore`], ordered by last write.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use super::{CacheEntry, KeyValueStore};

struct Slot {
    entry: CacheEntry,
    /// Monotonic write sequence; lower is older.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    next_seq: u64,
}

/// Cache backend holding entries in a `HashMap`.
///
/// Overwriting a key refreshes its age, mirroring file modification time.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    inner: RwLock<Inner>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let inner = self.inner.read().unwrap();
        Ok(inner.slots.get(key).map(|s| s.entry.clone()))
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        let mut inner = self.inner.write().unwrap();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.slots.insert(
            key.to_string(),
            Slot {
                entry: entry.clone(),
                seq,
            },
        );
        Ok(())
    }

    async fn evict_oldest(&self, n: usize) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let mut by_age: Vec<(u64, String)> = inner
            .slots
            .iter()
            .map(|(k, s)| (s.seq, k.clone()))
            .collect();
        by_age.sort();
        let victims: Vec<String> = by_age.into_iter().take(n).map(|(_, k)| k).collect();
        for k in &victims {
            inner.slots.remove(k);
        }
        Ok(victims.len())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.inner.read().unwrap().slots.len())
    }

    async fn clear(&self) -> Result<usize> {
        let mut inner = self.inner.write().unwrap();
        let n = inner.slots.len();
        inner.slots.clear();
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(r: &str) -> CacheEntry {
        CacheEntry {
            query: "q".to_string(),
            timestamp: 0.0,
            response: r.to_string(),
        }
    }

    #[tokio::test]
    async fn test_overwrite_refreshes_age() {
        let store = InMemoryKeyValueStore::new();
        store.put("a", &entry("1")).await.unwrap();
        store.put("b", &entry("2")).await.unwrap();
        store.put("a", &entry("3")).await.unwrap();
        assert_eq!(store.evict_oldest(1).await.unwrap(), 1);
        assert!(store.get("b").await.unwrap().is_none());
        assert_eq!(store.get("a").await.unwrap().unwrap().response, "3");
    }

    #[tokio::test]
    async fn test_evict_more_than_present() {
        let store = InMemoryKeyValueStore::new();
        store.put("a", &entry("1")).await.unwrap();
        assert_eq!(store.evict_oldest(5).await.unwrap(), 1);
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryKeyValueStore::new();
        store.put("a", &entry("1")).await.unwrap();
        store.put("b", &entry("2")).await.unwrap();
        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.len().await.unwrap(), 0);
    }
}
