//! File-backed [`KeyValueStore`]: one `<key>.json` file per entry.
//!
//! Age is the file modification time; ties are broken by file name.
//! Files without the `.json` extension are ignored.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use manual_qa_core::cache::{CacheEntry, KeyValueStore};

pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Entry files with their modification times. Missing dir → empty.
    async fn entries(&self) -> Result<Vec<(SystemTime, PathBuf)>> {
        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", self.dir.display()))
            }
        };

        let mut out = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let modified = entry
                .metadata()
                .await?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            out.push((modified, path));
        }
        Ok(out)
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        let entry = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt cache file {}", path.display()))?;
        Ok(Some(entry))
    }

    async fn put(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let json = serde_json::to_string(entry)?;
        tokio::fs::write(self.path_for(key), json).await?;
        Ok(())
    }

    async fn evict_oldest(&self, n: usize) -> Result<usize> {
        let mut entries = self.entries().await?;
        entries.sort();
        let mut removed = 0;
        for (_, path) in entries.into_iter().take(n) {
            tokio::fs::remove_file(&path).await?;
            tracing::debug!(path = %path.display(), "evicted cache entry");
            removed += 1;
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries().await?.len())
    }

    async fn clear(&self) -> Result<usize> {
        let entries = self.entries().await?;
        for (_, path) in &entries {
            tokio::fs::remove_file(path).await?;
        }
        Ok(entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manual_qa_core::cache::ResponseCache;
    use std::time::Duration;
    use tempfile::TempDir;

    fn entry(response: &str) -> CacheEntry {
        CacheEntry {
            query: "q".to_string(),
            timestamp: 0.0,
            response: response.to_string(),
        }
    }

    fn set_age(store: &FileKeyValueStore, key: &str, secs_ago: u64) {
        let file = std::fs::File::options()
            .write(true)
            .open(store.path_for(key))
            .unwrap();
        file.set_modified(SystemTime::now() - Duration::from_secs(secs_ago))
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(tmp.path().join("cache"));
        assert!(store.get("k").await.unwrap().is_none());
        store.put("k", &entry("answer")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(entry("answer")));
        assert!(tmp.path().join("cache/k.json").exists());
    }

    #[tokio::test]
    async fn test_evicts_oldest_by_mtime() {
        let tmp = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(tmp.path());
        for key in ["a", "b", "c"] {
            store.put(key, &entry(key)).await.unwrap();
        }
        set_age(&store, "b", 300);
        set_age(&store, "a", 200);
        set_age(&store, "c", 100);

        assert_eq!(store.evict_oldest(2).await.unwrap(), 2);
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ignores_foreign_files_and_clears() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "keep").unwrap();
        let store = FileKeyValueStore::new(tmp.path());
        store.put("x", &entry("1")).await.unwrap();
        store.put("y", &entry("2")).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(store.clear().await.unwrap(), 2);
        assert_eq!(store.len().await.unwrap(), 0);
        assert!(tmp.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_a_miss() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), "{not json").unwrap();
        let cache = ResponseCache::new(
            FileKeyValueStore::new(tmp.path()),
            Duration::from_secs(60),
            10,
        );
        assert!(cache.store().get("bad").await.is_err());
        assert!(cache.lookup("bad").await.is_none());
    }

    #[tokio::test]
    async fn test_bound_enforced_on_disk() {
        let tmp = TempDir::new().unwrap();
        let cache = ResponseCache::new(
            FileKeyValueStore::new(tmp.path()),
            Duration::from_secs(60),
            2,
        );
        for key in ["k1", "k2", "k3"] {
            cache.insert(key, "q", "r").await;
        }
        assert_eq!(cache.store().len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(tmp.path().join("never-created"));
        assert_eq!(store.len().await.unwrap(), 0);
        assert_eq!(store.evict_oldest(3).await.unwrap(), 0);
    }
}
