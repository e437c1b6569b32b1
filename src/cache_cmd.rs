//! `cache stats` and `cache clear`.

use anyhow::Result;

use manual_qa_core::cache::KeyValueStore;

use crate::config::Config;
use crate::file_cache::FileKeyValueStore;

pub async fn run_cache_stats(config: &Config) -> Result<()> {
    let store = FileKeyValueStore::new(&config.cache.dir);
    let entries = store.len().await?;
    println!("cache {}", store.dir().display());
    println!("  enabled: {}", config.cache.enabled);
    println!("  entries: {} / {}", entries, config.cache.size);
    println!("  ttl: {}s", config.cache.ttl_secs);
    Ok(())
}

pub async fn run_cache_clear(config: &Config) -> Result<()> {
    let store = FileKeyValueStore::new(&config.cache.dir);
    let removed = store.clear().await?;
    tracing::info!(removed, "response cache cleared");
    println!("Removed {} cached responses.", removed);
    Ok(())
}
