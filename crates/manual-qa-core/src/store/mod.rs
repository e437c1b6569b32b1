//! Vector store abstraction (the context store adapter).
//!
//! The [`ContextStore`] trait is the narrow interface the answer pipeline
//! uses to fetch nearest-neighbour chunks for a query. Backends own their
//! chunks; callers only ever see [`RetrievedChunk`]s.
//!
//! [`retrieve`] wraps a store with the soft-failure contract: any backend
//! error is logged and turned into an empty result, which callers must read
//! as "no relevant information".
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, RetrievedChunk};

/// Abstract persistent vector collection.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`query`](ContextStore::query) | Up to `n` nearest chunks with their distance, ascending |
/// | [`add_chunks`](ContextStore::add_chunks) | Store chunks with their vectors |
/// | [`delete_source`](ContextStore::delete_source) | Remove every chunk of one document |
/// | [`count`](ContextStore::count) | Number of stored chunks |
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Return up to `n_results` chunks nearest to `text`, closest first.
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<RetrievedChunk>>;

    /// Store chunks together with their embedding vectors (same order).
    async fn add_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()>;

    /// Delete all chunks belonging to `source`. Returns the number removed.
    async fn delete_source(&self, source: &str) -> Result<usize>;

    /// Number of stored chunks.
    async fn count(&self) -> Result<usize>;
}

/// Query `store`, recovering any error as an empty result.
pub async fn retrieve<S: ContextStore + ?Sized>(
    store: &S,
    text: &str,
    n_results: usize,
) -> Vec<RetrievedChunk> {
    match store.query(text, n_results).await {
        Ok(chunks) => chunks,
        Err(e) => {
            tracing::warn!(error = %e, "context retrieval failed; continuing with no context");
            Vec::new()
        }
    }
}
