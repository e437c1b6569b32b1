//! In-memory [`ContextStore`] implementation for testing.
//!
//! Uses a `Vec` behind `std::sync::RwLock`. Queries are embedded with the
//! supplied [`Embedder`] and scored by brute-force cosine distance.

use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::embedding::{cosine_distance, Embedder};
use crate::models::{Chunk, RetrievedChunk};

use super::ContextStore;

struct StoredChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

/// In-memory vector collection.
pub struct InMemoryStore<E> {
    embedder: E,
    chunks: RwLock<Vec<StoredChunk>>,
}

impl<E: Embedder> InMemoryStore<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            chunks: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl<E: Embedder> ContextStore for InMemoryStore<E> {
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<RetrievedChunk>> {
        let query_vec = self.embedder.embed_query(text).await?;
        let chunks = self.chunks.read().unwrap();
        let mut results: Vec<RetrievedChunk> = chunks
            .iter()
            .map(|sc| RetrievedChunk {
                chunk: sc.chunk.clone(),
                distance: cosine_distance(&query_vec, &sc.vector),
            })
            .collect();
        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(n_results);
        Ok(results)
    }

    async fn add_chunks(&self, chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
        if chunks.len() != vectors.len() {
            bail!(
                "chunk/vector count mismatch: {} chunks, {} vectors",
                chunks.len(),
                vectors.len()
            );
        }
        let mut stored = self.chunks.write().unwrap();
        for (c, v) in chunks.iter().zip(vectors.iter()) {
            stored.retain(|sc| sc.chunk.id != c.id);
            stored.push(StoredChunk {
                chunk: c.clone(),
                vector: v.clone(),
            });
        }
        Ok(())
    }

    async fn delete_source(&self, source: &str) -> Result<usize> {
        let mut stored = self.chunks.write().unwrap();
        let before = stored.len();
        stored.retain(|sc| sc.chunk.source != source);
        Ok(before - stored.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.chunks.read().unwrap().len())
    }
}
