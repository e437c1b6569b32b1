//! SQLite-backed [`ContextStore`].
//!
//! Chunks live in `chunks`, their vectors in `chunk_vectors` as
//! little-endian f32 blobs. Queries embed the text with the configured
//! [`Embedder`] and rank every stored vector by cosine distance in Rust.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use manual_qa_core::embedding::{blob_to_vec, cosine_distance, vec_to_blob, Embedder};
use manual_qa_core::models::{Chunk, RetrievedChunk};
use manual_qa_core::store::ContextStore;

pub struct SqliteStore<E> {
    pool: SqlitePool,
    embedder: E,
}

impl<E: Embedder> SqliteStore<E> {
    pub fn new(pool: SqlitePool, embedder: E) -> Self {
        Self { pool, embedder }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Distinct source documents with their chunk counts, by name.
    pub async fn sources(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS n FROM chunks GROUP BY source ORDER BY source",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .iter()
            .map(|row| (row.get::<String, _>("source"), row.get::<i64, _>("n")))
            .collect())
    }
}

#[async_trait]
impl<E: Embedder> ContextStore for SqliteStore<E> {
    async fn query(&self, text: &str, n_results: usize) -> Result<Vec<RetrievedChunk>> {
        let query_vec = self.embedder.embed_query(text).await?;

        let rows = sqlx::query(
            r#"
            SELECT c.id, c.source, c.page, c.heading, c.has_images, c.image_count,
                   c.chunk_index, c.content, c.hash, cv.embedding
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut results: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vector = blob_to_vec(&blob);
                let page: i64 = row.get("page");
                let image_count: i64 = row.get("image_count");
                RetrievedChunk {
                    chunk: Chunk {
                        id: row.get("id"),
                        source: row.get("source"),
                        page: page as u32,
                        heading: row.get("heading"),
                        has_images: row.get("has_images"),
                        image_count: image_count as u32,
                        chunk_index: row.get("chunk_index"),
                        content: row.get("content"),
                        hash: row.get("hash"),
                    },
                    distance: cosine_distance(&query_vec, &vector),
                }
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

        let mut tx = self.pool.begin().await?;
        for (chunk, vector) in chunks.iter().zip(vectors) {
            sqlx::query(
                r#"
                INSERT INTO chunks (id, source, page, heading, has_images, image_count,
                                    chunk_index, content, hash)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&chunk.id)
            .bind(&chunk.source)
            .bind(chunk.page as i64)
            .bind(&chunk.heading)
            .bind(chunk.has_images)
            .bind(chunk.image_count as i64)
            .bind(chunk.chunk_index)
            .bind(&chunk.content)
            .bind(&chunk.hash)
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO chunk_vectors (chunk_id, embedding) VALUES (?, ?)")
                .bind(&chunk.id)
                .bind(vec_to_blob(vector))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_source(&self, source: &str) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "DELETE FROM chunk_vectors WHERE chunk_id IN (SELECT id FROM chunks WHERE source = ?)",
        )
        .bind(source)
        .execute(&mut *tx)
        .await?;
        let removed = sqlx::query("DELETE FROM chunks WHERE source = ?")
            .bind(source)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(removed as usize)
    }

    async fn count(&self) -> Result<usize> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        Ok(n as usize)
    }
}
