//! Ollama embedding backend.
//!
//! Calls `POST {url}/api/embed` with a batch of inputs and returns one
//! vector per input.
//!
//! # Retry Strategy
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, ... (capped at 2^5)

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use manual_qa_core::embedding::Embedder;

use crate::config::EmbeddingConfig;

pub struct OllamaEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    batch_size: usize,
    max_retries: u32,
}

impl OllamaEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/api/embed", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            max_retries: config.max_retries,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": texts,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::debug!(attempt, ?delay, "retrying embedding request");
                tokio::time::sleep(delay).await;
            }

            match self.client.post(&self.url).json(&body).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_embed_response(&json, texts.len());
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(anyhow!("Ollama embed error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("Ollama embed error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Embedding failed after retries")))
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            out.extend(self.embed_batch(batch).await?);
        }
        Ok(out)
    }
}

/// Extract `embeddings[][]` from an `/api/embed` response.
fn parse_embed_response(json: &serde_json::Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = json
        .get("embeddings")
        .and_then(|d| d.as_array())
        .ok_or_else(|| anyhow!("Invalid Ollama response: missing embeddings array"))?;

    let mut embeddings = Vec::with_capacity(data.len());
    for item in data {
        let vector = item
            .as_array()
            .ok_or_else(|| anyhow!("Invalid Ollama response: embedding is not an array"))?
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| anyhow!("Invalid Ollama response: non-numeric embedding value"))?;
        embeddings.push(vector);
    }

    if embeddings.len() != expected {
        bail!(
            "Ollama returned {} embeddings for {} inputs",
            embeddings.len(),
            expected
        );
    }
    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_embed_response() {
        let json = json!({"model": "all-minilm", "embeddings": [[0.5, -1.0], [0.25, 2.0]]});
        let vectors = parse_embed_response(&json, 2).unwrap();
        assert_eq!(vectors, vec![vec![0.5, -1.0], vec![0.25, 2.0]]);
    }

    #[test]
    fn test_parse_rejects_count_mismatch() {
        let json = json!({"embeddings": [[0.5]]});
        assert!(parse_embed_response(&json, 2).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        assert!(parse_embed_response(&json!({"error": "model not found"}), 1).is_err());
    }
}
