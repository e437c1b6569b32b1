//! Explicit settings for the answer pipeline.
//!
//! Built by the application from its configuration file and passed into
//! component constructors; nothing in the core reads global state.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::generate::GenerationOptions;

/// How questions are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// Retrieve, then generate with the language model.
    Local,
    /// Retrieve only and list the excerpts; never calls the model.
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QaSettings {
    /// Generation endpoint URL.
    pub endpoint_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Maximum packed context length, in chars.
    pub context_window: usize,
    /// Number of context items handed to the prompt.
    pub top_k: usize,
    pub rerank: bool,
    pub min_relevance: f64,
    pub stream: bool,
    pub timeout: Duration,
    pub cache_size: usize,
    pub cache_ttl: Duration,
    pub mode: AnswerMode,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            endpoint_url: "http://localhost:11434/api/generate".to_string(),
            model: "phi4".to_string(),
            temperature: 0.3,
            max_tokens: 1000,
            context_window: 8000,
            top_k: 5,
            rerank: true,
            min_relevance: 0.3,
            stream: false,
            timeout: Duration::from_secs(180),
            cache_size: 100,
            cache_ttl: Duration::from_secs(86_400),
            mode: AnswerMode::Local,
        }
    }
}

impl QaSettings {
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: self.stream,
        }
    }

    /// Candidates to request from the store: twice `top_k` when reranking.
    pub fn fetch_count(&self) -> usize {
        if self.rerank {
            self.top_k * 2
        } else {
            self.top_k
        }
    }
}
