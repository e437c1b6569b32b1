//! Generation endpoint abstraction.
//!
//! The concrete Ollama client lives in the `manual-qa` app crate. Failures
//! are reported through [`AnswerError`] so the pipeline can render them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AnswerError;

/// Sampling options sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f32,
    /// Maximum tokens to generate (`num_predict` on the wire).
    pub max_tokens: u32,
    pub stream: bool,
}

/// A text generation backend.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier sent with each request.
    fn model_name(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, AnswerError>;
}
