//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/mqa.sqlite"
//!
//! [ingest]
//! docs_dir = "./docs"
//! chunk_size = 1000
//! chunk_overlap = 200
//!
//! [embedding]
//! url = "http://localhost:11434"
//! model = "all-minilm"
//!
//! [generation]
//! url = "http://localhost:11434/api/generate"
//! model = "phi4"
//! method = "local"
//!
//! [retrieval]
//! top_k = 5
//! rerank = true
//! min_relevance = 0.3
//!
//! [cache]
//! dir = "./response_cache"
//! size = 100
//! ttl_secs = 86400
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Only `[db]` is required; every other section falls back to defaults.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use manual_qa_core::settings::{AnswerMode, QaSettings};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    /// Directory for feedback records. Defaults to the database directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl DbConfig {
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => self
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("./docs")
}
fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Ollama base URL.
    #[serde(default = "default_ollama_base")]
    pub url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_base(),
            model: default_embedding_model(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

fn default_ollama_base() -> String {
    "http://localhost:11434".to_string()
}
fn default_embedding_model() -> String {
    "all-minilm".to_string()
}
fn default_batch_size() -> usize {
    32
}
fn default_max_retries() -> u32 {
    3
}
fn default_embedding_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Full URL of the generate endpoint.
    #[serde(default = "default_generate_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default)]
    pub stream: bool,
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
    /// `local` or `simple`.
    #[serde(default = "default_method")]
    pub method: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_generate_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            context_window: default_context_window(),
            stream: false,
            timeout_secs: default_request_timeout(),
            method: default_method(),
        }
    }
}

fn default_generate_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}
fn default_model() -> String {
    "phi4".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_context_window() -> usize {
    8000
}
fn default_request_timeout() -> u64 {
    180
}
fn default_method() -> String {
    "local".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_rerank")]
    pub rerank: bool,
    #[serde(default = "default_min_relevance")]
    pub min_relevance: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            rerank: default_rerank(),
            min_relevance: default_min_relevance(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_rerank() -> bool {
    true
}
fn default_min_relevance() -> f64 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_cache_size")]
    pub size: usize,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            dir: default_cache_dir(),
            size: default_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_cache_dir() -> PathBuf {
    PathBuf::from("./response_cache")
}
fn default_cache_size() -> usize {
    100
}
fn default_cache_ttl() -> u64 {
    86_400
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// When set, logs are also written to a daily rolling file here.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl GenerationConfig {
    pub fn answer_mode(&self) -> Result<AnswerMode> {
        match self.method.as_str() {
            "local" => Ok(AnswerMode::Local),
            "simple" => Ok(AnswerMode::Simple),
            other => bail!(
                "Unknown generation method: '{}'. Must be local or simple.",
                other
            ),
        }
    }
}

impl Config {
    /// Explicit settings object handed to the core pipeline.
    pub fn qa_settings(&self) -> Result<QaSettings> {
        Ok(QaSettings {
            endpoint_url: self.generation.url.clone(),
            model: self.generation.model.clone(),
            temperature: self.generation.temperature,
            max_tokens: self.generation.max_tokens,
            context_window: self.generation.context_window,
            top_k: self.retrieval.top_k,
            rerank: self.retrieval.rerank,
            min_relevance: self.retrieval.min_relevance,
            stream: self.generation.stream,
            timeout: Duration::from_secs(self.generation.timeout_secs),
            cache_size: self.cache.size,
            cache_ttl: Duration::from_secs(self.cache.ttl_secs),
            mode: self.generation.answer_mode()?,
        })
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate ingest
    if config.ingest.chunk_size == 0 {
        bail!("ingest.chunk_size must be > 0");
    }
    if config.ingest.chunk_overlap >= config.ingest.chunk_size {
        bail!("ingest.chunk_overlap must be < ingest.chunk_size");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        bail!("retrieval.top_k must be >= 1");
    }

    // Validate generation
    if config.generation.context_window == 0 {
        bail!("generation.context_window must be > 0");
    }
    if !(0.0..=2.0).contains(&config.generation.temperature) {
        bail!("generation.temperature must be in [0.0, 2.0]");
    }
    config.generation.answer_mode()?;

    // Validate cache
    if config.cache.size < 1 {
        bail!("cache.size must be >= 1");
    }

    if config.embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    Ok(config)
}
