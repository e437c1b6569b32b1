//! `status` command: vector store size and model service reachability.
//!
//! Neither check is fatal; failures are reported in place of the value.

use anyhow::Result;
use serde::Serialize;

use manual_qa_core::store::ContextStore;

use crate::config::Config;
use crate::db;
use crate::embedding::OllamaEmbedder;
use crate::ollama::OllamaClient;
use crate::store::SqliteStore;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Chunk count, or `error: ...`.
    pub vectordb: String,
    pub documents: Vec<String>,
    /// `running`, or `error: ...`.
    pub llm: String,
    pub models: Vec<String>,
}

pub async fn collect_status(config: &Config) -> StatusReport {
    let (vectordb, documents) = match store_status(config).await {
        Ok((count, docs)) => (format!("{} chunks", count), docs),
        Err(e) => (format!("error: {}", e), Vec::new()),
    };

    let (llm, models) = match llm_status(config).await {
        Ok(models) => ("running".to_string(), models),
        Err(e) => (format!("error: {}", e), Vec::new()),
    };

    StatusReport {
        vectordb,
        documents,
        llm,
        models,
    }
}

async fn store_status(config: &Config) -> Result<(usize, Vec<String>)> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone(), OllamaEmbedder::new(&config.embedding)?);
    let count = store.count().await?;
    let docs = store
        .sources()
        .await?
        .into_iter()
        .map(|(name, n)| format!("{} ({} chunks)", name, n))
        .collect();
    pool.close().await;
    Ok((count, docs))
}

async fn llm_status(config: &Config) -> Result<Vec<String>> {
    let client = OllamaClient::new(&config.qa_settings()?)?;
    client.list_models().await
}

pub async fn run_status(config: &Config, json: bool) -> Result<()> {
    let report = collect_status(config).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("vectordb: {}", report.vectordb);
    for doc in &report.documents {
        println!("  - {}", doc);
    }
    println!("llm: {}", report.llm);
    if !report.models.is_empty() {
        println!("  models: {}", report.models.join(", "));
    }
    Ok(())
}
