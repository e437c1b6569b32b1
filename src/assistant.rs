//! `ask` and `context` commands: wiring the concrete backends into the
//! core answer pipeline.

use anyhow::Result;
use serde::Serialize;
use std::time::Instant;

use manual_qa_core::cache::ResponseCache;
use manual_qa_core::error::AnswerError;
use manual_qa_core::models::ContextItem;
use manual_qa_core::pipeline::QaPipeline;
use manual_qa_core::settings::QaSettings;

use crate::config::Config;
use crate::db;
use crate::embedding::OllamaEmbedder;
use crate::file_cache::FileKeyValueStore;
use crate::ollama::OllamaClient;
use crate::store::SqliteStore;

pub type AppPipeline = QaPipeline<SqliteStore<OllamaEmbedder>, OllamaClient, FileKeyValueStore>;

/// Assemble the pipeline from configuration.
pub async fn build_pipeline(config: &Config, settings: QaSettings, use_cache: bool) -> Result<AppPipeline> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool, OllamaEmbedder::new(&config.embedding)?);
    let generator = OllamaClient::new(&settings)?;
    let cache = (use_cache && config.cache.enabled).then(|| {
        ResponseCache::new(
            FileKeyValueStore::new(&config.cache.dir),
            settings.cache_ttl,
            settings.cache_size,
        )
    });
    Ok(QaPipeline::new(store, generator, cache, settings))
}

#[derive(Debug, Serialize, PartialEq)]
pub struct SourceRef {
    pub document: String,
    pub page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Timing {
    pub total_seconds: f64,
}

/// Machine-readable answer printed by `ask --json`.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub context: Vec<ContextItem>,
    pub cached: bool,
    pub timing: Timing,
}

/// One entry per distinct (document, page), in context order.
pub fn source_refs(context: &[ContextItem]) -> Vec<SourceRef> {
    let mut refs: Vec<SourceRef> = Vec::new();
    for item in context {
        if refs
            .iter()
            .any(|r| r.document == item.source && r.page == item.page)
        {
            continue;
        }
        refs.push(SourceRef {
            document: item.source.clone(),
            page: item.page,
            section: item.heading.clone(),
        });
    }
    refs
}

pub async fn run_ask(config: &Config, query: &str, json: bool, no_cache: bool) -> Result<()> {
    let started = Instant::now();
    let query = query.trim();

    let (answer, context, cached) = if query.is_empty() {
        (AnswerError::EmptyQuery.user_message(), Vec::new(), false)
    } else {
        let pipeline = build_pipeline(config, config.qa_settings()?, !no_cache).await?;
        tracing::info!(query, "question received");
        let context = pipeline.retrieve_context(query).await;
        match pipeline.try_answer(query, Some(context.clone())).await {
            Ok(answer) => (answer.text, answer.context, answer.cached),
            Err(e) => {
                tracing::warn!(error = %e, "question not answered");
                (e.user_message(), context, false)
            }
        }
    };

    let total_seconds = started.elapsed().as_secs_f64();
    tracing::info!(total_seconds, cached, "ask finished");

    if json {
        let response = AskResponse {
            answer,
            sources: source_refs(&context),
            context,
            cached,
            timing: Timing { total_seconds },
        };
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!("{}", answer);
    }
    Ok(())
}

pub async fn run_context(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        println!("{}", AnswerError::EmptyQuery.user_message());
        return Ok(());
    }

    let mut settings = config.qa_settings()?;
    if let Some(limit) = limit {
        settings.top_k = limit.max(1);
    }
    let pipeline = build_pipeline(config, settings, false).await?;
    let context = pipeline.retrieve_context(query).await;

    if context.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, item) in context.iter().enumerate() {
        let section = item
            .heading
            .as_deref()
            .map(|h| format!(" [{}]", h))
            .unwrap_or_default();
        println!(
            "{}. {} page {}{} (relevance {:.3})",
            i + 1,
            item.source,
            item.page,
            section,
            item.relevance
        );
        let preview: String = item.content.chars().take(240).collect();
        println!("    {}", preview.replace('\n', " "));
    }
    Ok(())
}
