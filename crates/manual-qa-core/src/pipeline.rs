//! The retrieval-and-answer pipeline.
//!
//! ```text
//! query ─▶ ContextStore ─▶ rank ─▶ cache? ─hit──────────────────────────▶ answer
//!                                    └─miss─▶ PromptAssembler ─▶ Generator
//!                                              ─▶ post_process ─▶ cache ─▶ answer
//! ```
//!
//! Each request is one sequential chain of awaits. Early exits: empty
//! query (no retrieval at all), empty context, cache hit.
//!
//! [`QaPipeline::try_answer`] reports failures as [`AnswerError`];
//! [`QaPipeline::answer`] folds them into a user-facing string and always
//! returns the context that was retrieved.

use std::time::Instant;

use crate::cache::{cache_key, KeyValueStore, ResponseCache};
use crate::chunk::{byte_offset, char_len};
use crate::citations::post_process;
use crate::error::AnswerError;
use crate::generate::Generator;
use crate::models::{Answer, ContextItem};
use crate::prompt::PromptAssembler;
use crate::rank::{filter_min_relevance, rank};
use crate::settings::{AnswerMode, QaSettings};
use crate::store::{retrieve, ContextStore};

/// Excerpt length shown per item in simple mode.
const SIMPLE_EXCERPT_CHARS: usize = 300;

pub struct QaPipeline<S, G, K> {
    store: S,
    generator: G,
    cache: Option<ResponseCache<K>>,
    assembler: PromptAssembler,
    settings: QaSettings,
}

impl<S, G, K> QaPipeline<S, G, K>
where
    S: ContextStore,
    G: Generator,
    K: KeyValueStore,
{
    pub fn new(store: S, generator: G, cache: Option<ResponseCache<K>>, settings: QaSettings) -> Self {
        Self {
            assembler: PromptAssembler::new(settings.context_window),
            store,
            generator,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &QaSettings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Retrieve and rank context, treating store failures as no context.
    pub async fn retrieve_context(&self, query: &str) -> Vec<ContextItem> {
        let candidates = retrieve(&self.store, query, self.settings.fetch_count()).await;
        self.rank_candidates(query, candidates)
    }

    /// Retrieve and rank context, surfacing store failures.
    pub async fn try_retrieve_context(&self, query: &str) -> Result<Vec<ContextItem>, AnswerError> {
        let candidates = self
            .store
            .query(query, self.settings.fetch_count())
            .await
            .map_err(|e| AnswerError::RetrievalFailed(e.to_string()))?;
        Ok(self.rank_candidates(query, candidates))
    }

    fn rank_candidates(
        &self,
        query: &str,
        candidates: Vec<crate::models::RetrievedChunk>,
    ) -> Vec<ContextItem> {
        let fetched = candidates.len();
        let ranked = rank(query, candidates, self.settings.top_k, self.settings.rerank);
        let kept = filter_min_relevance(ranked, self.settings.min_relevance);
        tracing::debug!(fetched, kept = kept.len(), "context ranked");
        kept
    }

    /// Answer `query`, always yielding an `(answer, context)` pair.
    ///
    /// `context` skips retrieval when the caller already holds ranked items.
    pub async fn answer(
        &self,
        query: &str,
        context: Option<Vec<ContextItem>>,
    ) -> (String, Vec<ContextItem>) {
        let query = query.trim();
        if query.is_empty() {
            return (AnswerError::EmptyQuery.user_message(), Vec::new());
        }

        let context = match context {
            Some(c) => c,
            None => self.retrieve_context(query).await,
        };

        match self.answer_from_context(query, &context).await {
            Ok((text, _)) => (text, context),
            Err(e) => {
                tracing::warn!(error = %e, "answer degraded to error message");
                (e.user_message(), context)
            }
        }
    }

    /// Answer `query`, reporting failures as [`AnswerError`].
    pub async fn try_answer(
        &self,
        query: &str,
        context: Option<Vec<ContextItem>>,
    ) -> Result<Answer, AnswerError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AnswerError::EmptyQuery);
        }

        let context = match context {
            Some(c) => c,
            None => self.try_retrieve_context(query).await?,
        };

        let (text, cached) = self.answer_from_context(query, &context).await?;
        Ok(Answer {
            text,
            context,
            cached,
        })
    }

    /// Produce the answer text for an already retrieved context.
    ///
    /// Returns the text and whether it came from the cache.
    async fn answer_from_context(
        &self,
        query: &str,
        context: &[ContextItem],
    ) -> Result<(String, bool), AnswerError> {
        if context.is_empty() {
            return Err(AnswerError::NoRelevantContext);
        }

        if self.settings.mode == AnswerMode::Simple {
            return Ok((simple_answer(query, context), false));
        }

        let started = Instant::now();
        let key = cache_key(query, context);

        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lookup(&key).await {
                tracing::info!(query, "answered from cache");
                return Ok((hit, true));
            }
        }

        let prompt = self.assembler.assemble(query, context);
        tracing::debug!(prompt_chars = char_len(&prompt), model = self.generator.model_name(), "sending prompt");

        let raw = self.generator.generate(&prompt).await?;
        let text = post_process(&raw, context);

        if let Some(cache) = &self.cache {
            cache.insert(&key, query, &text).await;
        }

        tracing::info!(
            query,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "query answered"
        );
        Ok((text, false))
    }
}

/// Retrieval-only answer listing each excerpt.
pub fn simple_answer(query: &str, context: &[ContextItem]) -> String {
    let mut answer = format!("Here's what I found in the documentation for '{}':\n\n", query);
    for item in context {
        let excerpt = &item.content[..byte_offset(&item.content, SIMPLE_EXCERPT_CHARS)];
        answer.push_str(&format!("Source: {}, Page {}\n", item.source, item.page));
        answer.push_str(&format!("Excerpt: {}...\n\n", excerpt));
    }
    answer.trim_end().to_string()
}
