//! Relevance ranking.
//!
//! Turns raw vector distances into relevance scores and optionally reranks
//! candidates by keyword overlap with the query.
//!
//! # Scoring
//!
//! 1. `relevance = 1 - distance / 2` (cosine distance lies in `[0, 2]`).
//! 2. With reranking, each candidate is boosted by
//!    `relevance * (1 + 0.1 * matches)` where `matches` is the number of
//!    distinct query terms found in the lowercased chunk content.
//! 3. Candidates are sorted by relevance, descending. The sort is stable,
//!    so equal scores keep retrieval order.
//! 4. The list is truncated to `n`.
//!
//! The boost has no upper bound; it only affects ordering.

use crate::models::{ContextItem, RetrievedChunk};

/// Per-term boost applied during reranking.
pub const TERM_BOOST: f64 = 0.1;

/// Convert a cosine distance into a relevance score.
pub fn relevance_from_distance(distance: f64) -> f64 {
    1.0 - distance / 2.0
}

/// Lowercased, de-duplicated query terms with surrounding punctuation removed.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for raw in query.split_whitespace() {
        let term = raw
            .trim_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        if !term.is_empty() && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

/// Number of distinct `terms` that occur in `content` (case-insensitive).
pub fn term_matches(terms: &[String], content: &str) -> usize {
    let lowered = content.to_lowercase();
    terms.iter().filter(|t| lowered.contains(t.as_str())).count()
}

/// Score retrieved chunks and return the top `n` as context items.
///
/// Without `rerank` the retrieval order is kept. With `rerank` the
/// keyword boost is applied and the list is re-sorted.
pub fn rank(query: &str, candidates: Vec<RetrievedChunk>, n: usize, rerank: bool) -> Vec<ContextItem> {
    let items: Vec<ContextItem> = candidates
        .iter()
        .map(|rc| ContextItem::from_chunk(&rc.chunk, relevance_from_distance(rc.distance)))
        .collect();

    if rerank {
        rerank_items(query, items, n)
    } else {
        let mut items = items;
        items.truncate(n);
        items
    }
}

/// Apply the keyword boost to already scored items and keep the top `n`.
pub fn rerank_items(query: &str, mut items: Vec<ContextItem>, n: usize) -> Vec<ContextItem> {
    let terms = query_terms(query);
    for item in items.iter_mut() {
        let matches = term_matches(&terms, &item.content);
        item.relevance *= 1.0 + TERM_BOOST * matches as f64;
    }
    sort_by_relevance(&mut items);
    items.truncate(n);
    items
}

/// Stable descending sort by relevance.
pub fn sort_by_relevance(items: &mut [ContextItem]) {
    items.sort_by(|a, b| {
        b.relevance
            .partial_cmp(&a.relevance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Drop items whose relevance falls below `min_relevance`.
pub fn filter_min_relevance(items: Vec<ContextItem>, min_relevance: f64) -> Vec<ContextItem> {
    items
        .into_iter()
        .filter(|i| i.relevance >= min_relevance)
        .collect()
}
