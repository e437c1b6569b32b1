//! Core data models shared by the ingestion and answering pipelines.
//!
//! A [`Chunk`] is created once at ingestion time and never mutated. At query
//! time the store returns [`RetrievedChunk`]s (chunk + raw distance), which
//! the ranker turns into [`ContextItem`]s carrying a relevance score.

use serde::{Deserialize, Serialize};

/// A bounded excerpt of a source document, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk UUID.
    pub id: String,
    /// Source document identifier (file name of the manual).
    pub source: String,
    /// 1-based page number within the source document.
    pub page: u32,
    /// Section heading detected on the page, if any.
    pub heading: Option<String>,
    /// Whether the page carries embedded images.
    pub has_images: bool,
    /// Number of embedded images on the page.
    pub image_count: u32,
    /// Position of this chunk within its document, starting at 0.
    pub chunk_index: i64,
    /// The excerpt text.
    pub content: String,
    /// SHA-256 of `content`.
    pub hash: String,
}

/// A chunk returned from the vector store together with its raw distance.
///
/// Distances follow the cosine-distance convention: `0.0` is identical,
/// `2.0` is opposite.
#[derive(Debug, Clone)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub distance: f64,
}

/// A chunk annotated at query time with a relevance score.
///
/// This is the shape handed back to callers of the answer API alongside
/// the generated answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub content: String,
    pub source: String,
    pub page: u32,
    pub heading: Option<String>,
    pub relevance: f64,
    #[serde(default)]
    pub has_images: bool,
    #[serde(default)]
    pub image_count: u32,
}

impl ContextItem {
    /// Build a context item from a chunk and an already computed relevance.
    pub fn from_chunk(chunk: &Chunk, relevance: f64) -> Self {
        Self {
            content: chunk.content.clone(),
            source: chunk.source.clone(),
            page: chunk.page,
            heading: chunk.heading.clone(),
            relevance,
            has_images: chunk.has_images,
            image_count: chunk.image_count,
        }
    }
}

/// A successfully produced answer.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Post-processed answer text (citations normalized, Sources appended).
    pub text: String,
    /// The ranked context the answer was generated from.
    pub context: Vec<ContextItem>,
    /// True when the text came from the response cache.
    pub cached: bool,
}
