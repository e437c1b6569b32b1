//! # Manual QA Core
//!
//! Runtime-agnostic logic for answering questions over PDF manuals:
//! data models, chunking, the store and cache abstractions, ranking,
//! prompt assembly, citation post-processing and the answer pipeline.
//!
//! | Module | Role |
//! |--------|------|
//! | [`models`] | `Chunk`, `RetrievedChunk`, `ContextItem`, `Answer` |
//! | [`chunk`] | Page text → overlapping chunks, heading detection |
//! | [`embedding`] | `Embedder` trait, vector blobs, cosine distance |
//! | [`store`] | `ContextStore` trait and an in-memory backend |
//! | [`rank`] | Distance → relevance, keyword rerank, min-relevance filter |
//! | [`prompt`] | Context packing and prompt template |
//! | [`cache`] | `ResponseCache` over a `KeyValueStore` |
//! | [`generate`] | `Generator` trait |
//! | [`citations`] | Citation normalization and the Sources section |
//! | [`pipeline`] | `QaPipeline`, the end-to-end answer flow |
//! | [`settings`] | `QaSettings`, `AnswerMode` |
//! | [`error`] | `AnswerError` and its user-facing messages |
//!
//! This crate contains no sqlx, HTTP client or filesystem I/O. Concrete
//! backends live in the `manual-qa` application crate.

pub mod cache;
pub mod chunk;
pub mod citations;
pub mod embedding;
pub mod error;
pub mod generate;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod rank;
pub mod settings;
pub mod store;
