//! # Manual QA
//!
//! A local question-answering assistant over PDF product manuals.
//!
//! Manuals are split into page-tagged chunks, embedded through a local
//! Ollama server and stored in SQLite. Questions retrieve the nearest
//! chunks, rerank them, pack them into a prompt and send it to a local
//! model; answers come back with normalized citations and a Sources list.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌──────────┐
//! │ PDF / text │──▶│ Chunk+Embed  │──▶│  SQLite  │
//! │  manuals   │   │   (Ollama)   │   │ vectors  │
//! └────────────┘   └──────────────┘   └────┬─────┘
//!                                          │
//!                 ┌────────────────────────┘
//!                 ▼
//!          ┌─────────────┐   ┌──────────┐   ┌──────────────┐
//!          │ rank+prompt │──▶│  Ollama  │──▶│ post-process │
//!          └──────┬──────┘   │ generate │   └──────────────┘
//!                 └──cache──▶└──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mqa init                          # create database
//! mqa ingest ./docs                 # extract, chunk, embed manuals
//! mqa ask "How do I reset the device?"
//! mqa status                        # store size and model reachability
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`store`] | SQLite context store |
//! | [`file_cache`] | File-backed response cache storage |
//! | [`embedding`] | Ollama embedding backend |
//! | [`ollama`] | Ollama generation client |
//! | [`extract`] | Per-page PDF and text extraction |
//! | [`ingest`] | Ingestion pipeline |
//! | [`assistant`] | `ask` / `context` commands |
//! | [`status`] | `status` command |
//! | [`feedback`] | `feedback` command |
//! | [`cache_cmd`] | `cache` commands |

pub mod assistant;
pub mod cache_cmd;
pub mod config;
pub mod db;
pub mod embedding;
pub mod extract;
pub mod feedback;
pub mod file_cache;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod ollama;
pub mod status;
pub mod store;
