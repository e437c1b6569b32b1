//! Ingestion pipeline orchestration.
//!
//! Walks the docs directory → extracts pages → chunks each page with its
//! heading and image metadata → embeds → replaces the document's chunks in
//! the store. A file that fails to extract or embed is skipped and
//! reported; the rest of the run continues.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use manual_qa_core::chunk::{chunk_page, detect_heading, PageMeta};
use manual_qa_core::embedding::Embedder;
use manual_qa_core::models::Chunk;
use manual_qa_core::store::ContextStore;

use crate::config::Config;
use crate::db;
use crate::embedding::OllamaEmbedder;
use crate::extract::{self, PageText};
use crate::store::SqliteStore;

/// Counters reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestStats {
    pub files: usize,
    pub pages: usize,
    pub chunks: usize,
    pub skipped: usize,
}

/// Supported files under `root`, sorted by path.
pub fn scan_documents(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        bail!("Docs directory does not exist: {}", root.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if entry.file_type().is_file() && extract::is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Source identifier of a file: its path relative to `root`, joined
/// with `/`. Files directly under `root` are named by file name alone.
pub fn source_name(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if rel.components().next().is_some() => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        _ => path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

/// Chunk every page of one document, numbering chunks across pages.
pub fn chunk_document(source: &str, pages: &[PageText], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        let meta = PageMeta {
            source: source.to_string(),
            page: page.page,
            heading: detect_heading(&page.text),
            has_images: page.image_count > 0,
            image_count: page.image_count,
        };
        let start = chunks.len() as i64;
        chunks.extend(chunk_page(&meta, &page.text, chunk_size, overlap, start));
    }
    chunks
}

/// Embed `chunks` and swap them in for any previous chunks of `source`.
pub async fn store_document<S, E>(store: &S, embedder: &E, source: &str, chunks: &[Chunk]) -> Result<()>
where
    S: ContextStore + ?Sized,
    E: Embedder + ?Sized,
{
    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let vectors = if texts.is_empty() {
        Vec::new()
    } else {
        embedder.embed(&texts).await?
    };

    let removed = store.delete_source(source).await?;
    if removed > 0 {
        tracing::debug!(source, removed, "replaced previous chunks");
    }
    store.add_chunks(chunks, &vectors).await
}

/// Ingest every supported file under `root`.
pub async fn ingest_dir<S, E>(
    store: &S,
    embedder: &E,
    root: &Path,
    chunk_size: usize,
    overlap: usize,
) -> Result<IngestStats>
where
    S: ContextStore + ?Sized,
    E: Embedder + ?Sized,
{
    let mut stats = IngestStats::default();

    for path in scan_documents(root)? {
        let source = source_name(root, &path);

        let extract_path = path.clone();
        let pages = match tokio::task::spawn_blocking(move || extract::extract_pages(&extract_path)).await? {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "extraction failed; skipping");
                stats.skipped += 1;
                continue;
            }
        };

        let chunks = chunk_document(&source, &pages, chunk_size, overlap);
        if let Err(e) = store_document(store, embedder, &source, &chunks).await {
            tracing::warn!(file = %path.display(), error = %e, "embedding or storage failed; skipping");
            stats.skipped += 1;
            continue;
        }

        tracing::info!(source, pages = pages.len(), chunks = chunks.len(), "ingested");
        stats.files += 1;
        stats.pages += pages.len();
        stats.chunks += chunks.len();
    }

    Ok(stats)
}

pub async fn run_ingest(config: &Config, dir: Option<PathBuf>) -> Result<()> {
    let root = dir.unwrap_or_else(|| config.ingest.docs_dir.clone());
    let pool = db::connect(config).await?;
    let embedder = OllamaEmbedder::new(&config.embedding)?;
    let store = SqliteStore::new(pool.clone(), OllamaEmbedder::new(&config.embedding)?);

    let stats = ingest_dir(
        &store,
        &embedder,
        &root,
        config.ingest.chunk_size,
        config.ingest.chunk_overlap,
    )
    .await?;

    println!("ingest {}", root.display());
    println!("  files ingested: {}", stats.files);
    println!("  pages: {}", stats.pages);
    println!("  chunks written: {}", stats.chunks);
    println!("  skipped: {}", stats.skipped);
    println!("  total chunks in store: {}", store.count().await?);
    println!("ok");

    pool.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use manual_qa_core::store::memory::InMemoryStore;
    use tempfile::TempDir;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn model_name(&self) -> &str {
            "length"
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        fn model_name(&self) -> &str {
            "down"
        }
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(anyhow!("connection refused"))
        }
    }

    fn page(n: u32, text: &str, images: u32) -> PageText {
        PageText {
            page: n,
            text: text.to_string(),
            image_count: images,
        }
    }

    #[test]
    fn test_chunk_document_carries_page_metadata() {
        let pages = vec![
            page(1, "3.2 Resetting the Unit\nHold the power key.", 2),
            page(2, "plain body text", 0),
        ];
        let chunks = chunk_document("manual.pdf", &pages, 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[0].heading.as_deref(), Some("3.2 Resetting the Unit"));
        assert!(chunks[0].has_images);
        assert_eq!(chunks[0].image_count, 2);
        assert_eq!(chunks[1].page, 2);
        assert!(!chunks[1].has_images);
        assert_eq!(chunks[1].chunk_index, 1);
    }

    #[tokio::test]
    async fn test_ingest_dir_and_reingest_replaces() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("guide.md"), "Pump wiring.\n\nCheck the fuse.").unwrap();
        std::fs::write(tmp.path().join("image.png"), [0u8; 4]).unwrap();

        let store = InMemoryStore::new(LengthEmbedder);
        let stats = ingest_dir(&store, &LengthEmbedder, tmp.path(), 1000, 200).await.unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.skipped, 0);
        let first = store.count().await.unwrap();
        assert!(first > 0);

        ingest_dir(&store, &LengthEmbedder, tmp.path(), 1000, 200).await.unwrap();
        assert_eq!(store.count().await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_embedding_failure_skips_file_and_keeps_old_chunks() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("guide.txt"), "Pump wiring.").unwrap();

        let store = InMemoryStore::new(LengthEmbedder);
        ingest_dir(&store, &LengthEmbedder, tmp.path(), 1000, 200).await.unwrap();
        let before = store.count().await.unwrap();

        let stats = ingest_dir(&store, &DownEmbedder, tmp.path(), 1000, 200).await.unwrap();
        assert_eq!(stats.skipped, 1);
        assert_eq!(store.count().await.unwrap(), before);
    }

    #[test]
    fn test_scan_missing_dir_errors() {
        assert!(scan_documents(Path::new("/nonexistent/manuals")).is_err());
    }

    #[test]
    fn test_source_name_relative_to_root() {
        let root = Path::new("docs");
        assert_eq!(source_name(root, Path::new("docs/Manual.pdf")), "Manual.pdf");
        assert_eq!(source_name(root, Path::new("docs/sub/Manual.pdf")), "sub/Manual.pdf");
        assert_eq!(source_name(root, Path::new("/elsewhere/Manual.pdf")), "Manual.pdf");
    }

    #[tokio::test]
    async fn test_same_file_name_in_sibling_dirs_kept_apart() {
        let tmp = TempDir::new().unwrap();
        for dir in ["pumpA", "pumpB"] {
            std::fs::create_dir_all(tmp.path().join(dir)).unwrap();
            std::fs::write(tmp.path().join(dir).join("manual.txt"), format!("{} wiring.", dir)).unwrap();
        }

        let store = InMemoryStore::new(LengthEmbedder);
        let stats = ingest_dir(&store, &LengthEmbedder, tmp.path(), 1000, 200).await.unwrap();
        assert_eq!(stats.files, 2);
        assert_eq!(store.count().await.unwrap(), 2);

        let hits = store.query("wiring", 5).await.unwrap();
        let mut sources: Vec<String> = hits.into_iter().map(|h| h.chunk.source).collect();
        sources.sort();
        assert_eq!(sources, vec!["pumpA/manual.txt", "pumpB/manual.txt"]);
    }
}
