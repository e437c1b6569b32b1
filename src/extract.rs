//! Per-page text extraction for manuals.
//!
//! PDFs are read page by page with `lopdf`, which also yields the image
//! XObjects of each page. When `lopdf` cannot load the file, or fails on
//! every page, `pdf-extract` is tried and its output treated as page 1.
//! Plain text and Markdown files are a single page.

use std::path::Path;

use thiserror::Error;

/// Extensions accepted by ingestion, lowercase.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt", "md"];

/// Text and image count of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number.
    pub page: u32,
    pub text: String,
    pub image_count: u32,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

/// Extract the pages of the file at `path`.
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, ExtractError> {
    match extension(path).as_deref() {
        Some("pdf") => {
            let bytes = std::fs::read(path)?;
            extract_pdf_pages(&bytes)
        }
        Some("txt") | Some("md") => {
            let text = std::fs::read_to_string(path)?;
            Ok(vec![PageText {
                page: 1,
                text,
                image_count: 0,
            }])
        }
        _ => Err(ExtractError::Unsupported(path.display().to_string())),
    }
}

pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
    match lopdf::Document::load_mem(bytes) {
        Ok(doc) => {
            let mut pages = Vec::new();
            let mut failures = 0usize;
            for (number, id) in doc.get_pages() {
                let text = match doc.extract_text(&[number]) {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::debug!(page = number, error = %e, "page text extraction failed");
                        failures += 1;
                        String::new()
                    }
                };
                let image_count = doc
                    .get_page_images(id)
                    .map(|imgs| imgs.len() as u32)
                    .unwrap_or(0);
                pages.push(PageText {
                    page: number,
                    text,
                    image_count,
                });
            }

            if !pages.is_empty() && failures == pages.len() {
                tracing::warn!("per-page extraction failed on every page; using whole-document fallback");
                let image_count = pages.iter().map(|p| p.image_count).sum();
                return match whole_document(bytes, image_count) {
                    Ok(single) => Ok(single),
                    Err(e) => {
                        tracing::warn!(error = %e, "fallback extraction failed; keeping empty pages");
                        Ok(pages)
                    }
                };
            }
            Ok(pages)
        }
        Err(e) => {
            tracing::warn!(error = %e, "lopdf could not load PDF; using whole-document fallback");
            whole_document(bytes, 0)
        }
    }
}

fn whole_document(bytes: &[u8], image_count: u32) -> Result<Vec<PageText>, ExtractError> {
    let text =
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(vec![PageText {
        page: 1,
        text,
        image_count,
    }])
}
