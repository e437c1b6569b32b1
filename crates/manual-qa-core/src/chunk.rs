//! Paragraph-boundary text chunker with overlap.
//!
//! Splits the text of one manual page into [`Chunk`]s of at most
//! `chunk_size` characters. Consecutive chunks share up to `overlap`
//! characters so that a sentence cut at a boundary still appears whole in
//! one of the two neighbours.
//!
//! # Algorithm
//!
//! 1. Split the page on `\n\n` paragraph boundaries, dropping blank ones.
//! 2. Hard-split any paragraph longer than `chunk_size - overlap - 2` at
//!    the nearest newline, then space, before the limit, so that every
//!    piece still fits after an overlap tail.
//! 3. Accumulate pieces into a buffer until adding the next one would
//!    exceed `chunk_size`.
//! 4. Flush the buffer as a chunk and seed the next buffer with the
//!    word-aligned tail (at most `overlap` chars) of the flushed chunk.
//!
//! All lengths are measured in chars, not bytes.
//!
//! # Example
//!
//! ```rust
//! use manual_qa_core::chunk::{chunk_page, PageMeta};
//!
//! let meta = PageMeta::new("manual.pdf", 3);
//! let chunks = chunk_page(&meta, "Hello world.\n\nSecond paragraph.", 1000, 200, 0);
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].page, 3);
//! ```

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::models::Chunk;

/// Provenance shared by every chunk cut from the same page.
#[derive(Debug, Clone, Default)]
pub struct PageMeta {
    pub source: String,
    pub page: u32,
    pub heading: Option<String>,
    pub has_images: bool,
    pub image_count: u32,
}

impl PageMeta {
    pub fn new(source: &str, page: u32) -> Self {
        Self {
            source: source.to_string(),
            page,
            ..Default::default()
        }
    }
}

/// Split one page of text into overlapping chunks.
///
/// `start_index` is the `chunk_index` given to the first chunk, so that
/// indices stay contiguous across the pages of a document.
///
/// # Guarantees
///
/// - Every chunk is at most `chunk_size` chars long.
/// - Blank text yields no chunks.
/// - Indices are contiguous from `start_index`.
pub fn chunk_page(
    meta: &PageMeta,
    text: &str,
    chunk_size: usize,
    overlap: usize,
    start_index: i64,
) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size.saturating_sub(1));

    let piece_max = if overlap == 0 {
        chunk_size
    } else {
        chunk_size.saturating_sub(overlap + 2).max(1)
    };

    let mut pieces: Vec<&str> = Vec::new();
    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }
        if char_len(trimmed) > piece_max {
            pieces.extend(hard_split(trimmed, piece_max));
        } else {
            pieces.push(trimmed);
        }
    }

    let mut texts: Vec<String> = Vec::new();
    let mut buf = String::new();

    for piece in pieces {
        if !buf.is_empty() && char_len(&buf) + 2 + char_len(piece) > chunk_size {
            let tail = overlap_tail(&buf, overlap);
            texts.push(std::mem::take(&mut buf));
            if !tail.is_empty() && char_len(&tail) + 2 + char_len(piece) <= chunk_size {
                buf = tail;
            }
        }

        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(piece);
    }

    if !buf.is_empty() {
        texts.push(buf);
    }

    texts
        .into_iter()
        .enumerate()
        .map(|(i, t)| make_chunk(meta, start_index + i as i64, &t))
        .collect()
}

/// Detect a section heading among the first lines of a page.
///
/// A heading is a short line (under 100 chars) that is either numbered
/// (`3.2 Reset Procedure`) or written in upper case (`TROUBLESHOOTING`).
pub fn detect_heading(text: &str) -> Option<String> {
    static NUMBERED: OnceLock<Regex> = OnceLock::new();
    let numbered = NUMBERED.get_or_init(|| {
        Regex::new(r"^\d+(\.\d+)*\.?\s+\p{L}").expect("static heading regex")
    });

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(10)
        .find(|line| {
            let len = char_len(line);
            if !(3..100).contains(&len) {
                return false;
            }
            let has_alpha = line.chars().any(|c| c.is_alphabetic());
            let upper = has_alpha && !line.chars().any(|c| c.is_lowercase());
            numbered.is_match(line) || upper
        })
        .map(|l| l.to_string())
}

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `n`th char, or `s.len()` when `s` is shorter.
pub(crate) fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn hard_split(text: &str, max_chars: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if char_len(remaining) <= max_chars {
            out.push(remaining.trim());
            break;
        }
        let limit = byte_offset(remaining, max_chars);
        let split_at = remaining[..limit]
            .rfind('\n')
            .or_else(|| remaining[..limit].rfind(' '))
            .filter(|&pos| pos > 0)
            .map(|pos| pos + 1)
            .unwrap_or(limit);
        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            out.push(piece);
        }
        remaining = remaining[split_at..].trim_start();
    }
    out
}

/// The last `overlap` chars of `text`, advanced to a word boundary.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    let len = char_len(text);
    if len <= overlap {
        return String::new();
    }
    let start = byte_offset(text, len - overlap);
    let tail = &text[start..];
    let aligned = if text[..start].ends_with(char::is_whitespace) {
        tail
    } else {
        match tail.find(char::is_whitespace) {
            Some(pos) => &tail[pos..],
            None => "",
        }
    };
    aligned.trim().to_string()
}

fn make_chunk(meta: &PageMeta, index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        source: meta.source.clone(),
        page: meta.page,
        heading: meta.heading.clone(),
        has_images: meta.has_images,
        image_count: meta.image_count,
        chunk_index: index,
        content: text.to_string(),
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> PageMeta {
        PageMeta::new("manual.pdf", 4)
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_page(&meta(), "Hello, world!", 1000, 200, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].content, "Hello, world!");
        assert_eq!(chunks[0].source, "manual.pdf");
        assert_eq!(chunks[0].page, 4);
    }

    #[test]
    fn test_blank_text_yields_nothing() {
        assert!(chunk_page(&meta(), "", 1000, 200, 0).is_empty());
        assert!(chunk_page(&meta(), "  \n\n \n", 1000, 200, 0).is_empty());
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let text = (0..80)
            .map(|i| format!("Paragraph number {} talks about the pump.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_page(&meta(), &text, 120, 30, 0);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(char_len(&c.content) <= 120, "chunk too long: {}", c.content);
        }
    }

    #[test]
    fn test_indices_contiguous_from_start() {
        let text = (0..30)
            .map(|i| format!("Line {} of the maintenance section.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_page(&meta(), &text, 80, 20, 7);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, 7 + i as i64);
        }
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let text = "alpha beta gamma delta\n\nepsilon zeta eta theta\n\niota kappa lambda mu";
        let chunks = chunk_page(&meta(), text, 50, 12, 0);
        assert!(chunks.len() >= 2);
        // The second chunk starts with words from the end of the first.
        let first_words: Vec<&str> = chunks[0].content.split_whitespace().collect();
        let second_first = chunks[1].content.split_whitespace().next().unwrap();
        assert!(first_words.contains(&second_first));
    }

    #[test]
    fn test_no_overlap() {
        let text = "aaaa bbbb\n\ncccc dddd\n\neeee ffff";
        let chunks = chunk_page(&meta(), text, 10, 0, 0);
        let joined: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(joined, vec!["aaaa bbbb", "cccc dddd", "eeee ffff"]);
    }

    #[test]
    fn test_long_paragraph_hard_split_multibyte() {
        let text = "überprüfung ".repeat(200);
        let chunks = chunk_page(&meta(), &text, 100, 0, 0);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(char_len(&c.content) <= 100);
        }
    }

    #[test]
    fn test_long_single_paragraph_keeps_overlap() {
        let text = (0..600)
            .map(|i| format!("w{}", i))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = chunk_page(&meta(), &text, 1000, 200, 0);
        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            assert!(char_len(&pair[0].content) <= 1000);
            let last = pair[0].content.split_whitespace().last().unwrap();
            let next: Vec<&str> = pair[1].content.split_whitespace().collect();
            assert!(next.contains(&last), "no shared text before {:?}", next[0]);
        }
    }

    #[test]
    fn test_metadata_inherited() {
        let mut m = meta();
        m.heading = Some("5 MAINTENANCE".to_string());
        m.has_images = true;
        m.image_count = 2;
        let chunks = chunk_page(&m, "Clean the filter monthly.", 1000, 200, 0);
        assert_eq!(chunks[0].heading.as_deref(), Some("5 MAINTENANCE"));
        assert!(chunks[0].has_images);
        assert_eq!(chunks[0].image_count, 2);
    }

    #[test]
    fn test_deterministic_content_and_hash() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        let c1 = chunk_page(&meta(), text, 12, 4, 0);
        let c2 = chunk_page(&meta(), text, 12, 4, 0);
        assert_eq!(c1.len(), c2.len());
        for (a, b) in c1.iter().zip(c2.iter()) {
            assert_eq!(a.content, b.content);
            assert_eq!(a.hash, b.hash);
        }
    }

    #[test]
    fn test_detect_numbered_heading() {
        let page = "\n3.2 Reset Procedure\nHold the button for five seconds.";
        assert_eq!(detect_heading(page).as_deref(), Some("3.2 Reset Procedure"));
    }

    #[test]
    fn test_detect_upper_heading() {
        let page = "TROUBLESHOOTING\nIf the LED blinks red, check the supply.";
        assert_eq!(detect_heading(page).as_deref(), Some("TROUBLESHOOTING"));
    }

    #[test]
    fn test_detect_no_heading() {
        let page = "the unit is shipped assembled.\nremove the packaging carefully.";
        assert_eq!(detect_heading(page), None);
    }
}
