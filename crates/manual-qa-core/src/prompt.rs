//! Context-window-aware prompt assembly.
//!
//! Each [`ContextItem`] is rendered as an excerpt wrapped in start/end
//! markers naming its source and page, so the model can cite it:
//!
//! ```text
//! --- START EXCERPT FROM manual.pdf, PAGE 12, SECTION: 4.1 Reset ---
//! Hold the reset button for five seconds...
//! --- END EXCERPT FROM manual.pdf, PAGE 12 ---
//! ```
//!
//! # Packing
//!
//! Excerpts are packed in descending relevance order into a buffer bounded
//! by the context window (in chars). An excerpt that would overflow the
//! buffer is skipped, and later, smaller excerpts may still fit. The first
//! excerpt is always included: if it alone exceeds the window it is cut to
//! exactly the window size.
//!
//! Every excerpt body is capped at [`EXCERPT_CHAR_LIMIT`] chars plus
//! [`ELLIPSIS`] before packing.

use crate::chunk::{byte_offset, char_len};
use crate::models::ContextItem;
use crate::rank::sort_by_relevance;

/// Maximum chars of a single excerpt body before the ellipsis.
pub const EXCERPT_CHAR_LIMIT: usize = 1450;

/// Marker appended to a truncated excerpt body.
pub const ELLIPSIS: &str = "...";

const EXCERPT_SEPARATOR: &str = "\n\n";

/// Answer used by the model when the excerpts do not cover the question.
pub const NOT_IN_CONTEXT: &str =
    "I don't have enough information about that in the documentation.";

/// Packs ranked context into a bounded prompt.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    context_window: usize,
}

impl PromptAssembler {
    /// `context_window` is the maximum length of the packed excerpts, in chars.
    pub fn new(context_window: usize) -> Self {
        Self { context_window }
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    /// Build the full prompt for `query` from `items`.
    pub fn assemble(&self, query: &str, items: &[ContextItem]) -> String {
        let context = self.pack(items);
        format!(
            "You are an AI assistant for technical device documentation.\n\
             Answer the following question based only on the context provided below.\n\
             If the answer is not in the context, say \"{}\"\n\
             Always cite the source document and page number, in the form [document, page N].\n\
             \n\
             Context:\n\
             {}\n\
             \n\
             Question: {}\n\
             \n\
             Answer:",
            NOT_IN_CONTEXT, context, query
        )
    }

    /// Pack excerpts into a string of at most `context_window` chars.
    pub fn pack(&self, items: &[ContextItem]) -> String {
        let mut ordered: Vec<ContextItem> = items.to_vec();
        sort_by_relevance(&mut ordered);

        let budget = self.context_window;
        let sep_len = char_len(EXCERPT_SEPARATOR);
        let mut buf = String::new();
        let mut buf_len = 0usize;
        let mut included = 0usize;

        for item in &ordered {
            let excerpt = format_excerpt(item);
            let excerpt_len = char_len(&excerpt);

            if included == 0 {
                if excerpt_len > budget {
                    buf.push_str(truncate_chars(&excerpt, budget));
                    buf_len = budget;
                } else {
                    buf.push_str(&excerpt);
                    buf_len = excerpt_len;
                }
                included += 1;
                continue;
            }

            if buf_len + sep_len + excerpt_len > budget {
                tracing::debug!(
                    source = %item.source,
                    page = item.page,
                    "excerpt skipped: context window full"
                );
                continue;
            }

            buf.push_str(EXCERPT_SEPARATOR);
            buf.push_str(&excerpt);
            buf_len += sep_len + excerpt_len;
            included += 1;
        }

        tracing::debug!(included, total = ordered.len(), chars = buf_len, "context packed");
        buf
    }
}

/// Render one context item with its citation markers.
pub fn format_excerpt(item: &ContextItem) -> String {
    let mut header = format!("--- START EXCERPT FROM {}, PAGE {}", item.source, item.page);
    if let Some(heading) = item.heading.as_deref().filter(|h| !h.is_empty()) {
        header.push_str(", SECTION: ");
        header.push_str(heading);
    }
    header.push_str(" ---");

    let body = if char_len(&item.content) > EXCERPT_CHAR_LIMIT {
        format!("{}{}", truncate_chars(&item.content, EXCERPT_CHAR_LIMIT), ELLIPSIS)
    } else {
        item.content.clone()
    };

    format!(
        "{}\n{}\n--- END EXCERPT FROM {}, PAGE {} ---",
        header, body, item.source, item.page
    )
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    &s[..byte_offset(s, max_chars)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: &str, page: u32, content: &str, relevance: f64) -> ContextItem {
        ContextItem {
            content: content.to_string(),
            source: source.to_string(),
            page,
            heading: None,
            relevance,
            has_images: false,
            image_count: 0,
        }
    }

    #[test]
    fn test_markers_present() {
        let items = vec![
            item("manual.pdf", 12, "Hold reset for five seconds.", 0.8),
            item("guide.pdf", 3, "Unplug the unit first.", 0.5),
        ];
        let packed = PromptAssembler::new(8000).pack(&items);
        assert!(packed.contains("START EXCERPT FROM manual.pdf, PAGE 12"));
        assert!(packed.contains("START EXCERPT FROM guide.pdf, PAGE 3"));
        assert!(packed.contains("END EXCERPT FROM guide.pdf, PAGE 3"));
        assert!(packed.find("manual.pdf").unwrap() < packed.find("guide.pdf").unwrap());
    }

    #[test]
    fn test_heading_in_marker() {
        let mut it = item("manual.pdf", 2, "text", 0.9);
        it.heading = Some("4.1 Reset".to_string());
        let excerpt = format_excerpt(&it);
        assert!(excerpt.starts_with("--- START EXCERPT FROM manual.pdf, PAGE 2, SECTION: 4.1 Reset ---"));
    }

    #[test]
    fn test_long_excerpt_truncated_with_ellipsis() {
        let long = "x".repeat(3000);
        let excerpt = format_excerpt(&item("m.pdf", 1, &long, 0.9));
        let body = excerpt.lines().nth(1).unwrap();
        assert_eq!(char_len(body), EXCERPT_CHAR_LIMIT + ELLIPSIS.len());
        assert!(body.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_output_within_budget() {
        let items: Vec<ContextItem> = (0..20)
            .map(|i| item(&format!("doc{}.pdf", i), i, &"word ".repeat(40 + i as usize * 7), 1.0 - i as f64 * 0.01))
            .collect();
        for budget in [300usize, 500, 1000, 2500] {
            let packed = PromptAssembler::new(budget).pack(&items);
            assert!(char_len(&packed) <= budget, "budget {} exceeded", budget);
            assert!(packed.contains("START EXCERPT FROM doc0.pdf"));
        }
    }

    #[test]
    fn test_forced_first_truncated_to_exact_budget() {
        let items = vec![item("big.pdf", 1, &"y".repeat(1200), 0.9)];
        let packed = PromptAssembler::new(100).pack(&items);
        assert_eq!(char_len(&packed), 100);
        assert!(packed.starts_with("--- START EXCERPT FROM big.pdf"));
    }

    #[test]
    fn test_skips_oversized_but_keeps_later_small() {
        let items = vec![
            item("a.pdf", 1, "short", 0.9),
            item("b.pdf", 1, &"z".repeat(500), 0.8),
            item("c.pdf", 1, "tiny", 0.7),
        ];
        let packed = PromptAssembler::new(250).pack(&items);
        assert!(packed.contains("a.pdf"));
        assert!(!packed.contains("b.pdf"));
        assert!(packed.contains("c.pdf"));
    }

    #[test]
    fn test_packs_by_relevance_not_input_order() {
        let items = vec![item("low.pdf", 1, "l", 0.2), item("high.pdf", 1, "h", 0.9)];
        let packed = PromptAssembler::new(8000).pack(&items);
        assert!(packed.find("high.pdf").unwrap() < packed.find("low.pdf").unwrap());
    }

    #[test]
    fn test_empty_items_empty_context() {
        assert!(PromptAssembler::new(100).pack(&[]).is_empty());
    }

    #[test]
    fn test_assemble_contains_question() {
        let prompt = PromptAssembler::new(8000)
            .assemble("How do I reset the device?", &[item("m.pdf", 1, "Hold reset.", 0.9)]);
        assert!(prompt.contains("Question: How do I reset the device?"));
        assert!(prompt.contains("START EXCERPT FROM m.pdf, PAGE 1"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_multibyte_truncation_safe() {
        let items = vec![item("ü.pdf", 1, &"ä".repeat(2000), 0.9)];
        let packed = PromptAssembler::new(77).pack(&items);
        assert_eq!(char_len(&packed), 77);
    }
}
