//! Answer post-processing: citation normalization and the Sources section.
//!
//! Inline citations such as `(Document: manual.pdf, Page: 12)` or
//! `Source: manual.pdf, page 12` are rewritten to `[manual.pdf, page 12]`.
//! A `Sources:` section listing each distinct document with its sorted,
//! de-duplicated pages is then appended, unless the answer already has one.
//!
//! [`post_process`] is idempotent: running it on its own output changes
//! nothing.

use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::models::ContextItem;

/// Heading of the appended source listing. Also the idempotency guard.
pub const SOURCES_MARKER: &str = "Sources:";

/// A bracket is consumed only together with its matching closer.
fn inline_citation() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let body = r"(?:document|source):\s*([^,\n()\[\]]+?),\s*page:?\s*(\d+)";
        let pattern = format!(r"(?i)\({body}\)|\[{body}\]|\b{body}");
        Regex::new(&pattern).expect("static citation regex")
    })
}

/// Rewrite inline citations to the `[document, page N]` form.
pub fn normalize_citations(answer: &str) -> String {
    inline_citation()
        .replace_all(answer, |caps: &Captures| {
            let group = |i: usize| caps.get(i).or(caps.get(i + 2)).or(caps.get(i + 4));
            match (group(1), group(2)) {
                (Some(doc), Some(page)) => format!("[{}, page {}]", doc.as_str(), page.as_str()),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// True if some line of `answer` starts with the `Sources:` heading.
pub fn has_sources_section(answer: &str) -> bool {
    let marker = SOURCES_MARKER.to_lowercase();
    answer
        .lines()
        .any(|line| line.trim_start().to_lowercase().starts_with(&marker))
}

/// Render the `Sources:` listing for `context`.
///
/// Documents appear in first-seen order; pages are sorted ascending.
/// Returns an empty string for empty context.
pub fn sources_section(context: &[ContextItem]) -> String {
    let mut docs: Vec<(&str, BTreeSet<u32>)> = Vec::new();
    for item in context {
        match docs.iter_mut().find(|(s, _)| *s == item.source) {
            Some((_, pages)) => {
                pages.insert(item.page);
            }
            None => docs.push((item.source.as_str(), BTreeSet::from([item.page]))),
        }
    }

    if docs.is_empty() {
        return String::new();
    }

    let mut out = String::from(SOURCES_MARKER);
    for (source, pages) in docs {
        let list: Vec<String> = pages.iter().map(|p| p.to_string()).collect();
        let label = if list.len() == 1 { "page" } else { "pages" };
        out.push_str(&format!("\n- {}: {} {}", source, label, list.join(", ")));
    }
    out
}

/// Normalize citations and append the sources section once.
pub fn post_process(answer: &str, context: &[ContextItem]) -> String {
    let normalized = normalize_citations(answer.trim_end());
    if has_sources_section(&normalized) {
        return normalized;
    }
    let section = sources_section(context);
    if section.is_empty() {
        return normalized;
    }
    format!("{}\n\n{}", normalized, section)
}
