//! Output formatting for CLI commands.

use std::fmt::Write as _;

use crate::agent::citation::CitationAudit;
use crate::retrieval::{Page, RetrievalResponse};

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

fn page_label(page: Page) -> String {
    match page {
        Page::Number(n) => format!("p.{n}"),
        Page::Fractional(f) => format!("p.{f}"),
    }
}

/// Formats a search response as a numbered list.
#[must_use]
pub fn format_search(response: &RetrievalResponse, preview_len: usize) -> String {
    let mut out = String::new();
    if let Some(error) = &response.error {
        let _ = writeln!(out, "Search failed: {error}");
        return out;
    }
    if response.results.is_empty() {
        out.push_str("No results.\n");
        return out;
    }

    for (i, item) in response.results.iter().enumerate() {
        let source = item.file_name().unwrap_or("(unknown source)");
        let _ = write!(out, "[{}] {source}  score={:.4}", i + 1, item.score);
        if let Some(page) = item.page {
            let _ = write!(out, "  {}", page_label(page));
        }
        out.push('\n');
        if let Some(uri) = &item.uri {
            let _ = writeln!(out, "    {uri}");
        }
        let preview: String = item.content.chars().take(preview_len).collect();
        let ellipsis = if item.content.chars().count() > preview_len {
            "…"
        } else {
            ""
        };
        let _ = writeln!(out, "    {}{ellipsis}", preview.replace('\n', " "));
    }
    out
}

/// Formats the citation audit footer printed after an answer.
#[must_use]
pub fn format_audit(audit: &CitationAudit) -> String {
    let mut out = format!(
        "\n---\nCitations: {} marker(s), {} reference(s)",
        audit.markers.len(),
        audit.references.len()
    );
    if !audit.unresolved.is_empty() {
        let list: Vec<String> = audit.unresolved.iter().map(|n| format!("[{n}]")).collect();
        let _ = write!(out, " | unresolved: {}", list.join(" "));
    }
    if !audit.ordered {
        out.push_str(" | numbering does not follow first use");
    }
    out.push('\n');
    out
}
