//! Citation helpers for generated answers.
//!
//! The model is asked to mark claims with `[n]` and to close with a
//! `## 参考文献` section of `[n] <file name> <uri> (p.<page>)` lines. These
//! helpers read that structure back so the CLI can audit an answer.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Headings that open the references section.
const REFERENCE_HEADINGS: &[&str] = &["## 参考文献", "## References"];

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{1,4})\]").unwrap_or_else(|_| unreachable!()));

static REFERENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[(\d{1,4})\]\s*(.+?)\s*$").unwrap_or_else(|_| unreachable!())
});

static PAGE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[(（]p\.?\s*(\d+)[)）]\s*$").unwrap_or_else(|_| unreachable!())
});

static URI_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:s3|https?)://").unwrap_or_else(|_| unreachable!()));

/// Returns the last path segment of a URI (`s3://b/dir/file.pdf` → `file.pdf`).
#[must_use]
pub fn file_name_from_uri(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// One entry of the references section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Citation number.
    pub number: u32,
    /// Display name of the source file.
    pub file_name: String,
    /// Source URI, when the line contains one.
    pub uri: Option<String>,
    /// Page annotation.
    pub page: Option<i64>,
}

/// Splits an answer into body and references section.
fn split_references(answer: &str) -> (&str, Option<&str>) {
    REFERENCE_HEADINGS
        .iter()
        .filter_map(|h| answer.find(h).map(|pos| (pos, h.len())))
        .min_by_key(|&(pos, _)| pos)
        .map_or((answer, None), |(pos, len)| {
            (&answer[..pos], Some(&answer[pos + len..]))
        })
}

/// Citation numbers used in the answer body, in order of first use.
#[must_use]
pub fn extract_markers(answer: &str) -> Vec<u32> {
    let (body, _) = split_references(answer);
    let mut seen = Vec::new();
    for caps in MARKER.captures_iter(body) {
        if let Ok(n) = caps[1].parse::<u32>() {
            if !seen.contains(&n) {
                seen.push(n);
            }
        }
    }
    seen
}

/// Parses the references section of an answer.
#[must_use]
pub fn parse_references(answer: &str) -> Vec<Reference> {
    let Some(section) = split_references(answer).1 else {
        return Vec::new();
    };

    section
        .lines()
        .filter_map(|line| {
            let caps = REFERENCE_LINE.captures(line)?;
            let number = caps[1].parse().ok()?;
            let mut rest = caps[2].to_string();

            let page = PAGE_SUFFIX.captures(&rest).and_then(|c| c[1].parse().ok());
            if let Some(m) = PAGE_SUFFIX.find(&rest) {
                rest.truncate(m.start());
            }

            let (label, uri) = match URI_START.find(&rest) {
                Some(m) => (
                    rest[..m.start()].trim().trim_end_matches(['-', '–', ':']).trim(),
                    Some(rest[m.start()..].trim().to_string()),
                ),
                None => (rest.trim(), None),
            };

            let file_name = if label.is_empty() {
                uri.as_deref().map(file_name_from_uri).unwrap_or_default()
            } else {
                label
            }
            .to_string();

            Some(Reference {
                number,
                file_name,
                uri,
                page,
            })
        })
        .collect()
}

/// Consistency report between inline markers and the references section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitationAudit {
    /// Markers in order of first use.
    pub markers: Vec<u32>,
    /// Parsed reference entries.
    pub references: Vec<Reference>,
    /// Markers with no reference entry.
    pub unresolved: Vec<u32>,
    /// Whether markers are numbered `1..=n` in order of first use.
    pub ordered: bool,
}

impl CitationAudit {
    /// Audits an answer.
    #[must_use]
    pub fn of(answer: &str) -> Self {
        let markers = extract_markers(answer);
        let references = parse_references(answer);
        let unresolved = markers
            .iter()
            .copied()
            .filter(|n| !references.iter().any(|r| r.number == *n))
            .collect();
        let ordered = markers
            .iter()
            .zip(1u32..)
            .all(|(&marker, expected)| marker == expected);
        Self {
            markers,
            references,
            unresolved,
            ordered,
        }
    }

    /// Whether every marker resolves and numbering follows first use.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unresolved.is_empty() && self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANSWER: &str = "太陽光発電は光を電気に変換します[1]。インバーターで交流に変換します[2]。\
効率は15-20%です[1]。\n\n## 参考文献\n\
[1] solar-basics.pdf s3://kb-docs/energy/solar-basics.pdf (p.4)\n\
[2] s3://kb-docs/energy/Inverter Guide (2).pdf\n";

    #[test]
    fn test_file_name_from_uri() {
        assert_eq!(file_name_from_uri("s3://bucket/path/file.pdf"), "file.pdf");
        assert_eq!(file_name_from_uri("s3://bucket/dir/"), "dir");
        assert_eq!(file_name_from_uri("file.pdf"), "file.pdf");
    }

    #[test]
    fn test_markers_in_first_use_order() {
        assert_eq!(extract_markers(ANSWER), vec![1, 2]);
    }

    #[test]
    fn test_parse_references() {
        let refs = parse_references(ANSWER);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].number, 1);
        assert_eq!(refs[0].file_name, "solar-basics.pdf");
        assert_eq!(refs[0].uri.as_deref(), Some("s3://kb-docs/energy/solar-basics.pdf"));
        assert_eq!(refs[0].page, Some(4));
        assert_eq!(refs[1].file_name, "Inverter Guide (2).pdf");
        assert_eq!(refs[1].uri.as_deref(), Some("s3://kb-docs/energy/Inverter Guide (2).pdf"));
        assert_eq!(refs[1].page, None);
    }

    #[test]
    fn test_audit_consistent() {
        let audit = CitationAudit::of(ANSWER);
        assert!(audit.is_consistent());
    }

    #[test]
    fn test_audit_unresolved_and_out_of_order() {
        let audit = CitationAudit::of("A[2] B[1]\n## 参考文献\n[1] a.pdf s3://b/a.pdf\n");
        assert_eq!(audit.unresolved, vec![2]);
        assert!(!audit.ordered);
        assert!(!audit.is_consistent());
    }

    #[test]
    fn test_no_references_section() {
        assert!(parse_references("no citations here").is_empty());
        assert!(CitationAudit::of("no citations here").is_consistent());
    }
}
