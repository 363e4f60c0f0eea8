//! Reader provider response parsing.
//!
//! The reader service returns page text prefixed with metadata headers:
//!
//! ```text
//! Title: <page title>
//! URL Source: <resolved url>
//! Published Time: <timestamp>
//! Markdown Content:
//! <body...>
//! ```
//!
//! Headers are only looked for near the top of the text; the header lines
//! themselves are removed from the whole body.

use crate::types::{DocumentRecord, UNTITLED};

/// How many leading lines are scanned for the title and publish time.
pub const HEADER_SCAN_LINES: usize = 10;

const TITLE_PREFIX: &str = "Title: ";
const URL_SOURCE_PREFIX: &str = "URL Source: ";
const PUBLISHED_PREFIX: &str = "Published Time: ";
const CONTENT_PREFIX: &str = "Markdown Content:";

/// Line prefixes that never appear in a document body.
pub const RESERVED_PREFIXES: [&str; 4] =
    [TITLE_PREFIX, URL_SOURCE_PREFIX, PUBLISHED_PREFIX, CONTENT_PREFIX];

/// Build a [`DocumentRecord`] from raw reader text.
///
/// `requested_url` becomes the record's URL; the provider's own
/// `URL Source:` header is discarded.
pub fn parse_reader_response(raw: &str, requested_url: &str) -> DocumentRecord {
    let lines: Vec<&str> = raw.split('\n').collect();

    let mut title = None;
    let mut published_time = None;
    for line in lines.iter().take(HEADER_SCAN_LINES) {
        let line = line.trim();
        if let Some(value) = line.strip_prefix(TITLE_PREFIX) {
            title = Some(value.to_string());
        } else if let Some(value) = line.strip_prefix(PUBLISHED_PREFIX) {
            published_time = Some(value.to_string());
        }
    }

    let body = lines
        .iter()
        .filter(|line| !is_header_line(line))
        .copied()
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    DocumentRecord {
        title: title.unwrap_or_else(|| UNTITLED.to_string()),
        url: requested_url.to_string(),
        published_time,
        body,
    }
}

/// Whether a line, ignoring leading whitespace, starts with one of the
/// [`RESERVED_PREFIXES`].
pub fn is_header_line(line: &str) -> bool {
    let line = line.trim_start();
    RESERVED_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_headers() {
        let raw = "Title: X\nURL Source: Y\nPublished Time: Z\nMarkdown Content:\nBody line 1\nBody line 2";
        let doc = parse_reader_response(raw, "https://requested.example");
        assert_eq!(doc.title, "X");
        assert_eq!(doc.published_time.as_deref(), Some("Z"));
        assert_eq!(doc.body, "Body line 1\nBody line 2");
        assert_eq!(doc.url, "https://requested.example");
    }

    #[test]
    fn test_url_source_header_is_not_used() {
        let raw = "Title: T\nURL Source: https://redirected.example\n\nBody";
        let doc = parse_reader_response(raw, "https://original.example");
        assert_eq!(doc.url, "https://original.example");
        assert!(!doc.body.contains("redirected"));
    }

    #[test]
    fn test_title_defaults_when_missing() {
        let doc = parse_reader_response("Just a body\nwith two lines", "https://a.example");
        assert_eq!(doc.title, UNTITLED);
        assert_eq!(doc.published_time, None);
        assert_eq!(doc.body, "Just a body\nwith two lines");
    }

    #[test]
    fn test_title_after_scan_window_is_ignored_but_stripped() {
        let mut raw = String::new();
        for i in 0..HEADER_SCAN_LINES {
            raw.push_str(&format!("line {i}\n"));
        }
        raw.push_str("Title: Too Late\nlast line");

        let doc = parse_reader_response(&raw, "https://a.example");
        assert_eq!(doc.title, UNTITLED);
        assert!(!doc.body.contains("Too Late"));
        assert!(doc.body.ends_with("last line"));
    }

    #[test]
    fn test_title_on_tenth_line_is_found() {
        let mut raw = String::new();
        for i in 0..HEADER_SCAN_LINES - 1 {
            raw.push_str(&format!("line {i}\n"));
        }
        raw.push_str("Title: Just In Time\nbody");
        let doc = parse_reader_response(&raw, "https://a.example");
        assert_eq!(doc.title, "Just In Time");
    }

    #[test]
    fn test_indented_header_lines_are_stripped() {
        let raw = "  Title: Padded\nURL Source: x\n\t Published Time: soon\nbody";
        let doc = parse_reader_response(raw, "https://a.example");
        assert_eq!(doc.title, "Padded");
        assert_eq!(doc.published_time.as_deref(), Some("soon"));
        assert_eq!(doc.body, "body");
        assert!(!doc.body.lines().any(is_header_line));
    }

    #[test]
    fn test_body_header_lines_removed_everywhere() {
        let raw = "Title: A\nMarkdown Content:\nintro\nURL Source: inline\nPublished Time: later\nouter";
        let doc = parse_reader_response(raw, "https://a.example");
        assert_eq!(doc.body, "intro\nouter");
        for prefix in RESERVED_PREFIXES {
            assert!(!doc.body.lines().any(|l| l.starts_with(prefix)));
        }
    }

    #[test]
    fn test_markdown_content_line_with_trailing_text() {
        assert!(is_header_line("Markdown Content: (truncated)"));
        assert!(!is_header_line("Titles: plural"));
        assert!(!is_header_line("Title:no-space"));
        assert!(is_header_line("   URL Source: indented"));
    }

    #[test]
    fn test_empty_input() {
        let doc = parse_reader_response("", "https://empty.example");
        assert_eq!(doc.title, UNTITLED);
        assert_eq!(doc.body, "");
    }

    #[test]
    fn test_parse_is_repeatable() {
        let raw = "Title: Same\nPublished Time: now\nMarkdown Content:\nbody";
        assert_eq!(
            parse_reader_response(raw, "https://a.example"),
            parse_reader_response(raw, "https://a.example")
        );
    }
}
