//! Property-based tests for the response parsers using proptest.

use proptest::prelude::*;

use deepread_core::parsing::reader::{RESERVED_PREFIXES, is_header_line};
use deepread_core::parsing::search::DESCRIPTION_CHAR_LIMIT;
use deepread_core::parsing::{
    extract_bullets, extract_section, parse_reader_response, parse_search_response,
};
use deepread_core::types::UNTITLED;

/// Text that can't be mistaken for a header, marker or bullet line.
fn plain_line() -> impl Strategy<Value = String> {
    "[a-z][a-z ]{0,30}"
}

fn block(index: usize, title: &str, url: Option<&str>, description: Option<&str>) -> String {
    let mut out = format!("[{index}] Title: {title}\n");
    if let Some(url) = url {
        out.push_str(&format!("[{index}] URL Source: {url}\n"));
    }
    if let Some(description) = description {
        out.push_str(&format!("[{index}] Description: {description}\n"));
    }
    out.push('\n');
    out
}

// --- Idempotence ---

proptest! {
    #[test]
    fn search_parse_is_idempotent(raw in ".{0,400}") {
        prop_assert_eq!(parse_search_response(&raw), parse_search_response(&raw));
    }

    #[test]
    fn reader_parse_is_idempotent(raw in ".{0,400}", url in "https://[a-z]{1,10}\\.com/[a-z]{0,8}") {
        prop_assert_eq!(parse_reader_response(&raw, &url), parse_reader_response(&raw, &url));
    }

    #[test]
    fn section_extraction_is_idempotent(raw in "(\\d\\. [A-Z ]{1,12}\n)?.{0,200}") {
        prop_assert_eq!(
            extract_section(&raw, "KEY FINDINGS", Some("DETAILED ANALYSIS")),
            extract_section(&raw, "KEY FINDINGS", Some("DETAILED ANALYSIS"))
        );
        prop_assert_eq!(
            extract_bullets(&raw, "KEY FINDINGS", None),
            extract_bullets(&raw, "KEY FINDINGS", None)
        );
    }
}

// --- Search listing properties ---

proptest! {
    #[test]
    fn search_keeps_every_block_with_a_url(
        blocks in proptest::collection::vec((plain_line(), any::<bool>(), proptest::option::of(plain_line())), 0..12)
    ) {
        let mut raw = String::new();
        let mut expected_titles = Vec::new();
        for (i, (title, has_url, description)) in blocks.iter().enumerate() {
            let url = format!("https://example.com/{i}");
            raw.push_str(&block(i + 1, title, has_url.then_some(url.as_str()), description.as_deref()));
            if *has_url {
                let title = title.trim();
                expected_titles.push(if title.is_empty() { UNTITLED.to_string() } else { title.to_string() });
            }
        }

        let results = parse_search_response(&raw);
        let titles: Vec<String> = results.iter().map(|r| r.title.clone()).collect();
        prop_assert_eq!(titles, expected_titles);
        prop_assert!(results.iter().all(|r| !r.url.is_empty()));
    }

    #[test]
    fn structured_description_is_prefix_plus_ellipsis(content in ".{0,600}") {
        let raw = serde_json::json!({
            "data": [{"title": "T", "url": "https://example.com", "content": content}]
        })
        .to_string();
        let results = parse_search_response(&raw);
        prop_assert_eq!(results.len(), 1);
        let expected: String = content.chars().take(DESCRIPTION_CHAR_LIMIT).collect::<String>() + "...";
        prop_assert_eq!(&results[0].description, &expected);
    }
}

// --- Reader properties ---

proptest! {
    #[test]
    fn reader_body_never_contains_header_lines(
        lines in proptest::collection::vec(
            prop_oneof![
                plain_line(),
                plain_line().prop_map(|s| format!("Title: {s}")),
                plain_line().prop_map(|s| format!("URL Source: {s}")),
                plain_line().prop_map(|s| format!("Published Time: {s}")),
                Just("Markdown Content:".to_string()),
                (" {1,4}", plain_line()).prop_map(|(pad, s)| format!("{pad}Title: {s}")),
                ("[ \t]{1,3}", plain_line()).prop_map(|(pad, s)| format!("{pad}URL Source: {s}")),
            ],
            0..30,
        )
    ) {
        let raw = lines.join("\n");
        let doc = parse_reader_response(&raw, "https://example.com");
        prop_assert!(doc.body.lines().all(|l| !is_header_line(l)));
        prop_assert!(doc.body.lines().all(|l| !RESERVED_PREFIXES.iter().any(|p| l.trim_start().starts_with(p))));
        prop_assert_eq!(doc.url, "https://example.com");
    }

    #[test]
    fn reader_title_outside_scan_window_is_ignored(
        filler in proptest::collection::vec(plain_line(), 10..20),
        title in plain_line(),
    ) {
        let raw = format!("{}\nTitle: {title}", filler.join("\n"));
        let doc = parse_reader_response(&raw, "https://example.com");
        prop_assert_eq!(doc.title, UNTITLED);
    }
}

// --- Section properties ---

proptest! {
    #[test]
    fn plain_section_lines_come_back_verbatim(lines in proptest::collection::vec("[a-z][a-z ]{0,20}[a-z]", 1..6)) {
        let text = format!(
            "1. EXECUTIVE SUMMARY\nintro\n2. KEY FINDINGS\n{}\n3. DETAILED ANALYSIS\nrest",
            lines.join("\n")
        );
        let bullets = extract_bullets(&text, "KEY FINDINGS", Some("DETAILED ANALYSIS"));
        prop_assert_eq!(bullets, lines);
    }
}
