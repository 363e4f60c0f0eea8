//! Search provider response parsing.
//!
//! The search endpoint answers in one of two shapes depending on the
//! requested format:
//!
//! - a line-oriented listing where each result is a block of `[N] Title: `,
//!   `[N] URL Source: `, `[N] Description: ` and `[N] Date: ` lines, or
//! - a JSON object with a `data` array of `{title, url, content}` entries.
//!
//! [`SearchResponseParser::parse`] sniffs the shape and never fails: lines it
//! does not recognize are skipped and blocks without a URL are dropped.

use crate::types::{NO_DESCRIPTION, SearchResultRecord, UNTITLED};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Number of characters of structured `content` kept in a description.
pub const DESCRIPTION_CHAR_LIMIT: usize = 300;

const ELLIPSIS: &str = "...";

static DEFAULT_PARSER: LazyLock<SearchResponseParser> = LazyLock::new(SearchResponseParser::new);

/// Parse a raw search payload with the shared default parser.
pub fn parse_search_response(raw: &str) -> Vec<SearchResultRecord> {
    DEFAULT_PARSER.parse(raw)
}

/// The payload shapes the search provider is known to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPayloadFormat {
    /// Numbered `[N] Field: value` blocks.
    Lines,
    /// JSON object with a `data` array.
    Structured,
}

impl SearchPayloadFormat {
    /// Decide which shape a payload has. Anything that is not a JSON object
    /// with a `data` array is treated as the line format.
    pub fn sniff(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if !trimmed.starts_with('{') {
            return SearchPayloadFormat::Lines;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value) if value.get("data").is_some_and(Value::is_array) => {
                SearchPayloadFormat::Structured
            }
            _ => SearchPayloadFormat::Lines,
        }
    }
}

/// Fields collected for the block currently being read.
#[derive(Debug, Default)]
struct PendingBlock {
    title: String,
    url: Option<String>,
    description: Option<String>,
    date: Option<String>,
}

impl PendingBlock {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    /// Finish the block. Blocks without a URL produce nothing.
    fn finish(self) -> Option<SearchResultRecord> {
        let url = self.url.filter(|u| !u.is_empty())?;
        Some(SearchResultRecord {
            title: non_empty_or(self.title, UNTITLED),
            url,
            description: self
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            published_date: self.date.filter(|d| !d.is_empty()),
        })
    }
}

/// Converts raw search payloads into ranked [`SearchResultRecord`]s.
pub struct SearchResponseParser {
    title: Regex,
    url: Regex,
    description: Regex,
    date: Regex,
}

impl SearchResponseParser {
    pub fn new() -> Self {
        Self {
            title: marker("Title"),
            url: marker("URL Source"),
            description: marker("Description"),
            date: marker("Date"),
        }
    }

    /// Parse either payload shape, preserving provider order.
    pub fn parse(&self, raw: &str) -> Vec<SearchResultRecord> {
        match SearchPayloadFormat::sniff(raw) {
            SearchPayloadFormat::Structured => parse_structured(raw),
            SearchPayloadFormat::Lines => self.parse_lines(raw),
        }
    }

    /// Parse the line-oriented block format.
    pub fn parse_lines(&self, raw: &str) -> Vec<SearchResultRecord> {
        let mut results = Vec::new();
        let mut current: Option<PendingBlock> = None;

        for line in raw.lines() {
            let line = line.trim();

            if let Some(title) = strip_marker(&self.title, line) {
                if let Some(record) = current.take().and_then(PendingBlock::finish) {
                    results.push(record);
                }
                current = Some(PendingBlock::new(title));
                continue;
            }

            // Field lines outside a block have nothing to attach to.
            let Some(block) = current.as_mut() else {
                continue;
            };

            if let Some(url) = strip_marker(&self.url, line) {
                block.url = Some(url.to_string());
            } else if let Some(description) = strip_marker(&self.description, line) {
                block.description = Some(description.to_string());
            } else if let Some(date) = strip_marker(&self.date, line) {
                block.date = Some(date.to_string());
            }
        }

        if let Some(record) = current.and_then(PendingBlock::finish) {
            results.push(record);
        }

        results
    }
}

impl Default for SearchResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse the structured `{ "data": [...] }` format.
///
/// Entries without a URL are dropped; a payload that is not valid JSON
/// yields no results.
pub fn parse_structured(raw: &str) -> Vec<SearchResultRecord> {
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };
    let Some(entries) = value.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let url = entry.get("url").and_then(Value::as_str)?;
            if url.is_empty() {
                return None;
            }
            let title = entry.get("title").and_then(Value::as_str).unwrap_or("");
            let description = entry
                .get("content")
                .and_then(Value::as_str)
                .map(truncate_description)
                .unwrap_or_else(|| NO_DESCRIPTION.to_string());

            Some(SearchResultRecord {
                title: non_empty_or(title.to_string(), UNTITLED),
                url: url.to_string(),
                description,
                published_date: None,
            })
        })
        .collect()
}

/// First [`DESCRIPTION_CHAR_LIMIT`] characters of `content` plus an ellipsis.
///
/// The ellipsis is appended even when nothing was cut off.
pub fn truncate_description(content: &str) -> String {
    let mut description: String = content.chars().take(DESCRIPTION_CHAR_LIMIT).collect();
    description.push_str(ELLIPSIS);
    description
}

/// `[N] Field: ` at the start of a trimmed line. A field with an empty value
/// loses its trailing space to trimming, so end-of-line also counts.
fn marker(field: &str) -> Regex {
    Regex::new(&format!(r"^\[\d+\] {}:(?:\s+|$)", regex::escape(field))).unwrap()
}

fn strip_marker<'a>(pattern: &Regex, line: &'a str) -> Option<&'a str> {
    pattern.find(line).map(|m| &line[m.end()..])
}

fn non_empty_or(value: String, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value
    }
}
