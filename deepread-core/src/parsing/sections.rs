//! Section and bullet extraction from free-text completions.
//!
//! Structured reports ask the model for numbered sections such as
//! `2. KEY FINDINGS`. Extraction is best-effort: a missing section yields an
//! empty string, and a section written without bullet markers still yields
//! its lines.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-•*]\s+").unwrap());

/// Pattern for a numbered heading carrying `label`, e.g. `3. DETAILED ANALYSIS`.
///
/// The heading must open its line. Markdown decorations such as
/// `## 1. EXECUTIVE SUMMARY` or `**1. EXECUTIVE SUMMARY**` still match, but a
/// label mentioned mid-sentence does not.
fn numbered_label(label: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(
        r"^[ \t]*(?:[#*]+[ \t]*)?\d+\.[ \t]+{}",
        regex::escape(label)
    ))
    .case_insensitive(true)
    .multi_line(true)
    .build()
    .ok()
}

/// Text between the `start` heading line and the next `end` heading line.
///
/// With no `end` label, or when the `end` heading never appears after the
/// start, the section runs to the end of `text`. Returns an empty string if
/// the start heading is absent.
pub fn extract_section(text: &str, start: &str, end: Option<&str>) -> String {
    let Some(start_pattern) = numbered_label(start) else {
        return String::new();
    };
    let Some(heading) = start_pattern.find(text) else {
        return String::new();
    };

    // The section starts on the line after the heading.
    let Some(newline) = text[heading.end()..].find('\n') else {
        return String::new();
    };
    let body_start = heading.end() + newline + 1;
    let rest = &text[body_start..];

    let body_end = end
        .and_then(numbered_label)
        .and_then(|pattern| pattern.find(rest))
        .map_or(rest.len(), |m| m.start());

    rest[..body_end].trim().to_string()
}

/// Bullet items of a section, markers stripped.
///
/// Falls back to every non-blank line of the section, unmodified, when no
/// line carries a bullet marker.
pub fn extract_bullets(text: &str, start: &str, end: Option<&str>) -> Vec<String> {
    let section = extract_section(text, start, end);

    let bullets: Vec<String> = section
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            BULLET
                .find(trimmed)
                .map(|m| trimmed[m.end()..].to_string())
        })
        .collect();

    if !bullets.is_empty() {
        return bullets;
    }

    section
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
