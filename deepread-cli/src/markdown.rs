//! Terminal rendering for reports, search listings and reader documents.
//!
//! Markdown is turned into ANSI-styled, width-wrapped text when stdout is a
//! terminal. When it is not, the plain Markdown is printed unchanged so
//! output can be piped into a file or another tool.

use deepread_core::research::output;
use deepread_core::types::{DocumentRecord, ReportRecord, SearchResultRecord};
use std::io::IsTerminal;

/// ANSI escape codes for terminal formatting.
mod ansi {
    pub const BOLD_ON: &str = "\x1b[1m";
    pub const BOLD_OFF: &str = "\x1b[22m";
    pub const ITALIC_ON: &str = "\x1b[3m";
    pub const ITALIC_OFF: &str = "\x1b[23m";
    pub const DIM_ON: &str = "\x1b[2m";
    pub const DIM_OFF: &str = "\x1b[22m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const RESET: &str = "\x1b[0m";
    pub const UNDERLINE_ON: &str = "\x1b[4m";
}

const MAX_WIDTH: usize = 100;
const MIN_WIDTH: usize = 40;

/// Wrap width: `$COLUMNS` when set, capped for readability.
fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.parse::<usize>().ok())
        .map(|c| c.clamp(MIN_WIDTH, MAX_WIDTH))
        .unwrap_or(MAX_WIDTH)
}

fn stdout_is_styled() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Line-oriented Markdown to ANSI renderer.
pub struct TerminalMarkdownRenderer {
    width: usize,
    in_code_block: bool,
}

impl TerminalMarkdownRenderer {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            in_code_block: false,
        }
    }

    /// Render a whole Markdown document.
    pub fn render(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        for line in text.lines() {
            out.push_str(&self.render_line(line));
            out.push('\n');
        }
        self.in_code_block = false;
        out
    }

    fn render_line(&mut self, line: &str) -> String {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") {
            self.in_code_block = !self.in_code_block;
            return format!("{}{}{}", ansi::DIM_ON, line, ansi::DIM_OFF);
        }
        // Code is never wrapped or restyled.
        if self.in_code_block {
            return format!("{}{}{}", ansi::DIM_ON, line, ansi::DIM_OFF);
        }

        if trimmed.is_empty() {
            return String::new();
        }

        if let Some((level, heading)) = parse_heading(trimmed) {
            let heading = render_inline(heading);
            return match level {
                1 => format!(
                    "{}{}{}{}",
                    ansi::BOLD_ON,
                    ansi::UNDERLINE_ON,
                    heading,
                    ansi::RESET
                ),
                2 => format!("{}{}{}{}", ansi::BOLD_ON, ansi::CYAN, heading, ansi::RESET),
                _ => format!("{}{}{}", ansi::BOLD_ON, heading, ansi::BOLD_OFF),
            };
        }

        if matches!(trimmed, "---" | "***" | "___") {
            let rule = "\u{2500}".repeat(self.width.min(60));
            return format!("{}{}{}", ansi::DIM_ON, rule, ansi::DIM_OFF);
        }

        if let Some(rest) = trimmed.strip_prefix("> ") {
            let initial = format!("{}\u{2502} ", ansi::DIM_ON);
            let body = self.wrap(&render_inline(rest), &initial, "\u{2502} ");
            return format!("{body}{}", ansi::RESET);
        }

        let indent = &line[..line.len() - trimmed.len()];

        if let Some(rest) = strip_bullet(trimmed) {
            let initial = format!("{indent}  \u{2022} ");
            let subsequent = " ".repeat(indent.len() + 4);
            return self.wrap(&render_inline(rest), &initial, &subsequent);
        }

        if let Some((number, rest)) = split_numbered(trimmed) {
            let initial = format!("{indent}{}{number}.{} ", ansi::GREEN, ansi::RESET);
            let subsequent = " ".repeat(indent.len() + number.len() + 2);
            return self.wrap(&render_inline(rest), &initial, &subsequent);
        }

        self.wrap(&render_inline(trimmed), indent, indent)
    }

    fn wrap(&self, text: &str, initial_indent: &str, subsequent_indent: &str) -> String {
        let options = textwrap::Options::new(self.width)
            .initial_indent(initial_indent)
            .subsequent_indent(subsequent_indent);
        textwrap::fill(text, options)
    }
}

/// Render Markdown for stdout, styled only when stdout is a terminal.
pub fn render_markdown(text: &str) -> String {
    if stdout_is_styled() {
        TerminalMarkdownRenderer::new(terminal_width()).render(text)
    } else {
        text.to_string()
    }
}

/// Render a report the way it would be saved as Markdown.
pub fn render_report(report: &ReportRecord) -> String {
    render_markdown(&output::to_markdown(report))
}

/// Numbered search listing: title, URL, wrapped description.
pub fn render_results(results: &[SearchResultRecord]) -> String {
    render_markdown(&results_markdown(results))
}

fn results_markdown(results: &[SearchResultRecord]) -> String {
    let mut out = String::new();
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!("{}. **{}**\n", i + 1, result.title));
        out.push_str(&format!("   `{}`\n", result.url));
        if let Some(date) = &result.published_date {
            out.push_str(&format!("   *{date}*\n"));
        }
        out.push_str(&format!("   {}\n\n", result.description));
    }
    out
}

/// Reader view of a fetched document.
pub fn render_document(document: &DocumentRecord) -> String {
    render_markdown(&document_markdown(document))
}

fn document_markdown(document: &DocumentRecord) -> String {
    let mut out = format!("# {}\n\n`{}`\n", document.title, document.url);
    if let Some(published) = &document.published_time {
        out.push_str(&format!("*Published {published}*\n"));
    }
    out.push_str(&format!(
        "*{} words*\n\n---\n\n{}\n",
        document.word_count(),
        document.body
    ));
    out
}

/// Parse an ATX heading, returning its level and text.
fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    line[level..].strip_prefix(' ').map(|rest| (level, rest.trim()))
}

fn strip_bullet(line: &str) -> Option<&str> {
    if line.starts_with("**") {
        return None;
    }
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("+ "))
}

/// Split `"12. text"` into `("12", "text")`.
fn split_numbered(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || digits > 3 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

/// Apply inline formatting: **bold**, *italic*, and `inline code`.
fn render_inline(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    let mut output = String::with_capacity(len + 32);
    let mut i = 0;

    while i < len {
        if i + 1 < len
            && chars[i] == '*'
            && chars[i + 1] == '*'
            && let Some(end) = find_double_star(&chars, i + 2)
        {
            output.push_str(ansi::BOLD_ON);
            output.extend(&chars[i + 2..end]);
            output.push_str(ansi::BOLD_OFF);
            i = end + 2;
            continue;
        }

        if chars[i] == '*'
            && i + 1 < len
            && chars[i + 1] != '*'
            && chars[i + 1] != ' '
            && let Some(end) = find_single_star(&chars, i + 1)
        {
            output.push_str(ansi::ITALIC_ON);
            output.extend(&chars[i + 1..end]);
            output.push_str(ansi::ITALIC_OFF);
            i = end + 1;
            continue;
        }

        if chars[i] == '`'
            && let Some(end) = (i + 1..len).find(|&j| chars[j] == '`')
        {
            output.push_str(ansi::CYAN);
            output.extend(&chars[i + 1..end]);
            output.push_str(ansi::RESET);
            i = end + 1;
            continue;
        }

        output.push(chars[i]);
        i += 1;
    }

    output
}

fn find_double_star(chars: &[char], start: usize) -> Option<usize> {
    (start..chars.len().saturating_sub(1)).find(|&i| chars[i] == '*' && chars[i + 1] == '*')
}

/// The closing star must not follow a space.
fn find_single_star(chars: &[char], start: usize) -> Option<usize> {
    (start + 1..chars.len()).find(|&i| {
        chars[i] == '*' && chars[i - 1] != ' ' && chars.get(i + 1).is_none_or(|&c| c != '*')
    })
}
