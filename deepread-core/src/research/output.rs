//! Report export in Markdown and JSON.

use crate::types::{ReportMode, ReportRecord};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Export format for a finished report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl OutputFormat {
    /// Pick a format from a file extension, defaulting to Markdown.
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected markdown or json)")),
        }
    }
}

/// Render a report in the requested format.
pub fn render(report: &ReportRecord, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Markdown => Ok(to_markdown(report)),
        OutputFormat::Json => to_json(report),
    }
}

pub fn to_json(report: &ReportRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Render a report as a Markdown document.
///
/// A long-form report is the article itself followed by its sources. A
/// sectioned report gets one heading per extracted section; empty lists are
/// left out.
pub fn to_markdown(report: &ReportRecord) -> String {
    let mut out = String::new();

    match report.mode {
        ReportMode::LongForm => {
            let article = report.detailed_analysis.trim();
            if !article.starts_with("# ") {
                let _ = writeln!(out, "# Deep Research Analysis: {}\n", report.topic);
            }
            out.push_str(article);
            out.push_str("\n\n");
        }
        ReportMode::Sections => {
            let _ = writeln!(out, "# Deep Research Analysis: {}\n", report.topic);
            let _ = writeln!(out, "## Executive Summary\n\n{}\n", report.summary);
            if !report.key_findings.is_empty() {
                out.push_str("## Key Findings\n\n");
                for finding in &report.key_findings {
                    let _ = writeln!(out, "- {finding}");
                }
                out.push('\n');
            }
            if !report.detailed_analysis.is_empty() {
                let _ = writeln!(out, "## Detailed Analysis\n\n{}\n", report.detailed_analysis);
            }
            if !report.recommendations.is_empty() {
                out.push_str("## Recommendations\n\n");
                for rec in &report.recommendations {
                    let _ = writeln!(out, "- {rec}");
                }
                out.push('\n');
            }
        }
    }

    let _ = writeln!(out, "## Sources ({})\n", report.sources.len());
    for (i, source) in report.sources.iter().enumerate() {
        let _ = writeln!(out, "{}. {source}", i + 1);
    }
    let _ = writeln!(
        out,
        "\n---\n*Generated {}*",
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    out
}
