//! Prompt construction for report generation.

use crate::types::{ChatMessage, DocumentRecord, ReportMode};

pub const SYSTEM_PROMPT: &str = "You are an expert research analyst who synthesizes multiple \
sources to create comprehensive, insightful research reports.";

/// Shown in an evidence block when a document has no publication time.
pub const UNKNOWN_PUBLISHED: &str = "Not specified";

/// Section labels requested in [`ReportMode::Sections`], in order.
pub const SECTION_LABELS: [&str; 5] = [
    "EXECUTIVE SUMMARY",
    "KEY FINDINGS",
    "DETAILED ANALYSIS",
    "SOURCES SUMMARY",
    "RECOMMENDATIONS",
];

/// Serialize one document into a labeled evidence block.
pub fn evidence_block(document: &DocumentRecord) -> String {
    format!(
        "\nTitle: {}\nURL: {}\nPublished: {}\n\nContent:\n{}\n\n---\n",
        document.title,
        document.url,
        document.published_time.as_deref().unwrap_or(UNKNOWN_PUBLISHED),
        document.body,
    )
}

/// All documents as one evidence payload, blocks separated by a newline.
pub fn evidence_payload(documents: &[DocumentRecord]) -> String {
    documents
        .iter()
        .map(evidence_block)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn long_form_prompt(topic: &str, evidence: &str) -> String {
    format!(
        r#"You are a research analyst and writer. Create a comprehensive, detailed research article on "{topic}" using the following research materials. Write this as a full-length article that could be published in an academic journal or professional publication.

Research Materials:
{evidence}

Write a detailed research article with the following structure:

# {topic}: A Comprehensive Analysis

## Introduction
- Explain why the topic matters
- Preview the main themes and findings
- Set the scope of the analysis (2-3 paragraphs)

## Background and Context
- Historical context and evolution
- Current state of the field
- Key challenges and opportunities (3-4 paragraphs)

## Key Findings and Insights
- Present 5-8 major findings with detailed explanations
- Support each finding with evidence from the sources
- Note contradictions or open debates
- Use subheadings for different themes

## Detailed Analysis by Theme
- Organize findings into 3-4 coherent themes
- Compare and contrast the perspectives in the sources
- Include specific examples and case studies

## Implications and Future Directions
- Practical implications
- Emerging trends and areas for future research
- Potential challenges (4-5 paragraphs)

## Conclusion
- Synthesize the main insights
- Final thoughts on significance (2-3 paragraphs)

Writing Requirements:
- Write 3000-4000 words
- Use academic but accessible language
- Quote and reference the sources naturally throughout
- Keep smooth transitions between sections"#
    )
}

pub fn sections_prompt(topic: &str, evidence: &str) -> String {
    format!(
        r#"You are a research analyst. Analyze the following research materials on "{topic}" and write a structured report.

Research Materials:
{evidence}

Respond with exactly these five numbered sections, each heading on its own line:

1. EXECUTIVE SUMMARY
A concise overview of the topic and the most important conclusions (1-2 paragraphs).

2. KEY FINDINGS
5-8 findings, one per line, each starting with "- ".

3. DETAILED ANALYSIS
An in-depth discussion of themes, agreements and disagreements between sources, with specific examples.

4. SOURCES SUMMARY
One line per source describing what it contributes.

5. RECOMMENDATIONS
3-5 actionable recommendations, one per line, each starting with "- "."#
    )
}

/// The system and user messages for one report request.
pub fn build_messages(topic: &str, documents: &[DocumentRecord], mode: ReportMode) -> Vec<ChatMessage> {
    let evidence = evidence_payload(documents);
    let user = match mode {
        ReportMode::LongForm => long_form_prompt(topic, &evidence),
        ReportMode::Sections => sections_prompt(topic, &evidence),
    };
    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}
