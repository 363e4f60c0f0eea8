//! Report assembly: documents in, one generation call, report out.

use super::prompt::{SECTION_LABELS, build_messages};
use crate::config::GenerationConfig;
use crate::error::AnalysisError;
use crate::parsing::{extract_bullets, extract_section};
use crate::providers::GenerationProvider;
use crate::types::{CompletionRequest, DocumentRecord, ReportMode, ReportRecord};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Characters of a long-form article kept as its summary.
pub const SUMMARY_CHAR_LIMIT: usize = 500;

/// Used when the executive summary section cannot be found.
pub const SUMMARY_PLACEHOLDER: &str = "Analysis completed";

/// Builds a [`ReportRecord`] from a set of documents.
pub struct ResearchReportAssembler {
    provider: Arc<dyn GenerationProvider>,
    model: String,
    max_tokens: usize,
    temperature: f32,
}

impl ResearchReportAssembler {
    pub fn new(provider: Arc<dyn GenerationProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    /// Generate a report on `topic` from `documents`.
    ///
    /// The credential and the document set are checked before anything is
    /// sent, in that order. A non-success HTTP status from the provider is
    /// returned as [`AnalysisError::Provider`]; every other provider failure
    /// becomes [`AnalysisError::Failed`].
    pub async fn assemble(
        &self,
        documents: &[DocumentRecord],
        topic: &str,
        api_key: Option<&str>,
        mode: ReportMode,
    ) -> Result<ReportRecord, AnalysisError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AnalysisError::NotConfigured)?;
        if documents.is_empty() {
            return Err(AnalysisError::NoDocuments);
        }

        let request = CompletionRequest {
            messages: build_messages(topic, documents, mode),
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            model: Some(self.model.clone()),
        };

        let response = self
            .provider
            .complete(request, api_key)
            .await
            .map_err(|e| {
                if e.is_transport() {
                    AnalysisError::Provider(e)
                } else {
                    error!(error = %e, topic = %topic, "Analysis error");
                    AnalysisError::Failed
                }
            })?;

        info!(
            topic = %topic,
            mode = %mode,
            documents = documents.len(),
            output_tokens = response.usage.output_tokens,
            total_tokens = response.usage.total(),
            "Report generated"
        );
        Ok(report_from_completion(&response.text, documents, topic, mode))
    }
}

/// Turn a raw completion into a report.
pub fn report_from_completion(
    completion: &str,
    documents: &[DocumentRecord],
    topic: &str,
    mode: ReportMode,
) -> ReportRecord {
    let sources = documents.iter().map(DocumentRecord::source_line).collect();

    let (summary, key_findings, detailed_analysis, recommendations) = match mode {
        ReportMode::LongForm => {
            let mut summary: String = completion.chars().take(SUMMARY_CHAR_LIMIT).collect();
            summary.push_str("...");
            (summary, Vec::new(), completion.to_string(), Vec::new())
        }
        ReportMode::Sections => {
            let [executive, findings, detailed, sources_summary, recommendations] = SECTION_LABELS;
            let mut summary = extract_section(completion, executive, Some(findings));
            if summary.is_empty() {
                summary = SUMMARY_PLACEHOLDER.to_string();
            }
            (
                summary,
                extract_bullets(completion, findings, Some(detailed)),
                extract_section(completion, detailed, Some(sources_summary)),
                extract_bullets(completion, recommendations, None),
            )
        }
    };

    ReportRecord {
        topic: topic.to_string(),
        mode,
        summary,
        key_findings,
        detailed_analysis,
        sources,
        recommendations,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::providers::{MockGenerationProvider, MockOutcome};
    use pretty_assertions::assert_eq;

    const SECTIONED: &str = "1. EXECUTIVE SUMMARY\nRust is growing.\n\n\
2. KEY FINDINGS\n- Memory safety\n- Performance\n\n\
3. DETAILED ANALYSIS\nLong discussion.\n\n\
4. SOURCES SUMMARY\nTwo blogs.\n\n\
5. RECOMMENDATIONS\n* Adopt gradually\n* Train teams";

    fn docs(n: usize) -> Vec<DocumentRecord> {
        (1..=n)
            .map(|i| DocumentRecord {
                title: format!("Doc {i}"),
                url: format!("https://example.com/{i}"),
                published_time: None,
                body: format!("Body {i}"),
            })
            .collect()
    }

    fn assembler(provider: Arc<MockGenerationProvider>) -> ResearchReportAssembler {
        ResearchReportAssembler::new(provider, &GenerationConfig::default())
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits() {
        let provider = Arc::new(MockGenerationProvider::with_response(SECTIONED));
        let result = assembler(provider.clone())
            .assemble(&docs(2), "Rust", None, ReportMode::Sections)
            .await;
        assert!(matches!(result, Err(AnalysisError::NotConfigured)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let provider = Arc::new(MockGenerationProvider::new());
        let result = assembler(provider.clone())
            .assemble(&docs(1), "Rust", Some("  "), ReportMode::LongForm)
            .await;
        assert!(matches!(result, Err(AnalysisError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_missing_key_checked_before_documents() {
        let provider = Arc::new(MockGenerationProvider::new());
        let result = assembler(provider)
            .assemble(&[], "Rust", None, ReportMode::LongForm)
            .await;
        assert!(matches!(result, Err(AnalysisError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_no_documents() {
        let provider = Arc::new(MockGenerationProvider::new());
        let result = assembler(provider.clone())
            .assemble(&[], "Rust", Some("sk-test"), ReportMode::LongForm)
            .await;
        assert!(matches!(result, Err(AnalysisError::NoDocuments)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sections_mode_report() {
        let provider = Arc::new(MockGenerationProvider::with_response(SECTIONED));
        let report = assembler(provider.clone())
            .assemble(&docs(2), "Rust", Some("sk-test"), ReportMode::Sections)
            .await
            .unwrap();

        assert_eq!(report.summary, "Rust is growing.");
        assert_eq!(report.key_findings, vec!["Memory safety", "Performance"]);
        assert_eq!(report.detailed_analysis, "Long discussion.");
        assert_eq!(report.recommendations, vec!["Adopt gradually", "Train teams"]);
        assert_eq!(
            report.sources,
            vec!["Doc 1 - https://example.com/1", "Doc 2 - https://example.com/2"]
        );
        assert_eq!(report.mode, ReportMode::Sections);
        assert_eq!(report.topic, "Rust");

        let call = provider.last_call().unwrap();
        assert_eq!(call.api_key, "sk-test");
        assert_eq!(call.request.max_tokens, Some(4000));
        assert_eq!(call.request.model.as_deref(), Some("gpt-4"));
        assert_eq!(call.request.messages.len(), 2);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_long_form_report() {
        let article = format!("# Rust: A Comprehensive Analysis\n\n{}", "x".repeat(800));
        let provider = Arc::new(MockGenerationProvider::with_response(&article));
        let report = assembler(provider)
            .assemble(&docs(3), "Rust", Some("sk-test"), ReportMode::LongForm)
            .await
            .unwrap();

        assert_eq!(report.summary.chars().count(), SUMMARY_CHAR_LIMIT + 3);
        assert!(report.summary.ends_with("..."));
        assert!(article.starts_with(report.summary.trim_end_matches("...")));
        assert_eq!(report.detailed_analysis, article);
        assert!(report.key_findings.is_empty());
        assert!(report.recommendations.is_empty());
        assert_eq!(report.sources.len(), 3);
    }

    #[test]
    fn test_long_form_summary_counts_characters() {
        let text = "é".repeat(600);
        let report = report_from_completion(&text, &docs(1), "t", ReportMode::LongForm);
        assert_eq!(report.summary, format!("{}...", "é".repeat(500)));
    }

    #[test]
    fn test_short_long_form_still_gets_ellipsis() {
        let report = report_from_completion("Short.", &docs(1), "t", ReportMode::LongForm);
        assert_eq!(report.summary, "Short....");
    }

    #[test]
    fn test_unstructured_completion_in_sections_mode() {
        let report =
            report_from_completion("Just prose.", &docs(1), "t", ReportMode::Sections);
        assert_eq!(report.summary, SUMMARY_PLACEHOLDER);
        assert!(report.key_findings.is_empty());
        assert_eq!(report.detailed_analysis, "");
        assert!(report.recommendations.is_empty());
        assert_eq!(report.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_surfaced() {
        let provider = Arc::new(
            MockGenerationProvider::new().with_fallback(MockOutcome::Status(401)),
        );
        let result = assembler(provider)
            .assemble(&docs(1), "Rust", Some("sk-bad"), ReportMode::LongForm)
            .await;
        match result {
            Err(AnalysisError::Provider(ProviderError::Transport { status, .. })) => {
                assert_eq!(status, 401)
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_failures_are_normalized() {
        for outcome in [MockOutcome::Unreachable, MockOutcome::Malformed] {
            let provider = Arc::new(MockGenerationProvider::new().with_fallback(outcome));
            let err = assembler(provider)
                .assemble(&docs(1), "Rust", Some("sk-test"), ReportMode::LongForm)
                .await
                .unwrap_err();
            assert!(matches!(err, AnalysisError::Failed));
            assert_eq!(err.to_string(), "Failed to analyze content. Please try again.");
        }
    }
}
