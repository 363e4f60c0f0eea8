//! Core type definitions for deepread.
//!
//! Defines the normalized records produced by the parsers (search results,
//! documents, reports), the document collection, and the chat types used
//! to talk to the generation provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder title used when a provider supplies none.
pub const UNTITLED: &str = "Untitled";

/// Placeholder description used when a search result carries none.
pub const NO_DESCRIPTION: &str = "No description available";

/// One ranked entry from a web search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultRecord {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

/// A fetched page after the reader provider's metadata headers are removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub title: String,
    /// Always the URL the caller asked for, never one parsed from the body.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_time: Option<String>,
    pub body: String,
}

impl DocumentRecord {
    /// The `"<title> - <url>"` line used in a report's source list.
    pub fn source_line(&self) -> String {
        format!("{} - {}", self.title, self.url)
    }

    /// Number of whitespace-separated words in the body.
    pub fn word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}

/// How the generation provider is asked to structure its answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// One long-form markdown article; the whole completion is the analysis.
    #[default]
    LongForm,
    /// Five numbered sections, extracted individually.
    Sections,
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportMode::LongForm => write!(f, "long_form"),
            ReportMode::Sections => write!(f, "sections"),
        }
    }
}

impl std::str::FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "long_form" | "longform" | "article" => Ok(ReportMode::LongForm),
            "sections" | "structured" => Ok(ReportMode::Sections),
            other => Err(format!(
                "unknown report mode '{other}' (expected long_form or sections)"
            )),
        }
    }
}

/// A synthesized research report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub topic: String,
    pub mode: ReportMode,
    pub summary: String,
    pub key_findings: Vec<String>,
    pub detailed_analysis: String,
    /// One `"<title> - <url>"` entry per input document, in input order.
    pub sources: Vec<String>,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Documents collected during a session, keyed by URL.
///
/// Insertion order is kept; a URL already present is never added twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentCollection {
    documents: Vec<DocumentRecord>,
}

impl DocumentCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document. Returns `false` if its URL was already collected.
    pub fn insert(&mut self, document: DocumentRecord) -> bool {
        if self.contains(&document.url) {
            return false;
        }
        self.documents.push(document);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.documents.iter().any(|d| d.url == url)
    }

    pub fn get(&self, url: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|d| d.url == url)
    }

    /// Remove the document with the given URL, returning it if present.
    pub fn remove(&mut self, url: &str) -> Option<DocumentRecord> {
        let index = self.documents.iter().position(|d| d.url == url)?;
        Some(self.documents.remove(index))
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocumentRecord> {
        self.documents.iter()
    }

    pub fn as_slice(&self) -> &[DocumentRecord] {
        &self.documents
    }
}

impl Extend<DocumentRecord> for DocumentCollection {
    fn extend<I: IntoIterator<Item = DocumentRecord>>(&mut self, iter: I) {
        for document in iter {
            self.insert(document);
        }
    }
}

impl FromIterator<DocumentRecord> for DocumentCollection {
    fn from_iter<I: IntoIterator<Item = DocumentRecord>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl<'a> IntoIterator for &'a DocumentCollection {
    type Item = &'a DocumentRecord;
    type IntoIter = std::slice::Iter<'a, DocumentRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}

/// Represents a participant role in a chat completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
        }
    }
}

/// A single chat message sent to the generation provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Token usage statistics from a generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl TokenUsage {
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

/// A request to the generation provider.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub model: Option<String>,
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            temperature: 0.3,
            max_tokens: None,
            model: None,
        }
    }
}

/// The result of a generation request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: TokenUsage,
    pub model: String,
    pub finish_reason: Option<String>,
}
