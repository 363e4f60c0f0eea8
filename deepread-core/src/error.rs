//! Error types for the deepread core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering provider transport, report analysis, research orchestration,
//! configuration, and credential storage.
//!
//! Parsing is deliberately absent from this taxonomy: malformed provider
//! lines are skipped, and missing fields fall back to defaults.

use std::path::PathBuf;

pub use crate::credentials::CredentialError;

/// Top-level error type for the deepread core library.
#[derive(Debug, thiserror::Error)]
pub enum DeepReadError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Research error: {0}")]
    Research(#[from] ResearchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which external service a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Search,
    Reader,
    Generation,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Search => write!(f, "search"),
            ProviderKind::Reader => write!(f, "reader"),
            ProviderKind::Generation => write!(f, "generation"),
        }
    }
}

/// Errors from talking to a search, reader, or generation provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered with a non-success HTTP status.
    #[error("{provider} provider returned {status} {reason}")]
    Transport {
        provider: ProviderKind,
        status: u16,
        reason: String,
    },

    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("{provider} request failed: {message}")]
    Request {
        provider: ProviderKind,
        message: String,
    },

    /// The response arrived but did not have the expected shape.
    #[error("{provider} response could not be parsed: {message}")]
    ResponseParse {
        provider: ProviderKind,
        message: String,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ProviderError {
    /// Whether this error came from a non-success HTTP status.
    pub fn is_transport(&self) -> bool {
        matches!(self, ProviderError::Transport { .. })
    }
}

/// Errors from assembling a research report.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Generation API key not found. Please set your API key first.")]
    NotConfigured,

    #[error("No documents to analyze")]
    NoDocuments,

    /// Non-success status from the generation provider, surfaced as-is.
    #[error(transparent)]
    Provider(ProviderError),

    /// Any other provider failure, normalized. The cause is logged, not shown.
    #[error("Failed to analyze content. Please try again.")]
    Failed,
}

/// Errors from the research session's multi-step operations.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("None of the {attempted} requested URLs could be fetched")]
    NoDocumentsFetched { attempted: usize },

    #[error("No search results to fetch; run a search first")]
    NoResults,

    #[error("No result #{number}; the current search has {available}")]
    NoSuchResult { number: usize, available: usize },

    #[error("A newer request replaced this one before it finished")]
    Superseded,
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `DeepReadError`.
pub type Result<T> = std::result::Result<T, DeepReadError>;
