//! External provider clients.
//!
//! Three fixed providers are addressed as opaque HTTP endpoints:
//!
//! - [`SearchProvider`]: topic query to ranked results
//! - [`ReaderProvider`]: URL to cleaned document text
//! - [`GenerationProvider`]: chat completion used to write reports
//!
//! Each trait has an HTTP implementation and a mock used by tests.
//! There is no retry, caching, or rate limiting here: every
//! call is a single request/response round trip.

pub mod mock;
pub mod openai;
pub mod reader;
pub mod search;

pub use mock::{
    MockGenerationProvider, MockOutcome, MockReaderProvider, MockSearchProvider, RecordedCompletion,
};
pub use openai::OpenAiGenerationProvider;
pub use reader::HttpReaderProvider;
pub use search::HttpSearchProvider;

use crate::error::{ProviderError, ProviderKind};
use crate::types::{CompletionRequest, CompletionResponse, DocumentRecord, SearchResultRecord};
use async_trait::async_trait;
use std::time::Duration;

/// Runs a web search and returns results in provider rank order.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultRecord>, ProviderError>;
}

/// Fetches a page through the reader service.
#[async_trait]
pub trait ReaderProvider: Send + Sync {
    async fn read(&self, url: &str) -> Result<DocumentRecord, ProviderError>;
}

/// Sends one chat completion request.
///
/// The API key is passed per call so the caller decides, at call time,
/// which credential (if any) is in effect.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
        api_key: &str,
    ) -> Result<CompletionResponse, ProviderError>;

    /// The model identifier sent when a request does not name one.
    fn model_name(&self) -> &str;
}

/// Build a `reqwest` client with the shared user agent and a request timeout.
pub(crate) fn build_client(
    provider: ProviderKind,
    timeout_secs: u64,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("deepread/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::Request {
            provider,
            message: format!("Failed to create HTTP client: {e}"),
        })
}

/// Map a non-success status to [`ProviderError::Transport`].
pub(crate) fn transport_error(provider: ProviderKind, status: reqwest::StatusCode) -> ProviderError {
    ProviderError::Transport {
        provider,
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
    }
}

/// Map a `reqwest` send/read failure to [`ProviderError::Request`].
pub(crate) fn request_error(provider: ProviderKind, err: reqwest::Error) -> ProviderError {
    let message = if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    };
    ProviderError::Request { provider, message }
}

/// Join a base URL and a path segment with exactly one slash.
pub(crate) fn join_url(base: &str, tail: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), tail.trim_start_matches('/'))
}
