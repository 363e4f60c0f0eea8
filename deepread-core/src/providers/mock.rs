//! In-process provider doubles.
//!
//! Each mock answers from canned data, records what it was asked, and can be
//! told to fail with an HTTP status or a connection error.

use super::{GenerationProvider, ReaderProvider, SearchProvider, transport_error};
use crate::error::{ProviderError, ProviderKind};
use crate::parsing::parse_reader_response;
use crate::types::{
    CompletionRequest, CompletionResponse, DocumentRecord, SearchResultRecord, TokenUsage,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const MOCK_MODEL: &str = "mock-model";

/// What a mock hands back for one call.
#[derive(Debug, Clone)]
pub enum MockOutcome<T> {
    Reply(T),
    /// Non-success HTTP status.
    Status(u16),
    /// The connection could not be made.
    Unreachable,
    /// A success status with a body that cannot be decoded.
    Malformed,
}

impl<T: Clone> MockOutcome<T> {
    fn resolve(&self, provider: ProviderKind) -> Result<T, ProviderError> {
        match self {
            MockOutcome::Reply(value) => Ok(value.clone()),
            MockOutcome::Status(code) => Err(transport_error(
                provider,
                StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            )),
            MockOutcome::Unreachable => Err(ProviderError::Request {
                provider,
                message: "error sending request: connection refused".to_string(),
            }),
            MockOutcome::Malformed => Err(ProviderError::ResponseParse {
                provider,
                message: "Invalid JSON: expected value at line 1 column 1".to_string(),
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Search provider returning fixed results.
pub struct MockSearchProvider {
    default: MockOutcome<Vec<SearchResultRecord>>,
    by_query: HashMap<String, MockOutcome<Vec<SearchResultRecord>>>,
    delays: HashMap<String, Duration>,
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    /// Answer every query with `results`.
    pub fn new(results: Vec<SearchResultRecord>) -> Self {
        Self {
            default: MockOutcome::Reply(results),
            by_query: HashMap::new(),
            delays: HashMap::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fail every query with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.default = MockOutcome::Status(status);
        provider
    }

    /// Answer one specific query differently.
    pub fn with_query(mut self, query: &str, outcome: MockOutcome<Vec<SearchResultRecord>>) -> Self {
        self.by_query.insert(query.to_string(), outcome);
        self
    }

    /// Hold the answer to `query` back for `delay`.
    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    /// Queries received so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultRecord>, ProviderError> {
        lock(&self.queries).push(query.to_string());
        if let Some(delay) = self.delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        self.by_query
            .get(query)
            .unwrap_or(&self.default)
            .resolve(ProviderKind::Search)
    }
}

/// Reader provider serving raw reader-service text per URL.
///
/// Pages are stored in the wire format (with `Title:`/`URL Source:` headers)
/// and run through the same parser as the HTTP client. Unknown URLs answer
/// `404 Not Found`.
#[derive(Default)]
pub struct MockReaderProvider {
    pages: HashMap<String, MockOutcome<String>>,
    delays: HashMap<String, Duration>,
    requested: Mutex<Vec<String>>,
}

impl MockReaderProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `raw` for `url`.
    pub fn with_page(mut self, url: &str, raw: &str) -> Self {
        self.pages
            .insert(url.to_string(), MockOutcome::Reply(raw.to_string()));
        self
    }

    /// Serve a page built from a title and body.
    pub fn with_article(self, url: &str, title: &str, body: &str) -> Self {
        let raw = format!("Title: {title}\nURL Source: {url}\nMarkdown Content:\n{body}");
        self.with_page(url, &raw)
    }

    /// Make `url` fail with `outcome` (anything but `Reply`).
    pub fn with_failure(mut self, url: &str, outcome: MockOutcome<String>) -> Self {
        self.pages.insert(url.to_string(), outcome);
        self
    }

    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(url.to_string(), delay);
        self
    }

    /// URLs requested so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        lock(&self.requested).clone()
    }
}

#[async_trait]
impl ReaderProvider for MockReaderProvider {
    async fn read(&self, url: &str) -> Result<DocumentRecord, ProviderError> {
        lock(&self.requested).push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        let raw = self
            .pages
            .get(url)
            .unwrap_or(&MockOutcome::Status(404))
            .resolve(ProviderKind::Reader)?;
        Ok(parse_reader_response(&raw, url))
    }
}

/// A recorded generation call.
#[derive(Debug, Clone)]
pub struct RecordedCompletion {
    pub request: CompletionRequest,
    pub api_key: String,
}

/// Generation provider answering from a queue.
///
/// Queued outcomes are consumed in order; once the queue is empty every call
/// gets the fallback.
pub struct MockGenerationProvider {
    model: String,
    queue: Mutex<VecDeque<MockOutcome<String>>>,
    fallback: MockOutcome<String>,
    calls: Mutex<Vec<RecordedCompletion>>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self {
            model: MOCK_MODEL.to_string(),
            queue: Mutex::new(VecDeque::new()),
            fallback: MockOutcome::Reply("I'm a mock model. No queued responses available.".into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn with_response(text: &str) -> Self {
        let mut provider = Self::new();
        provider.fallback = MockOutcome::Reply(text.to_string());
        provider
    }

    /// Answer with `outcome` once the queue is empty.
    pub fn with_fallback(mut self, outcome: MockOutcome<String>) -> Self {
        self.fallback = outcome;
        self
    }

    /// Queue an outcome for the next call.
    pub fn queue(&self, outcome: MockOutcome<String>) {
        lock(&self.queue).push_back(outcome);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<RecordedCompletion> {
        lock(&self.calls).clone()
    }

    pub fn last_call(&self) -> Option<RecordedCompletion> {
        lock(&self.calls).last().cloned()
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        api_key: &str,
    ) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.clone().unwrap_or_else(|| self.model.clone());
        lock(&self.calls).push(RecordedCompletion {
            request,
            api_key: api_key.to_string(),
        });

        let outcome = lock(&self.queue)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let text = outcome.resolve(ProviderKind::Generation)?;

        Ok(CompletionResponse {
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: text.len() / 4,
            },
            text,
            model,
            finish_reason: Some("stop".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
