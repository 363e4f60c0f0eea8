//! Research session: search results, opened documents and the current report.
//!
//! A session is shared by reference (`&self` everywhere) so several requests
//! can be in flight at once. Each search and each read is stamped with a
//! [`RequestToken`]; when it completes, its result is applied only if no newer
//! request of the same kind was issued in the meantime. Older responses are
//! reported as [`Settled::Superseded`] and leave the session untouched.

use super::assembler::ResearchReportAssembler;
use crate::config::{DeepReadConfig, GenerationConfig, ResearchConfig};
use crate::credentials::{CredentialStore, resolve_generation_key};
use crate::error::{AnalysisError, ResearchError};
use crate::providers::{GenerationProvider, ReaderProvider, SearchProvider};
use crate::types::{
    DocumentCollection, DocumentRecord, ReportMode, ReportRecord, SearchResultRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Monotonically increasing stamp for one search or read request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Outcome of a request that may have been overtaken by a newer one.
#[derive(Debug, Clone, PartialEq)]
pub enum Settled<T> {
    /// The response was the latest of its kind and is now session state.
    Applied(T),
    /// A newer request was issued first; the response was discarded.
    Superseded,
}

impl<T> Settled<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Settled::Applied(value) => Some(value),
            Settled::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Settled::Superseded)
    }
}

/// Serializable copy of the session contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub query: Option<String>,
    pub results: Vec<SearchResultRecord>,
    pub documents: DocumentCollection,
    pub report: Option<ReportRecord>,
}

#[derive(Default)]
struct SessionState {
    query: Option<String>,
    results: Vec<SearchResultRecord>,
    documents: DocumentCollection,
    current: Option<DocumentRecord>,
    report: Option<ReportRecord>,
    latest_search: Option<RequestToken>,
    latest_read: Option<RequestToken>,
}

pub struct ResearchSession {
    search: Arc<dyn SearchProvider>,
    reader: Arc<dyn ReaderProvider>,
    assembler: ResearchReportAssembler,
    credentials: Arc<dyn CredentialStore>,
    generation: GenerationConfig,
    settings: ResearchConfig,
    issued: AtomicU64,
    state: Mutex<SessionState>,
}

impl ResearchSession {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        reader: Arc<dyn ReaderProvider>,
        generation: Arc<dyn GenerationProvider>,
        credentials: Arc<dyn CredentialStore>,
        config: &DeepReadConfig,
    ) -> Self {
        Self {
            search,
            reader,
            assembler: ResearchReportAssembler::new(generation, &config.generation),
            credentials,
            generation: config.generation.clone(),
            settings: config.research.clone(),
            issued: AtomicU64::new(0),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_token(&self) -> RequestToken {
        RequestToken(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Run a search and make its results current.
    ///
    /// On failure the current results are cleared, unless the request was
    /// already superseded.
    pub async fn search(
        &self,
        query: &str,
    ) -> Result<Settled<Vec<SearchResultRecord>>, ResearchError> {
        let token = self.next_token();
        self.state().latest_search = Some(token);
        debug!(query = %query, token = token.value(), "Search issued");

        let outcome = self.search.search(query).await;

        let mut state = self.state();
        if state.latest_search != Some(token) {
            debug!(query = %query, token = token.value(), "Discarding superseded search");
            return Ok(Settled::Superseded);
        }
        match outcome {
            Ok(results) => {
                info!(query = %query, count = results.len(), "Search completed");
                state.query = Some(query.to_string());
                state.results = results.clone();
                Ok(Settled::Applied(results))
            }
            Err(e) => {
                state.results.clear();
                Err(e.into())
            }
        }
    }

    /// Fetch a page through the reader, make it the current document, and add
    /// it to the collection.
    pub async fn open(&self, url: &str) -> Result<Settled<DocumentRecord>, ResearchError> {
        let token = self.next_token();
        self.state().latest_read = Some(token);
        debug!(url = %url, token = token.value(), "Read issued");

        let outcome = self.reader.read(url).await;

        let mut state = self.state();
        if state.latest_read != Some(token) {
            debug!(url = %url, token = token.value(), "Discarding superseded read");
            return Ok(Settled::Superseded);
        }
        let document = outcome?;
        info!(url = %url, title = %document.title, "Content loaded");
        state.documents.insert(document.clone());
        state.current = Some(document.clone());
        Ok(Settled::Applied(document))
    }

    /// Open the `number`-th (1-based) current search result.
    pub async fn open_result(&self, number: usize) -> Result<Settled<DocumentRecord>, ResearchError> {
        let url = {
            let state = self.state();
            if state.results.is_empty() {
                return Err(ResearchError::NoResults);
            }
            number
                .checked_sub(1)
                .and_then(|i| state.results.get(i))
                .map(|r| r.url.clone())
                .ok_or(ResearchError::NoSuchResult {
                    number,
                    available: state.results.len(),
                })?
        };
        self.open(&url).await
    }

    /// The generation key currently in effect, if any.
    pub fn api_key(&self) -> Option<String> {
        resolve_generation_key(&self.generation, self.credentials.as_ref()).map(|(key, _)| key)
    }

    /// Generate a report from every document in the collection.
    pub async fn analyze(
        &self,
        topic: &str,
        mode: Option<ReportMode>,
    ) -> Result<ReportRecord, ResearchError> {
        let documents = self.state().documents.as_slice().to_vec();
        self.generate(&documents, topic, mode).await
    }

    /// Fetch `urls` one after another and generate a report from the pages
    /// that loaded.
    ///
    /// Repeated URLs are fetched once. A URL that fails is logged and
    /// skipped. If none load, the result is
    /// [`ResearchError::NoDocumentsFetched`]. Fetched pages are also added to
    /// the session collection; the report covers only this run's pages, in
    /// fetch order.
    pub async fn fetch_and_analyze(
        &self,
        topic: &str,
        urls: &[String],
        mode: Option<ReportMode>,
    ) -> Result<ReportRecord, ResearchError> {
        if self.api_key().is_none() {
            return Err(AnalysisError::NotConfigured.into());
        }
        if urls.is_empty() {
            return Err(AnalysisError::NoDocuments.into());
        }

        let mut fetched = DocumentCollection::new();
        let mut seen = HashSet::new();
        for url in urls {
            if !seen.insert(url.as_str()) {
                debug!(url = %url, "Skipping duplicate URL");
                continue;
            }
            match self.reader.read(url).await {
                Ok(document) => {
                    debug!(url = %url, words = document.word_count(), "Fetched document");
                    fetched.insert(document);
                }
                Err(e) => warn!(url = %url, error = %e, "Skipping URL that failed to load"),
            }
        }

        if fetched.is_empty() {
            return Err(ResearchError::NoDocumentsFetched {
                attempted: seen.len(),
            });
        }
        info!(fetched = fetched.len(), attempted = seen.len(), "Bulk fetch completed");

        self.state().documents.extend(fetched.iter().cloned());
        self.generate(fetched.as_slice(), topic, mode).await
    }

    /// Search for `topic`, fetch the top `count` results, and generate a report.
    pub async fn research(
        &self,
        topic: &str,
        count: Option<usize>,
        mode: Option<ReportMode>,
    ) -> Result<ReportRecord, ResearchError> {
        if self.api_key().is_none() {
            return Err(AnalysisError::NotConfigured.into());
        }
        let results = self
            .search(topic)
            .await?
            .applied()
            .ok_or(ResearchError::Superseded)?;
        if results.is_empty() {
            return Err(ResearchError::NoResults);
        }

        let count = count.unwrap_or(self.settings.default_fetch_count);
        let urls: Vec<String> = results.into_iter().take(count).map(|r| r.url).collect();
        self.fetch_and_analyze(topic, &urls, mode).await
    }

    async fn generate(
        &self,
        documents: &[DocumentRecord],
        topic: &str,
        mode: Option<ReportMode>,
    ) -> Result<ReportRecord, ResearchError> {
        let api_key = self.api_key();
        let report = self
            .assembler
            .assemble(
                documents,
                topic,
                api_key.as_deref(),
                mode.unwrap_or(self.settings.mode),
            )
            .await?;
        self.state().report = Some(report.clone());
        Ok(report)
    }

    pub fn query(&self) -> Option<String> {
        self.state().query.clone()
    }

    pub fn results(&self) -> Vec<SearchResultRecord> {
        self.state().results.clone()
    }

    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.state().documents.as_slice().to_vec()
    }

    pub fn current_document(&self) -> Option<DocumentRecord> {
        self.state().current.clone()
    }

    pub fn report(&self) -> Option<ReportRecord> {
        self.state().report.clone()
    }

    /// Drop a document from the collection. Closes it if it is the current one.
    pub fn remove_document(&self, url: &str) -> Option<DocumentRecord> {
        let mut state = self.state();
        if state.current.as_ref().is_some_and(|d| d.url == url) {
            state.current = None;
        }
        state.documents.remove(url)
    }

    /// Close the reader view without touching the collection.
    pub fn close_document(&self) {
        self.state().current = None;
    }

    /// Clear everything and invalidate requests still in flight.
    pub fn reset(&self) {
        *self.state() = SessionState::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            query: state.query.clone(),
            results: state.results.clone(),
            documents: state.documents.clone(),
            report: state.report.clone(),
        }
    }
}
