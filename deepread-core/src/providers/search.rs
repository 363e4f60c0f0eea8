//! HTTP search provider.
//!
//! `GET {base_url}/{percent-encoded query}` with a bearer credential and
//! `X-Respond-With: no-content`, so only titles, links, and descriptions
//! come back. The body is handed to [`SearchResponseParser`], which accepts
//! either the line listing or the JSON shape.

use super::{SearchProvider, build_client, join_url, request_error, transport_error};
use crate::config::{SearchConfig, SearchResponseFormat};
use crate::error::{ProviderError, ProviderKind};
use crate::parsing::SearchResponseParser;
use crate::types::SearchResultRecord;
use async_trait::async_trait;
use tracing::debug;

pub struct HttpSearchProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    response_format: SearchResponseFormat,
    parser: SearchResponseParser,
}

impl HttpSearchProvider {
    /// Create a provider from configuration, resolving the credential now.
    pub fn new(config: &SearchConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(ProviderKind::Search, config.timeout_secs)?,
            base_url: config.base_url.clone(),
            api_key: config.resolve_api_key(),
            response_format: config.response_format,
            parser: SearchResponseParser::new(),
        })
    }

    /// The full request URL for a query.
    pub fn request_url(&self, query: &str) -> String {
        join_url(&self.base_url, &urlencoding::encode(query))
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<SearchResultRecord>, ProviderError> {
        let url = self.request_url(query);
        debug!(url = %url, format = %self.response_format, "Sending search request");

        let mut request = self.client.get(&url).header("X-Respond-With", "no-content");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        if self.response_format == SearchResponseFormat::Json {
            request = request.header("Accept", "application/json");
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_error(ProviderKind::Search, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport_error(ProviderKind::Search, status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| request_error(ProviderKind::Search, e))?;

        let results = self.parser.parse(&body);
        debug!(query = %query, count = results.len(), "Parsed search results");
        Ok(results)
    }
}
