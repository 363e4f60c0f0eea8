//! HTTP reader provider.
//!
//! `GET {base_url}/{target url}` with a bearer credential. The reader service
//! answers with plain text that starts with metadata headers, which
//! [`parse_reader_response`] strips.

use super::{ReaderProvider, build_client, join_url, request_error, transport_error};
use crate::config::ReaderConfig;
use crate::error::{ProviderError, ProviderKind};
use crate::parsing::parse_reader_response;
use crate::types::DocumentRecord;
use async_trait::async_trait;
use tracing::debug;

pub struct HttpReaderProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpReaderProvider {
    pub fn new(config: &ReaderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(ProviderKind::Reader, config.timeout_secs)?,
            base_url: config.base_url.clone(),
            api_key: config.resolve_api_key(),
        })
    }
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_target_url(target: &str) -> Result<(), ProviderError> {
    let parsed = url::Url::parse(target).map_err(|e| ProviderError::InvalidUrl {
        url: target.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ProviderError::InvalidUrl {
            url: target.to_string(),
            reason: format!("unsupported scheme '{other}', expected http or https"),
        }),
    }
}

#[async_trait]
impl ReaderProvider for HttpReaderProvider {
    async fn read(&self, target: &str) -> Result<DocumentRecord, ProviderError> {
        validate_target_url(target)?;

        let url = join_url(&self.base_url, target);
        debug!(url = %url, "Sending reader request");

        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| request_error(ProviderKind::Reader, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(transport_error(ProviderKind::Reader, status));
        }

        let text = response
            .text()
            .await
            .map_err(|e| request_error(ProviderKind::Reader, e))?;

        let document = parse_reader_response(&text, target);
        debug!(url = %target, title = %document.title, words = document.word_count(), "Read document");
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_target_url() {
        assert!(validate_target_url("https://example.com/post").is_ok());
        assert!(validate_target_url("http://example.com").is_ok());
        assert!(matches!(
            validate_target_url("not-a-url"),
            Err(ProviderError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_target_url("file:///etc/passwd"),
            Err(ProviderError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_rejects_invalid_url_before_request() {
        let provider = HttpReaderProvider::new(&ReaderConfig::default()).unwrap();
        let result = provider.read("ftp://example.com/file").await;
        assert!(matches!(result, Err(ProviderError::InvalidUrl { .. })));
    }
}
