//! OpenAI-compatible generation provider.
//!
//! Works with OpenAI and any endpoint that follows the chat completions API
//! format (Azure OpenAI, vLLM, LM Studio, Ollama).

use super::{GenerationProvider, build_client, join_url, request_error, transport_error};
use crate::config::GenerationConfig;
use crate::error::{ProviderError, ProviderKind};
use crate::types::{CompletionRequest, CompletionResponse, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

pub struct OpenAiGenerationProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OpenAiGenerationProvider {
    /// Create a new provider from configuration.
    ///
    /// No key is read here; the caller supplies one with each request.
    pub fn new(config: &GenerationConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(ProviderKind::Generation, config.timeout_secs)?,
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": request.model.as_deref().unwrap_or(&self.model),
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    /// Parse an OpenAI-format response body into a CompletionResponse.
    fn parse_response(body: &Value, model: &str) -> Result<CompletionResponse, ProviderError> {
        let parse_error = |message: &str| ProviderError::ResponseParse {
            provider: ProviderKind::Generation,
            message: message.to_string(),
        };

        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| parse_error("No choices in response"))?;

        let message = choice
            .get("message")
            .ok_or_else(|| parse_error("No message in choice"))?;

        let text = message
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| parse_error("No text content in message"))?
            .to_string();

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(|s| s.to_string());

        let usage_obj = body.get("usage");
        let usage = TokenUsage {
            input_tokens: usage_obj
                .and_then(|u| u.get("prompt_tokens"))
                .and_then(|t| t.as_u64())
                .unwrap_or(0) as usize,
            output_tokens: usage_obj
                .and_then(|u| u.get("completion_tokens"))
                .and_then(|t| t.as_u64())
                .unwrap_or(0) as usize,
        };

        let resp_model = body
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(model)
            .to_string();

        Ok(CompletionResponse {
            text,
            usage,
            model: resp_model,
            finish_reason,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGenerationProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
        api_key: &str,
    ) -> Result<CompletionResponse, ProviderError> {
        let url = join_url(&self.base_url, "chat/completions");
        let body = self.request_body(&request);

        debug!(
            url = %url,
            model = %body["model"],
            messages = request.messages.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(ProviderKind::Generation, e))?;

        let status = response.status();
        let response_body = response
            .text()
            .await
            .map_err(|e| request_error(ProviderKind::Generation, e))?;

        if !status.is_success() {
            debug!(status = %status, body = %response_body, "Completion request rejected");
            return Err(transport_error(ProviderKind::Generation, status));
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| ProviderError::ResponseParse {
                provider: ProviderKind::Generation,
                message: format!("Invalid JSON: {e}"),
            })?;

        let parsed = Self::parse_response(&json, &self.model)?;
        debug!(
            model = %parsed.model,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Completion received"
        );
        Ok(parsed)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;

    fn provider() -> OpenAiGenerationProvider {
        OpenAiGenerationProvider::new(&GenerationConfig::default()).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user("hi")],
            temperature: 0.3,
            max_tokens: Some(4000),
            model: None,
        };
        let body = provider().request_body(&request);
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_request_body_model_override_and_no_max_tokens() {
        let request = CompletionRequest {
            model: Some("gpt-4o".into()),
            ..Default::default()
        };
        let body = provider().request_body(&request);
        assert_eq!(body["model"], "gpt-4o");
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_text_response() {
        let body = json!({
            "id": "chatcmpl-123",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "1. Executive Summary\nShort."
                },
                "finish_reason": "stop"
            }],
            "usage": {
                "prompt_tokens": 10,
                "completion_tokens": 8,
                "total_tokens": 18
            },
            "model": "gpt-4-0613"
        });
        let resp = OpenAiGenerationProvider::parse_response(&body, "gpt-4").unwrap();
        assert_eq!(resp.text, "1. Executive Summary\nShort.");
        assert_eq!(resp.usage.input_tokens, 10);
        assert_eq!(resp.usage.output_tokens, 8);
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
        assert_eq!(resp.model, "gpt-4-0613");
    }

    #[test]
    fn test_parse_response_falls_back_to_configured_model() {
        let body = json!({"choices": [{"message": {"content": "ok"}}]});
        let resp = OpenAiGenerationProvider::parse_response(&body, "gpt-4").unwrap();
        assert_eq!(resp.model, "gpt-4");
        assert_eq!(resp.usage, TokenUsage::default());
        assert!(resp.finish_reason.is_none());
    }

    #[test]
    fn test_parse_response_no_choices() {
        let body = json!({"choices": []});
        let result = OpenAiGenerationProvider::parse_response(&body, "gpt-4");
        assert!(matches!(result, Err(ProviderError::ResponseParse { .. })));
    }

    #[test]
    fn test_parse_response_null_content() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": null}}]});
        let result = OpenAiGenerationProvider::parse_response(&body, "gpt-4");
        assert!(matches!(result, Err(ProviderError::ResponseParse { .. })));
    }
}
