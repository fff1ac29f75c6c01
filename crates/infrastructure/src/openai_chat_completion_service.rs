//! Chat-completion client for OpenAI-compatible `/chat/completions` APIs.

use std::time::Duration;

use async_trait::async_trait;
use promptloom_application::{
    ChatCompletion, ChatCompletionRequest, ChatMessage, LlmError, LlmService,
};
use promptloom_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Connection settings for the chat-completion provider.
#[derive(Debug, Clone)]
pub struct OpenAiChatCompletionConfig {
    /// API base URL without the trailing `/chat/completions`.
    pub base_url: String,
    /// Bearer token; `None` leaves the service unconfigured.
    pub api_key: Option<String>,
    /// Model requested for every completion.
    pub model: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// LLM port adapter speaking the OpenAI chat-completion protocol.
pub struct OpenAiChatCompletionService {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiChatCompletionService {
    /// Creates a client from connection settings.
    pub fn new(config: OpenAiChatCompletionConfig) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build LLM HTTP client: {error}"))
            })?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config
                .api_key
                .filter(|api_key| !api_key.trim().is_empty()),
            model: config.model,
        })
    }

    /// Returns whether credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Deserialize)]
struct ProviderError {
    message: String,
}

#[async_trait]
impl LlmService for OpenAiChatCompletionService {
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletion, LlmError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LlmError::NotConfigured);
        };

        let body = ChatCompletionBody {
            model: self.model.as_str(),
            messages: request.messages.as_slice(),
            temperature: request.temperature,
            tools: request.tools.as_deref(),
        };

        debug!(
            model = self.model.as_str(),
            messages = request.messages.len(),
            "sending chat completion"
        );

        let response = self
            .http_client
            .post(self.endpoint.as_str())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|error| LlmError::Request {
                status: error.status().map(|status| status.as_u16()),
                message: error.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(LlmError::Request {
                status: Some(status.as_u16()),
                message,
            });
        }

        response
            .json::<ChatCompletion>()
            .await
            .map_err(|error| LlmError::Request {
                status: Some(status.as_u16()),
                message: format!("invalid completion payload: {error}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use promptloom_application::{ChatCompletionRequest, ChatMessage, LlmError, LlmService};

    use super::{OpenAiChatCompletionConfig, OpenAiChatCompletionService};

    fn config(api_key: Option<&str>) -> OpenAiChatCompletionConfig {
        OpenAiChatCompletionConfig {
            base_url: "http://127.0.0.1:9/v1/".to_owned(),
            api_key: api_key.map(ToOwned::to_owned),
            model: "gpt-4o-mini".to_owned(),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn missing_key_reports_not_configured() {
        let service = OpenAiChatCompletionService::new(config(Some("   ")));
        assert!(service.is_ok());
        let service = service.unwrap_or_else(|_| unreachable!());
        assert!(!service.is_configured());
        assert_eq!(service.endpoint, "http://127.0.0.1:9/v1/chat/completions");

        let result = service
            .chat_completion(ChatCompletionRequest {
                messages: vec![ChatMessage::user("hi")],
                ..ChatCompletionRequest::default()
            })
            .await;
        assert_eq!(result, Err(LlmError::NotConfigured));
    }
}
