//! Chat-completion port used by prompt steps.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// Instructions that frame the conversation.
    System,
    /// End-user input.
    User,
    /// Model output.
    Assistant,
    /// Tool call result.
    Tool,
    /// Legacy function call result.
    Function,
    /// Any role this client does not model, such as `developer`.
    #[serde(other)]
    Other,
}

/// One structured content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatContentPart {
    /// Plain text.
    Text {
        /// Text value.
        text: String,
    },
    /// Image reference.
    ImageUrl {
        /// Image location.
        image_url: ChatImageUrl,
    },
    /// Any part type this client does not model, such as `refusal`.
    #[serde(other)]
    Other,
}

/// Image location inside a content part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatImageUrl {
    /// HTTP or data URL.
    pub url: String,
}

/// Message content, either a plain string or structured parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Plain text content.
    Text(String),
    /// Structured content parts.
    Parts(Vec<ChatContentPart>),
}

impl ChatContent {
    /// Returns the textual content. Structured parts contribute their text
    /// parts concatenated in order; other parts are ignored.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ChatContentPart::Text { text } => Some(text.as_str()),
                    ChatContentPart::ImageUrl { .. } | ChatContentPart::Other => None,
                })
                .collect(),
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: ChatRole,
    /// Message content, absent on some assistant tool-call replies.
    #[serde(default)]
    pub content: Option<ChatContent>,
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: Some(ChatContent::Text(content.into())),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: Some(ChatContent::Text(content.into())),
        }
    }
}

/// Chat-completion request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatCompletionRequest {
    /// Ordered conversation.
    pub messages: Vec<ChatMessage>,
    /// Optional sampling temperature.
    pub temperature: Option<f32>,
    /// Optional tool definitions passed through to the provider.
    pub tools: Option<Vec<Value>>,
}

/// One completion choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Generated message.
    pub message: ChatMessage,
}

/// Chat-completion response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    /// Generated choices, first one is used.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

impl ChatCompletion {
    /// Returns the first choice's text, or an empty string when there is none.
    #[must_use]
    pub fn first_text(&self) -> String {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .map(ChatContent::text)
            .unwrap_or_default()
    }
}

/// Failures surfaced by the LLM port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    /// No provider credentials are configured.
    #[error("LLM service is not configured")]
    NotConfigured,
    /// Provider request failed.
    #[error("LLM request failed{}: {message}", status_suffix(.status))]
    Request {
        /// HTTP status when the provider answered.
        status: Option<u16>,
        /// Failure detail.
        message: String,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" with status {status}"))
        .unwrap_or_default()
}

/// Port for chat-completion providers.
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Runs one chat completion.
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletion, LlmError>;
}
