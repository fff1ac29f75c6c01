use std::collections::BTreeMap;

use async_trait::async_trait;
use promptloom_domain::HttpMethod;
use thiserror::Error;

/// Outbound HTTP request issued by an `api_call` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFetchRequest {
    /// Request method.
    pub method: HttpMethod,
    /// Absolute URL.
    pub url: String,
    /// Header names and values.
    pub headers: BTreeMap<String, String>,
    /// Body text, only set for methods that send one.
    pub body: Option<String>,
}

/// Response of an outbound HTTP request, any status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFetchResponse {
    /// Numeric status code.
    pub status: u16,
    /// Canonical reason phrase, empty when unknown.
    pub status_text: String,
    /// Raw body text.
    pub body: String,
}

impl HttpFetchResponse {
    /// Returns whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level fetch failure. Non-2xx responses are not errors here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpFetchError {
    /// URL could not be parsed or uses an unsupported scheme.
    #[error("invalid URL '{url}': {message}")]
    InvalidUrl {
        /// URL as requested.
        url: String,
        /// Parser detail.
        message: String,
    },
    /// Request did not finish within the client timeout.
    #[error("request timed out")]
    Timeout,
    /// Connection or protocol failure.
    #[error("{0}")]
    Transport(String),
}

/// Port for outbound HTTP requests.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Sends one request and returns the response regardless of status.
    async fn fetch(&self, request: HttpFetchRequest) -> Result<HttpFetchResponse, HttpFetchError>;
}
