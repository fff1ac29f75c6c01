use std::time::Duration;

use async_trait::async_trait;
use promptloom_application::{HttpFetchError, HttpFetchRequest, HttpFetchResponse, HttpFetcher};
use promptloom_core::{AppError, AppResult};
use promptloom_domain::HttpMethod;
use reqwest::{Method, Url};

/// HTTP fetch adapter backed by a shared `reqwest` client.
pub struct ReqwestHttpFetcher {
    http_client: reqwest::Client,
}

impl ReqwestHttpFetcher {
    /// Creates a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                AppError::Internal(format!("failed to build HTTP fetch client: {error}"))
            })?;

        Ok(Self { http_client })
    }
}

fn parse_url(raw: &str) -> Result<Url, HttpFetchError> {
    let url = Url::parse(raw).map_err(|error| HttpFetchError::InvalidUrl {
        url: raw.to_owned(),
        message: error.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(HttpFetchError::InvalidUrl {
            url: raw.to_owned(),
            message: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    Ok(url)
}

fn reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn transport_error(error: reqwest::Error) -> HttpFetchError {
    if error.is_timeout() {
        HttpFetchError::Timeout
    } else {
        HttpFetchError::Transport(error.to_string())
    }
}

#[async_trait]
impl HttpFetcher for ReqwestHttpFetcher {
    async fn fetch(&self, request: HttpFetchRequest) -> Result<HttpFetchResponse, HttpFetchError> {
        let url = parse_url(request.url.as_str())?;

        let mut builder = self
            .http_client
            .request(reqwest_method(request.method), url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        Ok(HttpFetchResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use promptloom_application::{HttpFetchError, HttpFetchRequest, HttpFetcher};
    use promptloom_domain::HttpMethod;

    use super::ReqwestHttpFetcher;

    fn request(url: &str) -> HttpFetchRequest {
        HttpFetchRequest {
            method: HttpMethod::Get,
            url: url.to_owned(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn rejects_unparsable_and_non_http_urls() {
        let fetcher = ReqwestHttpFetcher::new(Duration::from_secs(1));
        assert!(fetcher.is_ok());
        let fetcher = fetcher.unwrap_or_else(|_| unreachable!());

        let relative = fetcher.fetch(request("/just/a/path")).await;
        assert!(matches!(relative, Err(HttpFetchError::InvalidUrl { .. })));

        let ftp = fetcher.fetch(request("ftp://files.test/a.txt")).await;
        assert!(matches!(ftp, Err(HttpFetchError::InvalidUrl { .. })));
    }
}
