//! Shared HTTP plumbing for vendor adapters
//!
//! Every adapter owns one `ApiClient`. It performs a single request per call
//! with a per-request timeout and turns transport failures into `ApiError`
//! using reqwest's error flags. Non-2xx responses are returned to the caller
//! untouched so each adapter can apply its own classification on top of
//! [`classify_failure`].

use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use url::Url;

use super::error::ApiError;
use super::types::ProviderKind;

/// Timeout for summary generation
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
/// Timeout for key probes and model listing
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = concat!("searchsum/", env!("CARGO_PKG_VERSION"));

/// Status and raw body of a completed exchange
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

pub struct ApiClient {
    client: Client,
    provider: ProviderKind,
}

impl ApiClient {
    pub fn new(provider: ProviderKind) -> crate::Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, provider })
    }

    pub async fn get(&self, url: Url, headers: HeaderMap, timeout: Duration) -> Result<HttpResponse, ApiError> {
        tracing::debug!(provider = self.provider.id(), path = url.path(), "GET");
        let request = self
            .client
            .get(url)
            .headers(headers)
            .header(ACCEPT, "application/json")
            .timeout(timeout);
        self.send(request).await
    }

    pub async fn post_json(
        &self,
        url: Url,
        headers: HeaderMap,
        body: &Value,
        timeout: Duration,
    ) -> Result<HttpResponse, ApiError> {
        tracing::debug!(provider = self.provider.id(), path = url.path(), "POST");
        let request = self
            .client
            .post(url)
            .headers(headers)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .timeout(timeout);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<HttpResponse, ApiError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::debug!(
            provider = self.provider.id(),
            status = status.as_u16(),
            bytes = body.len(),
            "Received response"
        );

        Ok(HttpResponse { status, body })
    }

    fn transport_error(&self, err: reqwest::Error) -> ApiError {
        // The URL may carry a query-string key
        let err = err.without_url();
        let provider = self.provider.display_name();

        tracing::warn!(provider = self.provider.id(), error = %err, "Request failed");

        if err.is_timeout() {
            ApiError::Timeout { provider }
        } else if err.is_connect() {
            ApiError::Connection { provider }
        } else {
            ApiError::Transport {
                provider,
                message: err.to_string(),
            }
        }
    }
}

/// Map a non-2xx status to the shared error taxonomy
pub fn classify_failure(provider: ProviderKind, status: StatusCode, body: &str) -> ApiError {
    let name = provider.display_name();
    let code = status.as_u16();

    match code {
        401 => ApiError::InvalidApiKey { provider: name, status: code },
        429 => ApiError::RateLimited { provider: name },
        500..=599 => ApiError::ServiceUnavailable { provider: name, status: code },
        _ => match vendor_error_message(body) {
            Some(message) => ApiError::Vendor {
                provider: name,
                status: code,
                message,
            },
            None => ApiError::Http { provider: name, status: code },
        },
    }
}

/// Extract a human readable message from a vendor error payload
///
/// Understands `{"error": {"message": ..}}` (OpenAI, Claude, Gemini),
/// `{"error": ".."}` and `{"message": ".."}`.
pub fn vendor_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let message = match value.get("error") {
        Some(Value::Object(error)) => error.get("message").and_then(Value::as_str),
        Some(Value::String(error)) => Some(error.as_str()),
        _ => value.get("message").and_then(Value::as_str),
    }?;

    let message = message.trim();
    if message.is_empty() {
        None
    } else {
        Some(message.to_string())
    }
}
