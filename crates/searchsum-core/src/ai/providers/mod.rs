mod claude;
mod gemini;
mod openai;

pub use claude::ClaudeProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::error::ApiError;
use super::http::{self, ApiClient, DEFAULT_PROBE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use super::output;
use super::prompt;
use super::types::{KeyTestResult, PostContext, ProviderKind, SummaryAnswer, SummaryRequest, SummaryResult};

/// Tunables shared by all adapters
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Timeout for summary generation
    pub request_timeout: Duration,
    /// Timeout for key tests and model listing
    pub probe_timeout: Duration,
    /// Replaces the vendor's `scheme://host` (proxies, test servers)
    pub base_url: Option<String>,
    /// Posts beyond this count are not sent to the model
    pub max_posts: usize,
    /// Per-post content limit in characters
    pub max_content_chars: usize,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            base_url: None,
            max_posts: 10,
            max_content_chars: 3000,
        }
    }
}

impl ProviderSettings {
    /// Base URL without a trailing slash
    pub(crate) fn base_url_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.base_url
            .as_deref()
            .map(|b| b.trim_end_matches('/'))
            .filter(|b| !b.is_empty())
            .unwrap_or(default)
    }
}

/// Pick `requested` when the adapter recognizes it, else the default model
pub(crate) fn resolve_model(requested: &str, recognizes: impl Fn(&str) -> bool, default: &str) -> String {
    let requested = requested.trim();
    if requested.is_empty() {
        return default.to_string();
    }
    if recognizes(requested) {
        requested.to_string()
    } else {
        tracing::warn!(model = requested, fallback = default, "Unrecognized model, using default");
        default.to_string()
    }
}

/// Contract every vendor adapter implements
///
/// Adapters supply the endpoint, headers, body shape and response parsing;
/// `generate_summary` drives them through the shared flow. None of the
/// public operations fail: errors come back as `SummaryResult::Error`,
/// an unsuccessful `KeyTestResult`, or an empty/fallback model list.
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Resolved model id used for requests
    fn model(&self) -> &str;

    fn api_key(&self) -> &str;

    fn settings(&self) -> &ProviderSettings;

    fn http(&self) -> &ApiClient;

    /// Curated model ids
    fn available_models(&self) -> Vec<String>;

    fn default_model(&self) -> &'static str;

    /// Chat/completion endpoint
    fn endpoint(&self) -> Url;

    fn auth_headers(&self) -> HeaderMap;

    /// Vendor request body for one summary call
    fn request_body(&self, system: &str, user: &str) -> Value;

    /// Locate the model's text in a successful response body
    fn extract_text(&self, body: &str) -> Result<String, ApiError>;

    /// Map a non-2xx response to an error
    fn classify_failure(&self, status: StatusCode, body: &str) -> ApiError {
        http::classify_failure(self.kind(), status, body)
    }

    /// Probe the vendor with a cheap authenticated call
    async fn test_api_key(&self) -> KeyTestResult;

    /// Live model catalog, or an empty/curated list when unavailable
    async fn fetch_models_from_api(&self) -> Vec<String>;

    fn ensure_api_key(&self) -> Result<(), ApiError> {
        if self.api_key().is_empty() {
            Err(ApiError::MissingApiKey {
                provider: self.kind().display_name(),
            })
        } else {
            Ok(())
        }
    }

    /// Answer `query` from `posts`
    async fn generate_summary(&self, query: &str, posts: &[PostContext]) -> SummaryResult {
        let result = self.try_generate_summary(query, posts).await;
        if let Err(e) = &result {
            tracing::warn!(provider = self.kind().id(), kind = ?e.kind(), error = %e, "Summary generation failed");
        }
        result.into()
    }

    async fn summarize(&self, request: &SummaryRequest) -> SummaryResult {
        self.generate_summary(&request.query, &request.posts).await
    }

    /// Same as `generate_summary` but keeps the typed error
    async fn try_generate_summary(&self, query: &str, posts: &[PostContext]) -> Result<SummaryAnswer, ApiError> {
        self.ensure_api_key()?;

        let settings = self.settings();
        let system = prompt::system_instruction();
        let user = prompt::user_message(query, posts, settings.max_posts, settings.max_content_chars);
        let body = self.request_body(&system, &user);

        tracing::info!(
            provider = self.kind().id(),
            model = self.model(),
            posts = posts.len().min(settings.max_posts),
            "Generating summary"
        );

        let response = self
            .http()
            .post_json(self.endpoint(), self.auth_headers(), &body, settings.request_timeout)
            .await?;

        if !response.status.is_success() {
            return Err(self.classify_failure(response.status, &response.body));
        }

        let text = self.extract_text(&response.body)?;
        let object = output::parse_model_output(&text)?;
        Ok(output::normalize(object, posts))
    }
}

/// Decode a response envelope, mapping failures to `InvalidResponse`
pub(crate) fn decode_envelope<T: serde::de::DeserializeOwned>(
    provider: ProviderKind,
    body: &str,
) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::debug!(provider = provider.id(), error = %e, "Undecodable response envelope");
        ApiError::InvalidResponse {
            provider: provider.display_name(),
        }
    })
}

/// Non-empty text or `EmptyResponse`
pub(crate) fn non_empty_text(provider: ProviderKind, text: Option<String>) -> Result<String, ApiError> {
    match text {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ApiError::EmptyResponse {
            provider: provider.display_name(),
        }),
    }
}

/// Sorted, deduplicated model ids
pub(crate) fn sorted_unique(mut models: Vec<String>) -> Vec<String> {
    models.sort();
    models.dedup();
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model() {
        let recognizes = |m: &str| m.starts_with("gpt-");
        assert_eq!(resolve_model("", recognizes, "gpt-4o-mini"), "gpt-4o-mini");
        assert_eq!(resolve_model(" gpt-4o ", recognizes, "gpt-4o-mini"), "gpt-4o");
        assert_eq!(resolve_model("llama-3", recognizes, "gpt-4o-mini"), "gpt-4o-mini");
    }

    #[test]
    fn test_base_url_override() {
        let mut settings = ProviderSettings::default();
        assert_eq!(settings.base_url_or("https://api.openai.com"), "https://api.openai.com");

        settings.base_url = Some("http://127.0.0.1:8080/".to_string());
        assert_eq!(settings.base_url_or("https://api.openai.com"), "http://127.0.0.1:8080");

        settings.base_url = Some(String::new());
        assert_eq!(settings.base_url_or("https://api.openai.com"), "https://api.openai.com");
    }

    #[test]
    fn test_sorted_unique() {
        let models = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(sorted_unique(models), vec!["a", "b"]);
    }

    #[test]
    fn test_non_empty_text() {
        assert!(non_empty_text(ProviderKind::Gemini, Some("  ".to_string())).is_err());
        assert_eq!(non_empty_text(ProviderKind::Gemini, Some("x".to_string())).unwrap(), "x");
    }
}
