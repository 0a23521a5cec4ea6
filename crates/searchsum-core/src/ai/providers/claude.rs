use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{decode_envelope, non_empty_text, resolve_model, AiProvider, ProviderSettings};
use crate::ai::error::ApiError;
use crate::ai::http::ApiClient;
use crate::ai::types::{KeyTestResult, ProviderKind};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";
const MAX_TOKENS: u32 = 2048;
const PROBE_MAX_TOKENS: u32 = 10;
const TEMPERATURE: f32 = 0.3;

const MODELS: &[&str] = &[
    "claude-sonnet-4-20250514",
    "claude-opus-4-20250514",
    "claude-3-7-sonnet-20250219",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-haiku-20240307",
];

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

/// Claude/Anthropic messages API provider
pub struct ClaudeProvider {
    http: ApiClient,
    api_key: String,
    model: String,
    settings: ProviderSettings,
    messages_url: Url,
    headers: HeaderMap,
}

impl ClaudeProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Self::with_settings(api_key, model, ProviderSettings::default())
    }

    pub fn with_settings(api_key: &str, model: &str, settings: ProviderSettings) -> Result<Self> {
        let api_key = api_key.trim().to_string();
        let base = settings.base_url_or(DEFAULT_BASE_URL);
        let messages_url = Url::parse(&format!("{base}/v1/messages"))?;

        let mut key = HeaderValue::from_str(&api_key)
            .map_err(|_| Error::Config("Claude API key contains invalid characters".to_string()))?;
        key.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-api-key"), key);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(API_VERSION),
        );

        Ok(Self {
            http: ApiClient::new(ProviderKind::Claude)?,
            api_key,
            model: resolve_model(model, Self::recognizes, DEFAULT_MODEL),
            settings,
            messages_url,
            headers,
        })
    }

    fn recognizes(model: &str) -> bool {
        MODELS.contains(&model) || model.starts_with("claude-")
    }
}

#[async_trait::async_trait]
impl AiProvider for ClaudeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn settings(&self) -> &ProviderSettings {
        &self.settings
    }

    fn http(&self) -> &ApiClient {
        &self.http
    }

    fn available_models(&self) -> Vec<String> {
        MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn default_model(&self) -> &'static str {
        DEFAULT_MODEL
    }

    fn endpoint(&self) -> Url {
        self.messages_url.clone()
    }

    fn auth_headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    fn request_body(&self, system: &str, user: &str) -> Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "temperature": TEMPERATURE,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        })
    }

    fn extract_text(&self, body: &str) -> std::result::Result<String, ApiError> {
        let response: ClaudeResponse = decode_envelope(self.kind(), body)?;

        let text: String = response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect();

        non_empty_text(self.kind(), Some(text))
    }

    async fn test_api_key(&self) -> KeyTestResult {
        if let Err(e) = self.ensure_api_key() {
            return e.into();
        }

        let body = json!({
            "model": self.model,
            "max_tokens": PROBE_MAX_TOKENS,
            "messages": [{"role": "user", "content": "Hi"}],
        });

        let response = self
            .http
            .post_json(self.endpoint(), self.auth_headers(), &body, self.settings.probe_timeout)
            .await;

        match response {
            Ok(resp) if resp.status.is_success() => KeyTestResult::valid(self.kind()),
            Ok(resp) => self.classify_failure(resp.status, &resp.body).into(),
            Err(e) => e.into(),
        }
    }

    /// Anthropic has no listing endpoint wired here; the curated list is
    /// authoritative.
    async fn fetch_models_from_api(&self) -> Vec<String> {
        self.available_models()
    }
}
