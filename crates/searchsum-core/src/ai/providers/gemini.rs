use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{decode_envelope, non_empty_text, resolve_model, sorted_unique, AiProvider, ProviderSettings};
use crate::ai::capabilities::{self, GEMINI_FAMILIES};
use crate::ai::error::ApiError;
use crate::ai::http::{self, ApiClient};
use crate::ai::prompt;
use crate::ai::types::{KeyTestResult, ProviderKind};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const TEMPERATURE: f32 = 0.3;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 2048;

const MODELS: &[&str] = &[
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash",
    "gemini-2.0-flash-lite",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
];

/// Catalog entries that support generateContent but are not text chat models
const NON_CHAT_MARKERS: &[&str] = &["embedding", "tts", "image", "aqa"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    name: String,
    supported_generation_methods: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

/// Google Gemini generateContent provider
pub struct GeminiProvider {
    http: ApiClient,
    api_key: String,
    model: String,
    settings: ProviderSettings,
    generate_url: Url,
    models_url: Url,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Self::with_settings(api_key, model, ProviderSettings::default())
    }

    pub fn with_settings(api_key: &str, model: &str, settings: ProviderSettings) -> Result<Self> {
        let api_key = api_key.trim().to_string();
        let model = resolve_model(model, Self::recognizes, DEFAULT_MODEL);
        let base = settings.base_url_or(DEFAULT_BASE_URL);

        let mut generate_url = Url::parse(&format!("{base}/v1beta/models"))?;
        generate_url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("Gemini base URL cannot hold a path: {base}")))?
            .push(&format!("{model}:generateContent"));
        generate_url.query_pairs_mut().append_pair("key", &api_key);

        let mut models_url = Url::parse(&format!("{base}/v1beta/models"))?;
        models_url
            .query_pairs_mut()
            .append_pair("key", &api_key)
            .append_pair("pageSize", "1000");

        Ok(Self {
            http: ApiClient::new(ProviderKind::Gemini)?,
            api_key,
            model,
            settings,
            generate_url,
            models_url,
        })
    }

    /// Curated ids, or family ids made of `[A-Za-z0-9._-]` only
    fn recognizes(model: &str) -> bool {
        MODELS.contains(&model)
            || (model.starts_with("gemini-")
                && model
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    }

    /// Gemini rejects bad keys with 400 INVALID_ARGUMENT and a typed reason
    fn is_invalid_key(body: &str) -> bool {
        serde_json::from_str::<ErrorEnvelope>(body)
            .map(|e| {
                e.error
                    .details
                    .iter()
                    .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
            })
            .unwrap_or(false)
    }

    fn chat_model_id(entry: ModelEntry) -> Option<String> {
        let id = entry.name.strip_prefix("models/").unwrap_or(&entry.name);
        let generates = entry
            .supported_generation_methods
            .as_ref()
            .map_or(true, |methods| methods.iter().any(|m| m == "generateContent"));

        if generates && id.starts_with("gemini-") && !NON_CHAT_MARKERS.iter().any(|m| id.contains(m)) {
            Some(id.to_string())
        } else {
            None
        }
    }
}

#[async_trait::async_trait]
impl AiProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
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
        self.generate_url.clone()
    }

    /// The key travels in the query string
    fn auth_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    fn request_body(&self, system: &str, user: &str) -> Value {
        let mut generation_config = json!({
            "temperature": TEMPERATURE,
            "topK": TOP_K,
            "topP": TOP_P,
            "maxOutputTokens": MAX_OUTPUT_TOKENS,
        });
        if capabilities::lookup(GEMINI_FAMILIES, &self.model).json_mode {
            generation_config["responseMimeType"] = json!("application/json");
        }

        json!({
            "contents": [{"parts": [{"text": prompt::combined_prompt(system, user)}]}],
            "generationConfig": generation_config,
        })
    }

    fn extract_text(&self, body: &str) -> std::result::Result<String, ApiError> {
        let response: GeminiResponse = decode_envelope(self.kind(), body)?;

        let candidate = response.candidates.and_then(|c| c.into_iter().next());
        if candidate.is_none() {
            if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(ApiError::Vendor {
                    provider: self.kind().display_name(),
                    status: 200,
                    message: format!("request blocked ({reason})"),
                });
            }
        }

        let text: Option<String> = candidate
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect());

        non_empty_text(self.kind(), text)
    }

    fn classify_failure(&self, status: StatusCode, body: &str) -> ApiError {
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN) && Self::is_invalid_key(body) {
            return ApiError::InvalidApiKey {
                provider: self.kind().display_name(),
                status: status.as_u16(),
            };
        }
        http::classify_failure(self.kind(), status, body)
    }

    async fn test_api_key(&self) -> KeyTestResult {
        if let Err(e) = self.ensure_api_key() {
            return e.into();
        }

        let response = self
            .http
            .get(self.models_url.clone(), HeaderMap::new(), self.settings.probe_timeout)
            .await;

        match response {
            Ok(resp) if resp.status.is_success() => {
                let valid = KeyTestResult::valid(self.kind());
                match serde_json::from_str::<ModelList>(&resp.body) {
                    Ok(list) => valid.with_model_count(list.models.len()),
                    Err(_) => valid,
                }
            }
            Ok(resp) => self.classify_failure(resp.status, &resp.body).into(),
            Err(e) => e.into(),
        }
    }

    async fn fetch_models_from_api(&self) -> Vec<String> {
        if self.api_key.is_empty() {
            return self.available_models();
        }

        let response = self
            .http
            .get(self.models_url.clone(), HeaderMap::new(), self.settings.probe_timeout)
            .await;

        let list = match response {
            Ok(resp) if resp.status.is_success() => serde_json::from_str::<ModelList>(&resp.body).ok(),
            Ok(resp) => {
                tracing::warn!(status = resp.status.as_u16(), "Gemini model listing failed");
                None
            }
            Err(_) => None,
        };

        let models = list
            .map(|l| sorted_unique(l.models.into_iter().filter_map(Self::chat_model_id).collect()))
            .unwrap_or_default();

        if models.is_empty() {
            tracing::info!("Gemini model listing empty or malformed, using curated list");
            return self.available_models();
        }

        tracing::info!(count = models.len(), "Fetched Gemini models");
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(model: &str) -> GeminiProvider {
        GeminiProvider::new("AIza-test", model).unwrap()
    }

    #[test]
    fn test_endpoint_carries_model_and_key() {
        let url = provider("gemini-1.5-pro").endpoint();
        assert_eq!(url.path(), "/v1beta/models/gemini-1.5-pro:generateContent");
        assert_eq!(url.query(), Some("key=AIza-test"));
        assert!(provider("").auth_headers().is_empty());
    }

    #[test]
    fn test_model_with_url_syntax_falls_back() {
        let p = provider("gemini-x?alt=sse#");
        assert_eq!(p.model(), DEFAULT_MODEL);
        assert_eq!(p.endpoint().path(), "/v1beta/models/gemini-2.0-flash:generateContent");
        assert_eq!(p.endpoint().query(), Some("key=AIza-test"));
        assert!(p.endpoint().fragment().is_none());

        assert_eq!(provider("gemini-2.5-flash-preview-05-20").model(), "gemini-2.5-flash-preview-05-20");
        assert_eq!(provider("gemini-exp/../../v1").model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_request_body_is_single_prompt() {
        let body = provider("gemini-2.0-flash").request_body("sys", "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "sys\n\nuser");
        assert_eq!(body["generationConfig"]["topK"], TOP_K);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], MAX_OUTPUT_TOKENS);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");

        let body = provider("gemini-1.0-pro").request_body("sys", "user");
        assert!(body["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn test_extract_text() {
        let p = provider("");
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#;
        assert_eq!(p.extract_text(body).unwrap(), r#"{"a":1}"#);

        let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = p.extract_text(blocked).unwrap_err();
        assert_eq!(err.to_string(), "Gemini API error: request blocked (SAFETY)");

        assert!(matches!(p.extract_text(r#"{"candidates":[]}"#), Err(ApiError::EmptyResponse { .. })));
    }

    #[test]
    fn test_invalid_key_on_bad_request() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID"}]}}"#;
        let err = provider("").classify_failure(StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, ApiError::InvalidApiKey { status: 400, .. }));

        let other = r#"{"error":{"code":400,"message":"Invalid JSON payload","status":"INVALID_ARGUMENT"}}"#;
        let err = provider("").classify_failure(StatusCode::BAD_REQUEST, other);
        assert_eq!(err.to_string(), "Gemini API error: Invalid JSON payload");
    }

    #[test]
    fn test_chat_model_id_filter() {
        let entry = |name: &str, methods: &[&str]| ModelEntry {
            name: name.to_string(),
            supported_generation_methods: Some(methods.iter().map(|m| m.to_string()).collect()),
        };

        assert_eq!(
            GeminiProvider::chat_model_id(entry("models/gemini-2.5-flash", &["generateContent"])).as_deref(),
            Some("gemini-2.5-flash")
        );
        assert!(GeminiProvider::chat_model_id(entry("models/gemini-embedding-001", &["embedContent"])).is_none());
        assert!(GeminiProvider::chat_model_id(entry("models/gemma-3-27b-it", &["generateContent"])).is_none());
    }
}
