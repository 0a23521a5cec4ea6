use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{decode_envelope, non_empty_text, resolve_model, sorted_unique, AiProvider, ProviderSettings};
use crate::ai::capabilities::{self, OPENAI_FAMILIES};
use crate::ai::error::ApiError;
use crate::ai::http::ApiClient;
use crate::ai::types::{KeyTestResult, ProviderKind};
use crate::{Error, Result};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const TEMPERATURE: f32 = 0.3;

const MODELS: &[&str] = &[
    "gpt-4o-mini",
    "gpt-4o",
    "gpt-4.1",
    "gpt-4.1-mini",
    "gpt-4.1-nano",
    "gpt-5",
    "gpt-5-mini",
    "gpt-5-nano",
    "o3-mini",
    "o4-mini",
    "gpt-3.5-turbo",
];

/// Chat-capable families kept from the live catalog
const CHAT_PREFIXES: &[&str] = &["gpt-", "chatgpt-", "o1", "o3", "o4"];
/// Variants inside chat families that do not serve chat completions
const NON_CHAT_MARKERS: &[&str] = &[
    "instruct",
    "audio",
    "realtime",
    "transcribe",
    "tts",
    "image",
    "search",
    "embedding",
    "moderation",
];

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    http: ApiClient,
    api_key: String,
    model: String,
    settings: ProviderSettings,
    chat_url: Url,
    models_url: Url,
    headers: HeaderMap,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Self::with_settings(api_key, model, ProviderSettings::default())
    }

    pub fn with_settings(api_key: &str, model: &str, settings: ProviderSettings) -> Result<Self> {
        let api_key = api_key.trim().to_string();
        let base = settings.base_url_or(DEFAULT_BASE_URL);
        let chat_url = Url::parse(&format!("{base}/v1/chat/completions"))?;
        let models_url = Url::parse(&format!("{base}/v1/models"))?;

        let mut bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| Error::Config("OpenAI API key contains invalid characters".to_string()))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer);

        Ok(Self {
            http: ApiClient::new(ProviderKind::OpenAi)?,
            api_key,
            model: resolve_model(model, Self::recognizes, DEFAULT_MODEL),
            settings,
            chat_url,
            models_url,
            headers,
        })
    }

    fn recognizes(model: &str) -> bool {
        MODELS.contains(&model) || capabilities::is_known_family(OPENAI_FAMILIES, model)
    }

    fn is_chat_model(id: &str) -> bool {
        CHAT_PREFIXES.iter().any(|p| id.starts_with(p)) && !NON_CHAT_MARKERS.iter().any(|m| id.contains(m))
    }
}

#[async_trait::async_trait]
impl AiProvider for OpenAiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
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
        self.chat_url.clone()
    }

    fn auth_headers(&self) -> HeaderMap {
        self.headers.clone()
    }

    fn request_body(&self, system: &str, user: &str) -> Value {
        let caps = capabilities::lookup(OPENAI_FAMILIES, &self.model);

        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });
        if caps.temperature {
            body["temperature"] = json!(TEMPERATURE);
        }
        if caps.json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }

    fn extract_text(&self, body: &str) -> std::result::Result<String, ApiError> {
        let response: ChatResponse = decode_envelope(self.kind(), body)?;
        let message = response.choices.into_iter().next().and_then(|c| c.message);

        if let Some(ChatMessage {
            content: None,
            refusal: Some(refusal),
        }) = &message
        {
            return Err(ApiError::Vendor {
                provider: self.kind().display_name(),
                status: 200,
                message: refusal.clone(),
            });
        }

        non_empty_text(self.kind(), message.and_then(|m| m.content))
    }

    async fn test_api_key(&self) -> KeyTestResult {
        if let Err(e) = self.ensure_api_key() {
            return e.into();
        }

        let response = self
            .http
            .get(self.models_url.clone(), self.headers.clone(), self.settings.probe_timeout)
            .await;

        match response {
            Ok(resp) if resp.status.is_success() => {
                let valid = KeyTestResult::valid(self.kind());
                match serde_json::from_str::<ModelList>(&resp.body) {
                    Ok(list) => valid.with_model_count(list.data.len()),
                    Err(_) => valid,
                }
            }
            Ok(resp) => self.classify_failure(resp.status, &resp.body).into(),
            Err(e) => e.into(),
        }
    }

    async fn fetch_models_from_api(&self) -> Vec<String> {
        if self.api_key.is_empty() {
            return Vec::new();
        }

        let response = self
            .http
            .get(self.models_url.clone(), self.headers.clone(), self.settings.probe_timeout)
            .await;

        let list = match response {
            Ok(resp) if resp.status.is_success() => serde_json::from_str::<ModelList>(&resp.body).ok(),
            Ok(resp) => {
                tracing::warn!(status = resp.status.as_u16(), "OpenAI model listing failed");
                None
            }
            Err(_) => None,
        };

        let Some(list) = list else {
            return Vec::new();
        };

        let models = sorted_unique(
            list.data
                .into_iter()
                .map(|m| m.id)
                .filter(|id| Self::is_chat_model(id))
                .collect(),
        );
        tracing::info!(count = models.len(), "Fetched OpenAI models");
        models
    }
}
