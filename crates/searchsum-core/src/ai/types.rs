use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ErrorKind};

/// Maximum number of entries kept in `SummaryAnswer::results`
pub const MAX_RESULTS: usize = 5;

/// Supported AI vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Claude,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::OpenAi, ProviderKind::Claude, ProviderKind::Gemini];

    /// Identifier used in configuration
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Claude => "claude",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Human readable vendor name, used in user-facing messages
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Claude => "Claude",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "claude" => Ok(ProviderKind::Claude),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(crate::Error::UnknownProvider(other.to_string())),
        }
    }
}

/// Credentials and model selection for one provider
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    /// Empty means "use the provider default"
    pub model: String,
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Post,
    Page,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Page => "page",
        }
    }
}

/// A matched post handed over by the host search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostContext {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub post_type: PostType,
    #[serde(default)]
    pub content: String,
    /// Publication date as supplied by the host, e.g. "2024-01-31"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub query: String,
    /// Caller-ordered, typically newest first
    #[serde(default)]
    pub posts: Vec<PostContext>,
}

/// One entry of the normalized result list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub excerpt: String,
    #[serde(rename = "type")]
    pub post_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryAnswer {
    pub answer_html: String,
    pub results: Vec<SearchHit>,
}

/// Normalized outcome of `generate_summary`
///
/// Serializes to either `{"answer_html", "results"}` or `{"error"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryResult {
    Answer(SummaryAnswer),
    Error { error: String },
}

impl SummaryResult {
    pub fn is_error(&self) -> bool {
        matches!(self, SummaryResult::Error { .. })
    }

    pub fn answer(&self) -> Option<&SummaryAnswer> {
        match self {
            SummaryResult::Answer(answer) => Some(answer),
            SummaryResult::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SummaryResult::Answer(_) => None,
            SummaryResult::Error { error } => Some(error),
        }
    }
}

impl From<Result<SummaryAnswer, ApiError>> for SummaryResult {
    fn from(result: Result<SummaryAnswer, ApiError>) -> Self {
        match result {
            Ok(answer) => SummaryResult::Answer(answer),
            Err(e) => SummaryResult::Error { error: e.to_string() },
        }
    }
}

/// Outcome of an API key probe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyTestResult {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_count: Option<usize>,
}

impl KeyTestResult {
    pub fn valid(provider: ProviderKind) -> Self {
        Self {
            success: true,
            message: format!("{} API key is valid.", provider.display_name()),
            error_kind: None,
            status_code: None,
            model_count: None,
        }
    }

    pub fn with_model_count(mut self, count: usize) -> Self {
        self.model_count = Some(count);
        self
    }
}

impl From<ApiError> for KeyTestResult {
    fn from(err: ApiError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            error_kind: Some(err.kind()),
            status_code: err.status_code(),
            model_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" Claude ".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert!("mistral".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_summary_result_shapes() {
        let answer = SummaryResult::Answer(SummaryAnswer {
            answer_html: "<p>Hi</p>".to_string(),
            results: vec![],
        });
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["answer_html"], "<p>Hi</p>");
        assert!(json.get("error").is_none());

        let error = SummaryResult::Error { error: "boom".to_string() };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json, serde_json::json!({"error": "boom"}));
    }

    #[test]
    fn test_post_context_defaults() {
        let post: PostContext =
            serde_json::from_str(r#"{"id": 7, "title": "T", "url": "https://x/7"}"#).unwrap();
        assert_eq!(post.post_type, PostType::Post);
        assert!(post.content.is_empty());
        assert!(post.date.is_none());
    }
}
