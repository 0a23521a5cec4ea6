use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::{ProviderConfig, ProviderKind, ProviderSettings};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// AI provider: "openai", "claude", "gemini"
    #[serde(default = "default_ai_provider")]
    pub provider: String,
    /// OpenAI API key (falls back to OPENAI_API_KEY)
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// OpenAI model name
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default)]
    pub openai_base_url: Option<String>,
    /// Claude/Anthropic API key (falls back to ANTHROPIC_API_KEY)
    #[serde(default)]
    pub claude_api_key: Option<String>,
    /// Claude model name
    #[serde(default = "default_claude_model")]
    pub claude_model: String,
    #[serde(default)]
    pub claude_base_url: Option<String>,
    /// Gemini API key (falls back to GEMINI_API_KEY)
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
    /// Timeout for summary generation
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Timeout for key tests and model listing
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
    /// Maximum number of posts sent to the model
    #[serde(default = "default_max_posts")]
    pub max_posts: usize,
    /// Per-post content limit (chars)
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_ai_provider(),
            openai_api_key: None,
            openai_model: default_openai_model(),
            openai_base_url: None,
            claude_api_key: None,
            claude_model: default_claude_model(),
            claude_base_url: None,
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_base_url: None,
            request_timeout_secs: default_request_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            max_posts: default_max_posts(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ai_provider() -> String {
    "openai".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_claude_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_request_timeout() -> u64 {
    60
}

fn default_probe_timeout() -> u64 {
    15
}

fn default_max_posts() -> usize {
    10
}

fn default_max_content_chars() -> usize {
    3000
}

impl AiConfig {
    /// Configured provider kind
    pub fn provider_kind(&self) -> crate::Result<ProviderKind> {
        self.provider.parse()
    }

    /// API key from the config file, else the vendor's environment variable
    pub fn api_key_for(&self, kind: ProviderKind) -> String {
        let (configured, env_var) = match kind {
            ProviderKind::OpenAi => (&self.openai_api_key, "OPENAI_API_KEY"),
            ProviderKind::Claude => (&self.claude_api_key, "ANTHROPIC_API_KEY"),
            ProviderKind::Gemini => (&self.gemini_api_key, "GEMINI_API_KEY"),
        };

        configured
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| std::env::var(env_var).ok())
            .unwrap_or_default()
    }

    pub fn model_for(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::OpenAi => &self.openai_model,
            ProviderKind::Claude => &self.claude_model,
            ProviderKind::Gemini => &self.gemini_model,
        }
    }

    pub fn settings_for(&self, kind: ProviderKind) -> ProviderSettings {
        let base_url = match kind {
            ProviderKind::OpenAi => &self.openai_base_url,
            ProviderKind::Claude => &self.claude_base_url,
            ProviderKind::Gemini => &self.gemini_base_url,
        };

        ProviderSettings {
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs.max(1)),
            base_url: base_url.clone(),
            max_posts: self.max_posts.max(1),
            max_content_chars: self.max_content_chars.max(1),
        }
    }

    /// Credentials and model for the configured provider
    pub fn provider_config(&self) -> crate::Result<ProviderConfig> {
        let kind = self.provider_kind()?;
        Ok(ProviderConfig::new(kind, self.api_key_for(kind), self.model_for(kind)))
    }
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/searchsum/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("searchsum")
            .join("config.toml")
    }
}
