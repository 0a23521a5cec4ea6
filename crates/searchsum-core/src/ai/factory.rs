use std::sync::Arc;

use super::providers::{AiProvider, ClaudeProvider, GeminiProvider, OpenAiProvider, ProviderSettings};
use super::types::{ProviderConfig, ProviderKind};

const DEFAULT_PROVIDER: ProviderKind = ProviderKind::OpenAi;

/// Single source of provider ids, names and construction
pub struct ProviderFactory;

impl ProviderFactory {
    /// Provider ids and display names, in presentation order
    pub fn available_providers() -> Vec<(&'static str, &'static str)> {
        ProviderKind::ALL
            .iter()
            .map(|kind| (kind.id(), kind.display_name()))
            .collect()
    }

    pub fn is_valid_provider(id: &str) -> bool {
        id.parse::<ProviderKind>().is_ok()
    }

    pub fn default_provider() -> &'static str {
        DEFAULT_PROVIDER.id()
    }

    /// Build an adapter with default settings
    ///
    /// Returns `None` for an unknown id or when the adapter cannot be built;
    /// callers should report the provider as unavailable.
    pub fn create(id: &str, api_key: &str, model: &str) -> Option<Arc<dyn AiProvider>> {
        Self::create_with_settings(id, api_key, model, ProviderSettings::default())
    }

    pub fn create_with_settings(
        id: &str,
        api_key: &str,
        model: &str,
        settings: ProviderSettings,
    ) -> Option<Arc<dyn AiProvider>> {
        let kind = match id.parse::<ProviderKind>() {
            Ok(kind) => kind,
            Err(_) => {
                tracing::warn!(provider = id, "Unknown AI provider");
                return None;
            }
        };

        let built: crate::Result<Arc<dyn AiProvider>> = match kind {
            ProviderKind::OpenAi => {
                OpenAiProvider::with_settings(api_key, model, settings).map(|p| Arc::new(p) as Arc<dyn AiProvider>)
            }
            ProviderKind::Claude => {
                ClaudeProvider::with_settings(api_key, model, settings).map(|p| Arc::new(p) as Arc<dyn AiProvider>)
            }
            ProviderKind::Gemini => {
                GeminiProvider::with_settings(api_key, model, settings).map(|p| Arc::new(p) as Arc<dyn AiProvider>)
            }
        };

        match built {
            Ok(provider) => {
                tracing::debug!(provider = kind.id(), model = provider.model(), "Created AI provider");
                Some(provider)
            }
            Err(e) => {
                tracing::warn!(provider = kind.id(), error = %e, "Failed to create AI provider");
                None
            }
        }
    }

    pub fn from_config(config: &ProviderConfig, settings: ProviderSettings) -> Option<Arc<dyn AiProvider>> {
        Self::create_with_settings(config.provider.id(), &config.api_key, &config.model, settings)
    }
}
