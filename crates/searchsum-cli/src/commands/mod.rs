pub mod models;
pub mod providers;
pub mod summarize;
pub mod test_key;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::Serialize;

use searchsum_core::ai::{AiProvider, ProviderConfig, ProviderKind, ProviderSettings};
use searchsum_core::{AppConfig, ProviderFactory};

/// Provider, credentials and settings after applying CLI overrides
pub struct Selection {
    pub provider_id: String,
    /// `None` when the provider id is unknown
    pub config: Option<ProviderConfig>,
    pub settings: ProviderSettings,
}

impl Selection {
    pub fn resolve(
        config: &AppConfig,
        provider: Option<String>,
        model: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        let provider_id = provider.unwrap_or_else(|| config.ai.provider.clone());

        let Ok(kind) = provider_id.parse::<ProviderKind>() else {
            return Self {
                provider_id,
                config: None,
                settings: ProviderSettings::default(),
            };
        };

        let mut provider_config = ProviderConfig::new(kind, config.ai.api_key_for(kind), config.ai.model_for(kind));
        if let Some(api_key) = api_key {
            provider_config.api_key = api_key;
        }
        if let Some(model) = model {
            provider_config.model = model;
        }

        Self {
            provider_id,
            config: Some(provider_config),
            settings: config.ai.settings_for(kind),
        }
    }

    /// The adapter, or `None` when the provider is unavailable
    pub fn provider(&self) -> Option<Arc<dyn AiProvider>> {
        let config = self.config.as_ref()?;
        ProviderFactory::from_config(config, self.settings.clone())
    }

    pub fn require_provider(&self) -> Result<Arc<dyn AiProvider>> {
        self.provider()
            .ok_or_else(|| anyhow!("AI provider '{}' is not available", self.provider_id))
    }
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
