use anyhow::Result;

use super::{print_json, Selection};

pub async fn run(selection: &Selection, live: bool) -> Result<()> {
    let provider = selection.require_provider()?;

    let models = if live {
        provider.fetch_models_from_api().await
    } else {
        provider.available_models()
    };

    if models.is_empty() {
        tracing::warn!(provider = provider.kind().id(), "No models returned");
    }

    print_json(&serde_json::json!({
        "provider": provider.kind().id(),
        "default_model": provider.default_model(),
        "models": models,
    }))
}
