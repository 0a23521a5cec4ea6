use anyhow::{bail, Result};

use super::{print_json, Selection};

pub async fn run(selection: &Selection) -> Result<()> {
    let provider = selection.require_provider()?;
    let result = provider.test_api_key().await;

    print_json(&result)?;

    if !result.success {
        bail!("API key test failed: {}", result.message);
    }
    Ok(())
}
