use std::io::Read;

use anyhow::{bail, Context, Result};

use searchsum_core::ai::{PostContext, SummaryResult};

use super::{print_json, Selection};

const PROVIDER_UNAVAILABLE: &str = "The selected AI provider is not available.";

pub async fn run(selection: &Selection, query: &str, posts_path: &str) -> Result<()> {
    let posts = read_posts(posts_path)?;

    let result = match selection.provider() {
        Some(provider) => provider.generate_summary(query, &posts).await,
        None => SummaryResult::Error {
            error: PROVIDER_UNAVAILABLE.to_string(),
        },
    };

    print_json(&result)?;

    if let Some(error) = result.error_message() {
        bail!("Summary generation failed: {error}");
    }
    Ok(())
}

fn read_posts(path: &str) -> Result<Vec<PostContext>> {
    let raw = if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read posts from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read posts from {path}"))?
    };

    serde_json::from_str(&raw).context("Posts must be a JSON array of {id, title, url, type, content, date?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchsum_core::AppConfig;

    #[tokio::test]
    async fn test_unavailable_provider_is_an_error() {
        let path = std::env::temp_dir().join(format!("searchsum-posts-{}.json", std::process::id()));
        std::fs::write(&path, "[]").unwrap();

        let selection = Selection::resolve(&AppConfig::default(), Some("mistral".to_string()), None, None);
        let err = run(&selection, "q", path.to_str().unwrap()).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Summary generation failed: {PROVIDER_UNAVAILABLE}"));

        let _ = std::fs::remove_file(&path);
    }
}
