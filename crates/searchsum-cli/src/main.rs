use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use searchsum_core::AppConfig;

mod commands;

use commands::Selection;

#[derive(Parser)]
#[command(name = "searchsum")]
#[command(author, version, about = "AI-generated summaries for site search results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Provider id (openai, claude, gemini), overrides the config file
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model id, overrides the config file
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API key, overrides the config file and environment
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Path to the config file (default: ~/.config/searchsum/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported providers
    Providers,
    /// List models for the selected provider
    Models {
        /// Query the vendor's live catalog
        #[arg(long)]
        live: bool,
    },
    /// Check that the API key is accepted
    TestKey,
    /// Summarize posts for a search query
    Summarize {
        /// Search query
        #[arg(short, long)]
        query: String,
        /// JSON array of posts, or "-" for stdin
        #[arg(long, default_value = "-")]
        posts: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging; stdout is reserved for JSON output
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let selection = Selection::resolve(&config, cli.provider, cli.model, cli.api_key);

    match cli.command {
        Commands::Providers => commands::providers::run(),
        Commands::Models { live } => commands::models::run(&selection, live).await,
        Commands::TestKey => commands::test_key::run(&selection).await,
        Commands::Summarize { query, posts } => commands::summarize::run(&selection, &query, &posts).await,
    }
}
