pub mod ai;
pub mod config;
pub mod error;

pub use ai::{AiProvider, PostContext, ProviderFactory, ProviderKind, SummaryResult};
pub use config::{AiConfig, AppConfig};
pub use error::{Error, Result};
