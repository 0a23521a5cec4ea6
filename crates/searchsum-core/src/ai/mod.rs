pub mod capabilities;
pub mod error;
mod factory;
pub mod http;
pub mod output;
pub mod prompt;
pub mod providers;
mod types;

pub use error::{ApiError, ErrorKind};
pub use factory::ProviderFactory;
pub use providers::{AiProvider, ClaudeProvider, GeminiProvider, OpenAiProvider, ProviderSettings};
pub use types::{
    KeyTestResult, PostContext, PostType, ProviderConfig, ProviderKind, SearchHit, SummaryAnswer, SummaryRequest,
    SummaryResult, MAX_RESULTS,
};
