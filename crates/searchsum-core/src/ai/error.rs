use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while talking to a vendor API
///
/// The `Display` output is the user-facing message surfaced in
/// `SummaryResult::Error` and `KeyTestResult::message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("{provider} API key is not configured.")]
    MissingApiKey { provider: &'static str },

    #[error("The request to {provider} timed out. Please try again.")]
    Timeout { provider: &'static str },

    #[error("Could not connect to {provider}. Please check your network connection.")]
    Connection { provider: &'static str },

    #[error("{provider} request failed: {message}")]
    Transport { provider: &'static str, message: String },

    #[error("Invalid {provider} API key. Please check your settings.")]
    InvalidApiKey { provider: &'static str, status: u16 },

    #[error("{provider} rate limit exceeded. Please wait a moment and try again.")]
    RateLimited { provider: &'static str },

    #[error("{provider} is temporarily unavailable. Please try again later.")]
    ServiceUnavailable { provider: &'static str, status: u16 },

    #[error("{provider} API error: {message}")]
    Vendor { provider: &'static str, status: u16, message: String },

    #[error("{provider} API error: HTTP {status}")]
    Http { provider: &'static str, status: u16 },

    #[error("Empty response from {provider}.")]
    EmptyResponse { provider: &'static str },

    #[error("Could not parse {provider} response.")]
    InvalidResponse { provider: &'static str },

    #[error("Could not parse AI response. Please try again.")]
    MalformedOutput,
}

/// Coarse category of an `ApiError`, exposed to hosts as diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Timeout,
    Connection,
    InvalidApiKey,
    RateLimited,
    ServiceUnavailable,
    Http,
    Decode,
    MalformedOutput,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::MissingApiKey { .. } => ErrorKind::Configuration,
            ApiError::Timeout { .. } => ErrorKind::Timeout,
            ApiError::Connection { .. } | ApiError::Transport { .. } => ErrorKind::Connection,
            ApiError::InvalidApiKey { .. } => ErrorKind::InvalidApiKey,
            ApiError::RateLimited { .. } => ErrorKind::RateLimited,
            ApiError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            ApiError::Vendor { .. } | ApiError::Http { .. } => ErrorKind::Http,
            ApiError::EmptyResponse { .. } | ApiError::InvalidResponse { .. } => ErrorKind::Decode,
            ApiError::MalformedOutput => ErrorKind::MalformedOutput,
        }
    }

    /// HTTP status that produced this error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::InvalidApiKey { status, .. }
            | ApiError::ServiceUnavailable { status, .. }
            | ApiError::Vendor { status, .. }
            | ApiError::Http { status, .. } => Some(*status),
            ApiError::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}
