//! Error types for mail-triage.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Memory-store errors.
///
/// Read failures are absorbed inside the store (unreadable file → empty
/// history); only write failures surface, and the driver treats those as
/// non-fatal too.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("Failed to write memory file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to serialize memory file: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Pipeline-related errors.
///
/// Only malformed input is fatal to a single email; every LLM-backed step
/// recovers through its fallback value instead of raising.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Invalid email: missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Invalid email input: {0}")]
    InvalidInput(String),
}
