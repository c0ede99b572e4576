//! Client error types and handling

use crate::models::{Model, Provider};
use crate::pricing::PricingError;
use std::time::Duration;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by `structured_response` and the client factory
#[derive(Debug, Error)]
pub enum ClientError {
    /// No provider client is registered for the model's provider
    #[error("Unsupported provider: {provider} (model {model})")]
    UnsupportedProvider { provider: Provider, model: Model },

    /// A backend was paired with a model served by another provider
    #[error("Model {model} is served by {expected}, not {actual}")]
    ProviderMismatch {
        model: Model,
        expected: Provider,
        actual: Provider,
    },

    /// Provider response carried no usage block, so cost cannot be computed
    #[error("No usage reported by {provider} for this call")]
    MissingUsage { provider: Provider },

    /// The response never matched the schema within the retry budget
    #[error("Response failed schema validation after {attempts} attempt(s): {message}")]
    Validation { attempts: u64, message: String },

    /// Cost lookup failed
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// A metadata strategy failed after the call completed
    #[error("Metadata strategy '{strategy}' failed: {source}")]
    Strategy {
        strategy: String,
        #[source]
        source: anyhow::Error,
    },

    /// Authentication failed or no API key configured
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit { retry_after: Option<Duration> },

    /// Invalid request that should not be retried (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Model not available at the provider
    #[error("Model not found: {0}")]
    ModelNotAvailable(String),

    /// Server error (5xx)
    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    /// Timeout occurred
    #[error("Request timed out")]
    Timeout,

    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Response parsing error
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ClientError {
    fn from(err: crate::config::ConfigError) -> Self {
        ClientError::Configuration(err.to_string())
    }
}
