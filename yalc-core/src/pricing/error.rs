//! Pricing error types

use thiserror::Error;

/// Result type for pricing operations
pub type PricingResult<T> = Result<T, PricingError>;

/// Errors raised while resolving token prices
#[derive(Debug, Error)]
pub enum PricingError {
    /// The cost table has no entry for the model
    #[error("Model {model} not found in pricing data")]
    NotFound { model: String },

    /// The entry exists but a rate is negative or not a number
    #[error("Invalid {field} for model {model}: {value}")]
    InvalidRate {
        model: String,
        field: &'static str,
        value: String,
    },

    /// The cost table could not be downloaded
    #[error("Failed to fetch pricing data from {location}: {message}")]
    Fetch { location: String, message: String },

    /// The cost table is not a JSON object
    #[error("Failed to parse pricing data: {0}")]
    Parse(String),

    /// The local cost table could not be read
    #[error("IO error reading pricing data from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::Parse(err.to_string())
    }
}
