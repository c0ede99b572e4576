//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use crate::models::Provider;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Output cap for Anthropic requests when none is configured
pub const DEFAULT_ANTHROPIC_MAX_TOKENS: u32 = 4096;

/// Upper bound on `structured.max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Default LiteLLM cost map
pub const DEFAULT_PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// Root configuration structure for yalc
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct YalcConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Registered LLM providers
    #[serde(default)]
    pub providers: Vec<ProviderSettings>,

    /// Cost table and price cache settings
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Structured output settings
    #[serde(default)]
    pub structured: StructuredConfig,

    /// Global connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Settings for one provider
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderSettings {
    /// Which provider these settings register
    #[serde(rename = "type")]
    pub provider: Provider,

    /// API key; a missing key is reported when a call is made
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Base URL for the provider API
    pub base_url: String,

    /// Output token cap. OpenAI requests carry it only when set; Anthropic
    /// requires one and falls back to [`DEFAULT_ANTHROPIC_MAX_TOKENS`].
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// `anthropic-version` header value
    #[serde(default = "default_anthropic_version")]
    pub api_version: String,

    /// Whether this provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ProviderSettings {
    /// Settings with the provider's public endpoint
    pub fn new(provider: Provider) -> Self {
        let base_url = match provider {
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        };
        Self {
            provider,
            api_key: None,
            base_url: base_url.to_string(),
            max_tokens: None,
            api_version: default_anthropic_version(),
            enabled: true,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<SecretString>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL (mock servers, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the output token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Partially redacted key for logs, `[NONE]` when no key is set
    pub fn key_hint(&self) -> String {
        self.api_key
            .as_ref()
            .map_or_else(|| "[NONE]".to_string(), SecretString::partial_redact)
    }
}

/// Cost table and price cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// URL or local path of the cost table
    #[serde(default = "default_pricing_source")]
    pub source: String,

    /// How long a fetched price stays valid
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached model prices
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            source: default_pricing_source(),
            cache_ttl_secs: default_cache_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl PricingConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Structured output configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredConfig {
    /// Re-asks allowed after a response fails schema validation
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum idle connections per host
    #[serde(default = "default_max_idle")]
    pub max_idle_per_host: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            max_idle_per_host: default_max_idle(),
        }
    }
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_anthropic_version() -> String { "2023-06-01".to_string() }
fn default_pricing_source() -> String { DEFAULT_PRICING_URL.to_string() }
fn default_cache_ttl() -> u64 { 300 }
fn default_max_entries() -> usize { 100 }
fn default_max_retries() -> u32 { 3 }
fn default_connect_timeout() -> u64 { 10 }
fn default_request_timeout() -> u64 { 60 }
fn default_max_idle() -> usize { 10 }

impl YalcConfig {
    /// Configuration with every built-in provider registered and no keys
    pub fn with_default_providers() -> Self {
        Self {
            version: "0.1".to_string(),
            providers: Provider::ALL.iter().map(|p| ProviderSettings::new(*p)).collect(),
            pricing: PricingConfig::default(),
            structured: StructuredConfig::default(),
            connection: ConnectionConfig::default(),
        }
    }

    /// Enabled settings for a provider, if registered
    pub fn provider(&self, provider: Provider) -> Option<&ProviderSettings> {
        self.providers
            .iter()
            .find(|settings| settings.provider == provider && settings.enabled)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        // Currently support only version 0.1
        if self.version != "0.1" {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: "0.1".to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        let mut seen = HashSet::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if !seen.insert(provider.provider) {
                return Err(ValidationError::duplicate(
                    format!("providers[{}].type", i),
                    provider.provider.as_str(),
                ));
            }
            provider.validate(&format!("providers[{}]", i))?;
        }

        self.pricing.validate("pricing")?;
        self.structured.validate("structured")?;
        self.connection.validate("connection")?;

        Ok(())
    }
}

impl ProviderSettings {
    /// Validate provider settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        validate_http_url(&format!("{}.base_url", path), &self.base_url)?;

        if let Some(key) = &self.api_key {
            if key.is_empty() {
                return Err(ValidationError::required(format!("{}.api_key", path))
                    .with_context("omit the key instead of leaving it empty"));
            }
        }

        if self.max_tokens == Some(0) {
            return Err(ValidationError::out_of_range(
                format!("{}.max_tokens", path),
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl PricingConfig {
    /// Validate pricing settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.source.is_empty() {
            return Err(ValidationError::required(format!("{}.source", path)));
        }
        if self.source.starts_with("http://") || self.source.starts_with("https://") {
            validate_http_url(&format!("{}.source", path), &self.source)?;
        }
        if self.cache_ttl_secs == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.cache_ttl_secs", path),
                "Must be greater than 0",
            ));
        }
        if self.max_entries == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_entries", path),
                "Must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl StructuredConfig {
    /// Validate structured output settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(ValidationError::out_of_range(
                format!("{}.max_retries", path),
                format!("Must be at most {}", MAX_RETRIES_LIMIT),
            ));
        }
        Ok(())
    }
}

impl ConnectionConfig {
    /// Validate connection settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.connect_timeout_secs", path),
                "Must be greater than 0",
            ));
        }
        if self.request_timeout_secs < self.connect_timeout_secs {
            return Err(ValidationError::out_of_range(
                format!("{}.request_timeout_secs", path),
                "Must be >= connect_timeout_secs",
            ));
        }
        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    // Proper URL validation using url crate
    match url::Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(ValidationError::invalid_url(
            field,
            format!("URL scheme must be http or https, got: {}", url.scheme()),
        )),
        Err(e) => Err(ValidationError::invalid_url(field, e.to_string())),
    }
}
