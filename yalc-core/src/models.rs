//! Model registry
//!
//! Static mapping from every supported model to the provider that serves it
//! and the invocation mode used to request structured output from that
//! provider. The mapping is an exhaustive `match`, so it is total by
//! construction; [`validate_registry`] re-checks the string side of it.

use crate::config::{ConfigError, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    /// Every provider, in declaration order
    pub const ALL: [Provider; 2] = [Provider::OpenAI, Provider::Anthropic];

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    /// Invocation mode used for structured output with this provider
    pub fn mode(&self) -> InvocationMode {
        match self {
            Provider::OpenAI => InvocationMode::ResponsesTools,
            Provider::Anthropic => InvocationMode::AnthropicTools,
        }
    }

    /// Environment variable holding the provider's API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-specific protocol variant used to obtain structured output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationMode {
    /// OpenAI Responses API with a single forced function tool
    ResponsesTools,
    /// Anthropic Messages API with a single forced tool
    AnthropicTools,
}

/// Supported LLM models
///
/// Each variant's canonical id is the string sent to the provider API and
/// the key looked up in the cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Model {
    #[serde(rename = "gpt-4o-mini")]
    Gpt4oMini,
    #[serde(rename = "gpt-5-mini")]
    Gpt5Mini,
    #[serde(rename = "claude-sonnet-4-5")]
    ClaudeSonnet45,
}

impl Model {
    /// Every declared model
    pub const ALL: [Model; 3] = [Model::Gpt4oMini, Model::Gpt5Mini, Model::ClaudeSonnet45];

    /// Canonical model id
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Gpt4oMini => "gpt-4o-mini",
            Model::Gpt5Mini => "gpt-5-mini",
            Model::ClaudeSonnet45 => "claude-sonnet-4-5",
        }
    }

    /// Provider serving this model
    pub fn provider(&self) -> Provider {
        match self {
            Model::Gpt4oMini | Model::Gpt5Mini => Provider::OpenAI,
            Model::ClaudeSonnet45 => Provider::Anthropic,
        }
    }

    /// Invocation mode for structured output
    pub fn mode(&self) -> InvocationMode {
        self.provider().mode()
    }

    /// Provider-qualified id, e.g. `openai/gpt-4o-mini`
    pub fn provider_string(&self) -> String {
        format!("{}/{}", self.provider(), self.as_str())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| ConfigError::Invalid {
                message: format!("unknown model '{}'", s),
            })
    }
}

/// Check that the registry is consistent.
///
/// Every model must carry a non-empty id that parses back to itself, ids
/// must be unique, and every model's provider must be a declared provider.
pub fn validate_registry() -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for (i, model) in Model::ALL.iter().enumerate() {
        let field = format!("models[{}]", i);
        let id = model.as_str();

        check_id(&field, *model, id)?;
        if !seen.insert(id) {
            return Err(ValidationError::duplicate(field, id).into());
        }
        if !Provider::ALL.contains(&model.provider()) {
            return Err(ValidationError::invalid_value(
                format!("{}.provider", field),
                "a declared provider",
                model.provider().as_str(),
            )
            .into());
        }
    }

    Ok(())
}

/// `id` must be non-empty and parse back to `model`
fn check_id(field: &str, model: Model, id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::required(field));
    }
    match id.parse::<Model>() {
        Ok(parsed) if parsed == model => Ok(()),
        _ => Err(ValidationError::invalid_value(
            field,
            "an id that round-trips",
            id,
        )),
    }
}
