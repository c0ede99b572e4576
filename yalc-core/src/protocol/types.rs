//! Core protocol types for structured LLM calls
//!
//! Messages sent to a provider, the usage and cost derived from its
//! response, and the immutable [`ClientCall`] record handed to metadata
//! strategies.

use crate::models::Model;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use uuid::Uuid;

/// Role of a participant in an LLM conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
    System,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMessage {
    pub role: Role,
    pub content: String,
}

impl InputMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A single sent message, with its role and text content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMessage {
    message: String,
    role: Role,
}

impl ContextMessage {
    pub fn new(message: impl Into<String>, role: Role) -> Self {
        Self {
            message: message.into(),
            role,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

impl From<&InputMessage> for ContextMessage {
    fn from(input: &InputMessage) -> Self {
        Self::new(input.content.clone(), input.role)
    }
}

/// Convert the messages of a request into context records
pub fn to_context_messages(messages: &[InputMessage]) -> Vec<ContextMessage> {
    messages.iter().map(ContextMessage::from).collect()
}

/// Raw token counts reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }
}

impl Add for TokenUsage {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens.saturating_add(other.input_tokens),
            output_tokens: self.output_tokens.saturating_add(other.output_tokens),
        }
    }
}

/// Usage of several round trips billed as one call
impl Sum for TokenUsage {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Per-token prices for one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenPricing {
    pub input_cost_per_token: f64,
    pub output_cost_per_token: f64,
}

/// Token usage and cost statistics for a single LLM call
///
/// Only produced by pricing a [`TokenUsage`]; costs cannot be set directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseStats {
    pub(crate) input_tokens: u64,
    pub(crate) output_tokens: u64,
    pub(crate) input_tokens_cost: f64,
    pub(crate) output_tokens_cost: f64,
}

impl ResponseStats {
    /// Cost is always tokens times the per-token rate
    pub(crate) fn priced(usage: TokenUsage, pricing: TokenPricing) -> Self {
        Self {
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            input_tokens_cost: usage.input_tokens as f64 * pricing.input_cost_per_token,
            output_tokens_cost: usage.output_tokens as f64 * pricing.output_cost_per_token,
        }
    }

    pub fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    pub fn input_tokens_cost(&self) -> f64 {
        self.input_tokens_cost
    }

    pub fn output_tokens_cost(&self) -> f64 {
        self.output_tokens_cost
    }

    pub fn total_cost(&self) -> f64 {
        self.input_tokens_cost + self.output_tokens_cost
    }
}

/// The parsed response message returned by an LLM, together with its role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    response: Value,
    role: Role,
}

impl ClientMessage {
    /// Assistant message carrying the parsed value
    pub fn assistant(response: Value) -> Self {
        Self {
            response,
            role: Role::Assistant,
        }
    }

    /// The parsed value, as JSON
    pub fn response(&self) -> &Value {
        &self.response
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Full record of a single LLM call: input messages, parsed response, and
/// token/cost stats
///
/// Records are built by the client after pricing. `Deserialize` exists to
/// read back records a strategy persisted, not to author new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCall {
    id: Uuid,
    input_tokens: u64,
    output_tokens: u64,
    input_tokens_cost: f64,
    output_tokens_cost: f64,
    context_messages: Vec<ContextMessage>,
    client_message: ClientMessage,
    model_name: Model,
}

impl ClientCall {
    pub(crate) fn new(
        stats: ResponseStats,
        context_messages: Vec<ContextMessage>,
        client_message: ClientMessage,
        model_name: Model,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            input_tokens: stats.input_tokens,
            output_tokens: stats.output_tokens,
            input_tokens_cost: stats.input_tokens_cost,
            output_tokens_cost: stats.output_tokens_cost,
            context_messages,
            client_message,
            model_name,
        }
    }

    /// Unique id of this call, for correlation in logs and stores
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    pub fn input_tokens_cost(&self) -> f64 {
        self.input_tokens_cost
    }

    pub fn output_tokens_cost(&self) -> f64 {
        self.output_tokens_cost
    }

    pub fn total_cost(&self) -> f64 {
        self.input_tokens_cost + self.output_tokens_cost
    }

    pub fn stats(&self) -> ResponseStats {
        ResponseStats {
            input_tokens: self.input_tokens,
            output_tokens: self.output_tokens,
            input_tokens_cost: self.input_tokens_cost,
            output_tokens_cost: self.output_tokens_cost,
        }
    }

    pub fn context_messages(&self) -> &[ContextMessage] {
        &self.context_messages
    }

    pub fn client_message(&self) -> &ClientMessage {
        &self.client_message
    }

    pub fn model_name(&self) -> Model {
        self.model_name
    }
}
