//! Anthropic Messages API types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /messages` request
#[derive(Debug, Serialize)]
pub struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,

    /// System turns, lifted out of `messages`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub messages: Vec<AnthropicMessage<'a>>,
    pub tools: Vec<AnthropicTool<'a>>,
    pub tool_choice: AnthropicToolChoice<'a>,
}

/// One conversation turn; only `user` and `assistant` are accepted
#[derive(Debug, Serialize)]
pub struct AnthropicMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Tool definition
#[derive(Debug, Serialize)]
pub struct AnthropicTool<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub input_schema: &'a Value,
}

/// Forces use of the named tool
#[derive(Debug, Serialize)]
pub struct AnthropicToolChoice<'a> {
    #[serde(rename = "type")]
    pub choice_type: &'static str,
    pub name: &'a str,
}

/// `POST /messages` response
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesResponse {
    pub id: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub content: Vec<ContentBlock>,

    #[serde(default)]
    pub stop_reason: Option<String>,

    #[serde(default)]
    pub usage: Option<AnthropicUsage>,
}

impl MessagesResponse {
    /// Input of the first `tool_use` block for `name`
    pub fn tool_input(&self, name: &str) -> Option<Value> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::ToolUse {
                name: used, input, ..
            } if used == name => Some(input.clone()),
            _ => None,
        })
    }
}

/// Content block; text and tool use are modeled, the rest ignored
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        name: String,
        input: Value,
    },

    #[serde(other)]
    Other,
}

/// Token usage
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnthropicUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
