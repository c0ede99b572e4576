//! OpenAI Responses API types
//!
//! Only the fields needed for a forced function call and usage accounting
//! are modeled; unknown fields and output item kinds are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `POST /responses` request
#[derive(Debug, Serialize)]
pub struct ResponsesRequest<'a> {
    pub model: &'a str,
    pub input: Vec<ResponsesInputMessage<'a>>,
    pub tools: Vec<ResponsesTool<'a>>,
    pub tool_choice: ResponsesToolChoice<'a>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// One input turn
#[derive(Debug, Serialize)]
pub struct ResponsesInputMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Function tool definition
#[derive(Debug, Serialize)]
pub struct ResponsesTool<'a> {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub name: &'a str,
    pub description: &'a str,
    pub parameters: &'a Value,
}

/// Forces a call to the named function
#[derive(Debug, Serialize)]
pub struct ResponsesToolChoice<'a> {
    #[serde(rename = "type")]
    pub choice_type: &'static str,
    pub name: &'a str,
}

/// `POST /responses` response
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    pub id: String,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub output: Vec<ResponsesOutputItem>,

    /// Absent on some responses; such a call cannot be priced
    #[serde(default)]
    pub usage: Option<ResponsesUsage>,
}

impl ResponsesResponse {
    /// Parsed arguments of the first call to `name`
    pub fn function_arguments(&self, name: &str) -> Option<Value> {
        self.output.iter().find_map(|item| match item {
            ResponsesOutputItem::FunctionCall {
                name: called,
                arguments,
                ..
            } if called == name => Some(
                serde_json::from_str(arguments)
                    .unwrap_or_else(|_| Value::String(arguments.clone())),
            ),
            _ => None,
        })
    }
}

/// Output item; only function calls are interpreted
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ResponsesOutputItem {
    #[serde(rename = "function_call")]
    FunctionCall {
        name: String,
        /// JSON-encoded arguments
        arguments: String,
        #[serde(default)]
        call_id: Option<String>,
    },

    #[serde(other)]
    Other,
}

/// Token usage
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ResponsesUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,

    #[serde(default)]
    pub total_tokens: Option<u64>,
}
